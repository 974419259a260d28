use std::io;

use crate::pdu::formats::{COctetString, WriteStream};
use crate::pdu::pduparseerror::fld;
use crate::pdu::PduParseError;

pub const DELIVER_SM_RESP: u32 = 0x80000005;

const MAX_LENGTH_MESSAGE_ID: usize = 65;

#[derive(Debug, PartialEq)]
pub struct DeliverSmRespPdu {
    message_id: COctetString,
}

impl DeliverSmRespPdu {
    pub fn new() -> Self {
        Self {
            message_id: COctetString::new(),
        }
    }

    pub fn message_id(&self) -> &str {
        self.message_id.as_str()
    }

    pub async fn write(&self, stream: &mut WriteStream) -> io::Result<()> {
        self.message_id.write(stream).await
    }

    /// The message_id field is unused for deliver_sm_resp and some peers
    /// omit it entirely, so an empty body is accepted.
    pub fn parse(
        bytes: &mut dyn io::BufRead,
        _command_status: u32,
    ) -> Result<DeliverSmRespPdu, PduParseError> {
        if bytes.fill_buf()?.is_empty() {
            return Ok(Self::new());
        }
        let message_id = fld(
            "message_id",
            COctetString::read(bytes, MAX_LENGTH_MESSAGE_ID),
        )?;
        Ok(Self { message_id })
    }
}
