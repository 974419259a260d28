use std::io;

use crate::pdu::formats::{COctetString, WriteStream};
use crate::pdu::pduparseerror::fld;
use crate::pdu::PduParseError;

pub const SUBMIT_SM_RESP: u32 = 0x80000004;

// https://smpp.org/SMPP_v3_4_Issue1_2.pdf
// 4.4.2 lists both 9 and 33 crossed out, before listing 65 as the
// max size of the message_id.
const MAX_LENGTH_MESSAGE_ID: usize = 65;

#[derive(Debug, PartialEq)]
pub struct SubmitSmRespPdu {
    message_id: COctetString,
}

impl SubmitSmRespPdu {
    pub fn new(message_id: &str) -> Self {
        Self {
            message_id: COctetString::from_str(
                message_id,
                MAX_LENGTH_MESSAGE_ID,
            ),
        }
    }

    pub fn new_error() -> Self {
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

    /// An error response may legally arrive with no body at all, in which
    /// case the message_id is empty.
    pub fn parse(
        bytes: &mut dyn io::BufRead,
        _command_status: u32,
    ) -> Result<SubmitSmRespPdu, PduParseError> {
        if bytes.fill_buf()?.is_empty() {
            return Ok(Self::new_error());
        }
        let message_id = fld(
            "message_id",
            COctetString::read(bytes, MAX_LENGTH_MESSAGE_ID),
        )?;
        Ok(Self { message_id })
    }
}
