use std::io;

use crate::pdu::formats::WriteStream;
use crate::pdu::PduParseError;

pub const ENQUIRE_LINK_RESP: u32 = 0x80000015;

#[derive(Debug, PartialEq)]
pub struct EnquireLinkRespPdu {}

impl EnquireLinkRespPdu {
    pub fn new() -> Self {
        Self {}
    }

    pub async fn write(&self, _stream: &mut WriteStream) -> io::Result<()> {
        Ok(())
    }

    pub fn parse(
        _bytes: &mut dyn io::BufRead,
        _command_status: u32,
    ) -> Result<EnquireLinkRespPdu, PduParseError> {
        Ok(Self {})
    }
}
