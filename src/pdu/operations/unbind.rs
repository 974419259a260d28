use std::io;

use crate::pdu::formats::WriteStream;
use crate::pdu::PduParseError;

pub const UNBIND: u32 = 0x00000006;

#[derive(Debug, PartialEq)]
pub struct UnbindPdu {}

impl UnbindPdu {
    pub fn new() -> Self {
        Self {}
    }

    pub async fn write(&self, _stream: &mut WriteStream) -> io::Result<()> {
        Ok(())
    }

    pub fn parse(
        _bytes: &mut dyn io::BufRead,
        _command_status: u32,
    ) -> Result<UnbindPdu, PduParseError> {
        Ok(Self {})
    }
}
