use std::io;

use crate::pdu::data::bind_resp_data::BindRespData;
use crate::pdu::formats::WriteStream;
use crate::pdu::PduParseError;

pub const BIND_TRANSMITTER_RESP: u32 = 0x80000002;

#[derive(Debug, PartialEq)]
pub struct BindTransmitterRespPdu(BindRespData);

impl BindTransmitterRespPdu {
    pub fn new(system_id: &str) -> Self {
        Self(BindRespData::new(system_id))
    }

    pub fn bind_resp_data(&self) -> &BindRespData {
        &self.0
    }

    pub async fn write(&self, stream: &mut WriteStream) -> io::Result<()> {
        self.0.write(stream).await
    }

    pub fn parse(
        bytes: &mut dyn io::BufRead,
        _command_status: u32,
    ) -> Result<BindTransmitterRespPdu, PduParseError> {
        Ok(Self(BindRespData::parse(bytes)?))
    }
}
