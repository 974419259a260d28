use std::io;

use crate::pdu::data::bind_data::BindData;
use crate::pdu::formats::WriteStream;
use crate::pdu::{PduParseError, PduParseErrorBody};

pub const BIND_TRANSCEIVER: u32 = 0x00000009;

#[derive(Debug, PartialEq)]
pub struct BindTransceiverPdu(BindData);

impl BindTransceiverPdu {
    pub fn new(
        system_id: &str,
        password: &str,
        system_type: &str,
        interface_version: u8,
        addr_ton: u8,
        addr_npi: u8,
        address_range: &str,
    ) -> Self {
        Self(BindData::new(
            system_id,
            password,
            system_type,
            interface_version,
            addr_ton,
            addr_npi,
            address_range,
        ))
    }

    pub fn bind_data(&self) -> &BindData {
        &self.0
    }

    pub async fn write(&self, stream: &mut WriteStream) -> io::Result<()> {
        self.0.write(stream).await
    }

    pub fn parse(
        bytes: &mut dyn io::BufRead,
        command_status: u32,
    ) -> Result<BindTransceiverPdu, PduParseError> {
        if command_status != 0 {
            return Err(PduParseError::new(
                PduParseErrorBody::StatusIsNotZero(command_status),
            )
            .into_with_field_name("command_status"));
        }
        Ok(Self(BindData::parse(bytes)?))
    }
}
