use std::io;

use crate::pdu::data::bind_data::MAX_LENGTH_SYSTEM_ID;
use crate::pdu::formats::{
    COctetString, Integer1, Integer2, OctetString, WriteStream,
};
use crate::pdu::pduparseerror::fld;
use crate::pdu::PduParseError;

// https://smpp.org/SMPP_v3_4_Issue1_2.pdf section 5.3.2.25
const TAG_SC_INTERFACE_VERSION: u16 = 0x0210;

/// The body shared by bind_receiver_resp, bind_transmitter_resp and
/// bind_transceiver_resp: a system_id followed by optional TLVs, of which
/// we understand only sc_interface_version.  Unknown TLVs are skipped.
#[derive(Debug, PartialEq)]
pub struct BindRespData {
    system_id: COctetString,
    sc_interface_version: Option<Integer1>,
}

impl BindRespData {
    pub fn new(system_id: &str) -> Self {
        Self {
            system_id: COctetString::from_str(
                system_id,
                MAX_LENGTH_SYSTEM_ID,
            ),
            sc_interface_version: None,
        }
    }

    pub fn new_with_interface_version(
        system_id: &str,
        sc_interface_version: u8,
    ) -> Self {
        Self {
            system_id: COctetString::from_str(
                system_id,
                MAX_LENGTH_SYSTEM_ID,
            ),
            sc_interface_version: Some(Integer1::new(sc_interface_version)),
        }
    }

    pub fn parse(bytes: &mut dyn io::BufRead) -> Result<Self, PduParseError> {
        let system_id = fld(
            "system_id",
            COctetString::read(bytes, MAX_LENGTH_SYSTEM_ID),
        )?;

        let mut sc_interface_version = None;
        loop {
            // A truncated TLV stream is tolerated: stop at end of body
            let tag = match Integer2::read(bytes) {
                Ok(tag) => tag,
                Err(_) => break,
            };
            let length = match Integer2::read(bytes) {
                Ok(length) => length,
                Err(_) => break,
            };
            let value = fld(
                "optional_parameter",
                OctetString::read(bytes, length.value as usize),
            )?;
            if tag.value == TAG_SC_INTERFACE_VERSION && length.value >= 1 {
                sc_interface_version =
                    Some(Integer1::new(value.as_bytes()[0]));
            }
        }

        Ok(Self {
            system_id,
            sc_interface_version,
        })
    }

    pub async fn write(&self, stream: &mut WriteStream) -> io::Result<()> {
        self.system_id.write(stream).await?;
        if let Some(version) = &self.sc_interface_version {
            Integer2::new(TAG_SC_INTERFACE_VERSION).write(stream).await?;
            Integer2::new(1).write(stream).await?;
            version.write(stream).await?;
        }
        Ok(())
    }

    pub fn system_id(&self) -> &str {
        self.system_id.as_str()
    }

    pub fn sc_interface_version(&self) -> Option<u8> {
        self.sc_interface_version.as_ref().map(|v| v.value)
    }
}
