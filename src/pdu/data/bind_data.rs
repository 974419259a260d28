use std::io;

use crate::pdu::formats::{COctetString, Integer1, WriteStream};
use crate::pdu::pduparseerror::fld;
use crate::pdu::PduParseError;

pub const MAX_LENGTH_SYSTEM_ID: usize = 16;
const MAX_LENGTH_PASSWORD: usize = 9;
const MAX_LENGTH_SYSTEM_TYPE: usize = 13;
const MAX_LENGTH_ADDRESS_RANGE: usize = 41;

/// The body shared by bind_receiver, bind_transmitter and
/// bind_transceiver.  https://smpp.org/SMPP_v3_4_Issue1_2.pdf section 4.1
#[derive(Debug, PartialEq)]
pub struct BindData {
    system_id: COctetString,
    password: COctetString,
    system_type: COctetString,
    interface_version: Integer1,
    addr_ton: Integer1,
    addr_npi: Integer1,
    address_range: COctetString,
}

impl BindData {
    pub fn new(
        system_id: &str,
        password: &str,
        system_type: &str,
        interface_version: u8,
        addr_ton: u8,
        addr_npi: u8,
        address_range: &str,
    ) -> Self {
        Self {
            system_id: COctetString::from_str(
                system_id,
                MAX_LENGTH_SYSTEM_ID,
            ),
            password: COctetString::from_str(password, MAX_LENGTH_PASSWORD),
            system_type: COctetString::from_str(
                system_type,
                MAX_LENGTH_SYSTEM_TYPE,
            ),
            interface_version: Integer1::new(interface_version),
            addr_ton: Integer1::new(addr_ton),
            addr_npi: Integer1::new(addr_npi),
            address_range: COctetString::from_str(
                address_range,
                MAX_LENGTH_ADDRESS_RANGE,
            ),
        }
    }

    pub fn parse(bytes: &mut dyn io::BufRead) -> Result<Self, PduParseError> {
        let system_id = fld(
            "system_id",
            COctetString::read(bytes, MAX_LENGTH_SYSTEM_ID),
        )?;
        let password =
            fld("password", COctetString::read(bytes, MAX_LENGTH_PASSWORD))?;
        let system_type = fld(
            "system_type",
            COctetString::read(bytes, MAX_LENGTH_SYSTEM_TYPE),
        )?;
        let interface_version =
            fld("interface_version", Integer1::read(bytes))?;
        let addr_ton = fld("addr_ton", Integer1::read(bytes))?;
        let addr_npi = fld("addr_npi", Integer1::read(bytes))?;
        let address_range = fld(
            "address_range",
            COctetString::read(bytes, MAX_LENGTH_ADDRESS_RANGE),
        )?;

        Ok(Self {
            system_id,
            password,
            system_type,
            interface_version,
            addr_ton,
            addr_npi,
            address_range,
        })
    }

    pub async fn write(&self, stream: &mut WriteStream) -> io::Result<()> {
        self.system_id.write(stream).await?;
        self.password.write(stream).await?;
        self.system_type.write(stream).await?;
        self.interface_version.write(stream).await?;
        self.addr_ton.write(stream).await?;
        self.addr_npi.write(stream).await?;
        self.address_range.write(stream).await
    }

    pub fn system_id(&self) -> &str {
        self.system_id.as_str()
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    pub fn system_type(&self) -> &str {
        self.system_type.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_bind_data() {
        let mut cursor =
            Cursor::new(&b"esmeid\0password\0type\0\x34\x01\x02rng\0"[..]);
        let data = BindData::parse(&mut cursor).unwrap();
        assert_eq!(
            data,
            BindData::new("esmeid", "password", "type", 0x34, 0x01, 0x02, "rng")
        );
        assert_eq!(data.system_id(), "esmeid");
        assert_eq!(data.password(), "password");
    }

    #[tokio::test]
    async fn write_bind_data() {
        let mut buf: Vec<u8> = Vec::new();
        BindData::new("esmeid", "password", "type", 0x34, 0x00, 0x00, "")
            .write(&mut buf)
            .await
            .unwrap();
        assert_eq!(&buf, b"esmeid\0password\0type\0\x34\x00\x00\0");
    }

    #[test]
    fn parse_bind_data_with_missing_fields() {
        let mut cursor = Cursor::new(&b"esmeid\0pass"[..]);
        let res = BindData::parse(&mut cursor).unwrap_err();
        assert_eq!(res.field_name.as_deref(), Some("password"));
    }
}
