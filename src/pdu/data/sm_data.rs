use std::io;

use crate::pdu::formats::{
    COctetString, Integer1, OctetString, WriteStream,
};
use crate::pdu::pduparseerror::fld;
use crate::pdu::PduParseError;

const MAX_LENGTH_SERVICE_TYPE: usize = 6;
const MAX_LENGTH_SOURCE_ADDR: usize = 21;
const MAX_LENGTH_DESTINATION_ADDR: usize = 21;
const MAX_LENGTH_SCHEDULE_DELIVERY_TIME: usize = 17;
const MAX_LENGTH_VALIDITY_PERIOD: usize = 17;

// SMPP allows 254 octets in short_message.  sm_length is a u8 so a peer
// could claim 255; we accept that on the read side as long as the bytes
// are actually present, and enforce 254 on PDUs we build ourselves.
pub const MAX_LENGTH_SHORT_MESSAGE: usize = 254;

/// The body shared by submit_sm and deliver_sm.
/// https://smpp.org/SMPP_v3_4_Issue1_2.pdf sections 4.4.1 and 4.6.1
#[derive(Debug, PartialEq)]
pub struct SmData {
    service_type: COctetString,
    source_addr_ton: Integer1,
    source_addr_npi: Integer1,
    source_addr: COctetString,
    dest_addr_ton: Integer1,
    dest_addr_npi: Integer1,
    destination_addr: COctetString,
    esm_class: Integer1,
    protocol_id: Integer1,
    priority_flag: Integer1,
    schedule_delivery_time: COctetString,
    validity_period: COctetString,
    registered_delivery: Integer1,
    replace_if_present_flag: Integer1,
    data_coding: Integer1,
    sm_default_msg_id: Integer1,
    short_message: OctetString,
}

impl SmData {
    pub fn new(
        service_type: &str,
        source_addr_ton: u8,
        source_addr_npi: u8,
        source_addr: &str,
        dest_addr_ton: u8,
        dest_addr_npi: u8,
        destination_addr: &str,
        esm_class: u8,
        protocol_id: u8,
        priority_flag: u8,
        schedule_delivery_time: &str,
        validity_period: &str,
        registered_delivery: u8,
        replace_if_present_flag: u8,
        data_coding: u8,
        sm_default_msg_id: u8,
        short_message: &[u8],
    ) -> Result<Self, PduParseError> {
        Ok(Self {
            service_type: COctetString::from_str(
                service_type,
                MAX_LENGTH_SERVICE_TYPE,
            ),
            source_addr_ton: Integer1::new(source_addr_ton),
            source_addr_npi: Integer1::new(source_addr_npi),
            source_addr: COctetString::from_str(
                source_addr,
                MAX_LENGTH_SOURCE_ADDR,
            ),
            dest_addr_ton: Integer1::new(dest_addr_ton),
            dest_addr_npi: Integer1::new(dest_addr_npi),
            destination_addr: COctetString::from_str(
                destination_addr,
                MAX_LENGTH_DESTINATION_ADDR,
            ),
            esm_class: Integer1::new(esm_class),
            protocol_id: Integer1::new(protocol_id),
            priority_flag: Integer1::new(priority_flag),
            schedule_delivery_time: COctetString::from_str(
                schedule_delivery_time,
                MAX_LENGTH_SCHEDULE_DELIVERY_TIME,
            ),
            validity_period: COctetString::from_str(
                validity_period,
                MAX_LENGTH_VALIDITY_PERIOD,
            ),
            registered_delivery: Integer1::new(registered_delivery),
            replace_if_present_flag: Integer1::new(replace_if_present_flag),
            data_coding: Integer1::new(data_coding),
            sm_default_msg_id: Integer1::new(sm_default_msg_id),
            short_message: fld(
                "short_message",
                OctetString::from_bytes(
                    short_message,
                    MAX_LENGTH_SHORT_MESSAGE,
                ),
            )?,
        })
    }

    pub fn parse(bytes: &mut dyn io::BufRead) -> Result<Self, PduParseError> {
        let service_type = fld(
            "service_type",
            COctetString::read(bytes, MAX_LENGTH_SERVICE_TYPE),
        )?;
        let source_addr_ton = fld("source_addr_ton", Integer1::read(bytes))?;
        let source_addr_npi = fld("source_addr_npi", Integer1::read(bytes))?;
        let source_addr = fld(
            "source_addr",
            COctetString::read(bytes, MAX_LENGTH_SOURCE_ADDR),
        )?;
        let dest_addr_ton = fld("dest_addr_ton", Integer1::read(bytes))?;
        let dest_addr_npi = fld("dest_addr_npi", Integer1::read(bytes))?;
        let destination_addr = fld(
            "destination_addr",
            COctetString::read(bytes, MAX_LENGTH_DESTINATION_ADDR),
        )?;
        let esm_class = fld("esm_class", Integer1::read(bytes))?;
        let protocol_id = fld("protocol_id", Integer1::read(bytes))?;
        let priority_flag = fld("priority_flag", Integer1::read(bytes))?;
        let schedule_delivery_time = fld(
            "schedule_delivery_time",
            COctetString::read(bytes, MAX_LENGTH_SCHEDULE_DELIVERY_TIME),
        )?;
        let validity_period = fld(
            "validity_period",
            COctetString::read(bytes, MAX_LENGTH_VALIDITY_PERIOD),
        )?;
        let registered_delivery =
            fld("registered_delivery", Integer1::read(bytes))?;
        let replace_if_present_flag =
            fld("replace_if_present_flag", Integer1::read(bytes))?;
        let data_coding = fld("data_coding", Integer1::read(bytes))?;
        let sm_default_msg_id =
            fld("sm_default_msg_id", Integer1::read(bytes))?;
        let sm_length = fld("sm_length", Integer1::read(bytes))?;
        let short_message = fld(
            "short_message",
            OctetString::read(bytes, sm_length.value as usize),
        )?;

        Ok(Self {
            service_type,
            source_addr_ton,
            source_addr_npi,
            source_addr,
            dest_addr_ton,
            dest_addr_npi,
            destination_addr,
            esm_class,
            protocol_id,
            priority_flag,
            schedule_delivery_time,
            validity_period,
            registered_delivery,
            replace_if_present_flag,
            data_coding,
            sm_default_msg_id,
            short_message,
        })
    }

    pub async fn write(&self, stream: &mut WriteStream) -> io::Result<()> {
        self.service_type.write(stream).await?;
        self.source_addr_ton.write(stream).await?;
        self.source_addr_npi.write(stream).await?;
        self.source_addr.write(stream).await?;
        self.dest_addr_ton.write(stream).await?;
        self.dest_addr_npi.write(stream).await?;
        self.destination_addr.write(stream).await?;
        self.esm_class.write(stream).await?;
        self.protocol_id.write(stream).await?;
        self.priority_flag.write(stream).await?;
        self.schedule_delivery_time.write(stream).await?;
        self.validity_period.write(stream).await?;
        self.registered_delivery.write(stream).await?;
        self.replace_if_present_flag.write(stream).await?;
        self.data_coding.write(stream).await?;
        self.sm_default_msg_id.write(stream).await?;
        Integer1::new(self.short_message.len() as u8)
            .write(stream)
            .await?;
        self.short_message.write(stream).await
    }

    pub fn source_addr(&self) -> &str {
        self.source_addr.as_str()
    }

    pub fn source_addr_ton(&self) -> u8 {
        self.source_addr_ton.value
    }

    pub fn source_addr_npi(&self) -> u8 {
        self.source_addr_npi.value
    }

    pub fn destination_addr(&self) -> &str {
        self.destination_addr.as_str()
    }

    pub fn dest_addr_ton(&self) -> u8 {
        self.dest_addr_ton.value
    }

    pub fn dest_addr_npi(&self) -> u8 {
        self.dest_addr_npi.value
    }

    pub fn esm_class(&self) -> u8 {
        self.esm_class.value
    }

    pub fn registered_delivery(&self) -> u8 {
        self.registered_delivery.value
    }

    pub fn data_coding(&self) -> u8 {
        self.data_coding.value
    }

    pub fn short_message(&self) -> &[u8] {
        self.short_message.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SM_BODY: &[u8] = b"\0\x01\x01111\0\x01\x01222\0\
\x00\x00\x00\0\0\x01\x00\x00\x00\x02hi";

    #[test]
    fn parse_sm_data() {
        let mut cursor = Cursor::new(SM_BODY);
        let data = SmData::parse(&mut cursor).unwrap();
        assert_eq!(data.source_addr(), "111");
        assert_eq!(data.destination_addr(), "222");
        assert_eq!(data.registered_delivery(), 0x01);
        assert_eq!(data.short_message(), b"hi");
    }

    #[tokio::test]
    async fn write_sm_data_roundtrip() {
        let data = SmData::new(
            "", 0x01, 0x01, "111", 0x01, 0x01, "222", 0x00, 0x00, 0x00, "",
            "", 0x01, 0x00, 0x00, 0x00, b"hi",
        )
        .unwrap();
        let mut buf: Vec<u8> = Vec::new();
        data.write(&mut buf).await.unwrap();
        assert_eq!(&buf[..], SM_BODY);

        let mut cursor = Cursor::new(&buf[..]);
        assert_eq!(SmData::parse(&mut cursor).unwrap(), data);
    }

    #[test]
    fn parse_sm_data_with_sm_length_longer_than_body() {
        // sm_length claims 9 bytes but only 2 are present
        let mut bytes = SM_BODY.to_vec();
        let len_pos = bytes.len() - 3;
        bytes[len_pos] = 9;
        let mut cursor = Cursor::new(&bytes[..]);
        let res = SmData::parse(&mut cursor).unwrap_err();
        assert_eq!(res.field_name.as_deref(), Some("short_message"));
    }

    #[test]
    fn new_sm_data_with_too_long_short_message() {
        let res = SmData::new(
            "", 0x01, 0x01, "111", 0x01, 0x01, "222", 0x00, 0x00, 0x00, "",
            "", 0x00, 0x00, 0x00, 0x00, &[0x55; 255],
        )
        .unwrap_err();
        assert_eq!(res.field_name.as_deref(), Some("short_message"));
    }
}
