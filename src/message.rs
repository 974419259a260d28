use chrono::{DateTime, Utc};
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pdu::DataCoding;

/// Generate an opaque message id: 16 hex characters, unique for the
/// process lifetime.
pub fn new_message_id() -> String {
    Uuid::new_v4().simple().to_string()[..16].to_string()
}

/// The business record carried on the SMS queues.  The wire details of the
/// PDU it arrived in (or leaves in) are not preserved here.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct SmsMessage {
    pub message_id: String,
    pub sender: String,
    pub recipient: String,
    pub message: String,
    pub sent_time: DateTime<Utc>,
    pub delivered_time: Option<DateTime<Utc>>,
}

impl SmsMessage {
    pub fn new(sender: &str, recipient: &str, message: &str) -> Self {
        Self {
            message_id: new_message_id(),
            sender: String::from(sender),
            recipient: String::from(recipient),
            message: String::from(message),
            sent_time: Utc::now(),
            delivered_time: None,
        }
    }
}

/// Pick a wire encoding for outgoing message text: plain ASCII uses the
/// default alphabet, anything else goes out as UCS2 (UTF-16BE).
pub fn encode_short_message(text: &str) -> (Vec<u8>, DataCoding) {
    if text.is_ascii() {
        (text.as_bytes().to_vec(), DataCoding::Default)
    } else {
        let bytes = text
            .encode_utf16()
            .flat_map(|unit| unit.to_be_bytes().to_vec())
            .collect();
        (bytes, DataCoding::Ucs2)
    }
}

/// Decode inbound short_message bytes according to data_coding.  Binary
/// codings become a hex string; unrecognised codings fall back to ASCII,
/// then Latin-1.
pub fn decode_short_message(bytes: &[u8], data_coding: u8) -> String {
    match DataCoding::from_u8(data_coding) {
        Some(DataCoding::Ucs2) => {
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        Some(DataCoding::Latin1) | Some(DataCoding::Ia5) => {
            bytes.iter().map(|&b| b as char).collect()
        }
        Some(DataCoding::Binary) | Some(DataCoding::Binary8Bit) => {
            bytes.iter().map(|b| format!("{:02x}", b)).collect()
        }
        // ASCII is a subset of Latin-1, so the fallback covers both
        _ => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_ids_are_16_hex_chars_and_unique() {
        let a = new_message_id();
        let b = new_message_id();
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn ascii_text_encodes_with_default_alphabet() {
        let (bytes, data_coding) = encode_short_message("hello");
        assert_eq!(bytes, b"hello");
        assert_eq!(data_coding, DataCoding::Default);
    }

    #[test]
    fn non_ascii_text_encodes_as_ucs2() {
        let (bytes, data_coding) = encode_short_message("h\u{e9}");
        assert_eq!(bytes, vec![0x00, 0x68, 0x00, 0xe9]);
        assert_eq!(data_coding, DataCoding::Ucs2);
    }

    #[test]
    fn ucs2_bytes_decode_back_to_text() {
        let text = decode_short_message(
            &[0x00, 0x68, 0x00, 0xe9],
            DataCoding::Ucs2 as u8,
        );
        assert_eq!(text, "h\u{e9}");
    }

    #[test]
    fn binary_bytes_decode_to_hex() {
        let text = decode_short_message(
            &[0xde, 0xad, 0xbe, 0xef],
            DataCoding::Binary as u8,
        );
        assert_eq!(text, "deadbeef");
    }

    #[test]
    fn latin1_bytes_decode_directly() {
        let text =
            decode_short_message(b"caf\xe9", DataCoding::Latin1 as u8);
        assert_eq!(text, "caf\u{e9}");
    }

    #[test]
    fn unknown_coding_falls_back_to_latin1() {
        let text = decode_short_message(b"ok\xff", 0x77);
        assert_eq!(text, "ok\u{ff}");
    }
}
