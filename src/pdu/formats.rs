use std::io;
use std::io::{BufRead, Read};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::pdu::{PduParseError, PduParseErrorBody};

pub type WriteStream = dyn AsyncWrite + Send + Unpin;

/// https://smpp.org/SMPP_v3_4_Issue1_2.pdf section 3.1
///
/// Integer: (1 byte)
/// An unsigned value with the defined number of octets.
/// The octets will always be transmitted MSB first (Big Endian).
#[derive(Debug, PartialEq)]
pub struct Integer1 {
    pub value: u8,
}

impl Integer1 {
    pub fn new(value: u8) -> Self {
        Self { value }
    }

    pub fn read(bytes: &mut dyn BufRead) -> io::Result<Self> {
        let mut ret: [u8; 1] = [0; 1];
        bytes.read_exact(&mut ret)?;
        Ok(Self { value: ret[0] })
    }

    pub async fn write(&self, stream: &mut WriteStream) -> io::Result<()> {
        stream.write_u8(self.value).await
    }
}

/// https://smpp.org/SMPP_v3_4_Issue1_2.pdf section 3.1
///
/// Integer: (2 bytes)
/// Used by the optional parameter (TLV) tag and length fields.
#[derive(Debug, PartialEq)]
pub struct Integer2 {
    pub value: u16,
}

impl Integer2 {
    pub fn new(value: u16) -> Self {
        Self { value }
    }

    pub fn read(bytes: &mut dyn BufRead) -> io::Result<Self> {
        let mut ret: [u8; 2] = [0; 2];
        bytes.read_exact(&mut ret)?;
        Ok(Self {
            value: u16::from_be_bytes(ret),
        })
    }

    pub async fn write(&self, stream: &mut WriteStream) -> io::Result<()> {
        stream.write_u16(self.value).await
    }
}

/// https://smpp.org/SMPP_v3_4_Issue1_2.pdf section 3.1
///
/// Integer: (4 bytes)
/// An unsigned value with the defined number of octets.
/// The octets will always be transmitted MSB first (Big Endian).
#[derive(Debug, PartialEq)]
pub struct Integer4 {
    pub value: u32,
}

impl Integer4 {
    pub fn new(value: u32) -> Self {
        Self { value }
    }

    pub fn read(bytes: &mut dyn BufRead) -> io::Result<Self> {
        let mut ret: [u8; 4] = [0; 4];
        bytes.read_exact(&mut ret)?;
        Ok(Self {
            value: u32::from_be_bytes(ret),
        })
    }

    pub async fn write(&self, stream: &mut WriteStream) -> io::Result<()> {
        stream.write_u32(self.value).await
    }
}

/// https://smpp.org/SMPP_v3_4_Issue1_2.pdf section 3.1
///
/// C-Octet String:
/// A series of Latin-1 characters terminated with the NULL character.
/// The maximum length includes the terminating NULL.
#[derive(Debug, PartialEq, Clone)]
pub struct COctetString {
    value: String,
}

impl COctetString {
    pub fn new() -> Self {
        Self {
            value: String::new(),
        }
    }

    /// Build a value for encoding.  Characters outside Latin-1 are replaced
    /// with '?', and the value is truncated to max_len - 1 characters so
    /// the encoded form (including the NULL) never exceeds max_len.
    pub fn from_str(value: &str, max_len: usize) -> Self {
        let value = value
            .chars()
            .map(|c| if (c as u32) < 0x100 { c } else { '?' })
            .take(max_len - 1)
            .collect();
        Self { value }
    }

    pub fn read(
        bytes: &mut dyn BufRead,
        max_len: usize,
    ) -> Result<Self, PduParseError> {
        let mut buf = Vec::new();
        let num = bytes.take(max_len as u64).read_until(0x00, &mut buf)?;

        if buf.last() != Some(&0x00) {
            // Ran out of characters before we found a NULL terminator
            if num == max_len {
                return Err(PduParseError::new(
                    PduParseErrorBody::COctetStringTooLong(max_len),
                ));
            } else {
                return Err(PduParseError::new(
                    PduParseErrorBody::COctetStringMissingNull,
                ));
            }
        }

        let buf = &buf[..(buf.len() - 1)]; // Remove trailing 0 byte
        Ok(Self {
            value: buf.iter().map(|&b| b as char).collect(),
        })
    }

    pub async fn write(&self, stream: &mut WriteStream) -> io::Result<()> {
        let bytes: Vec<u8> =
            self.value.chars().map(|c| c as u32 as u8).collect();
        stream.write_all(&bytes).await?;
        stream.write_u8(0u8).await
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }
}

/// https://smpp.org/SMPP_v3_4_Issue1_2.pdf section 3.1
///
/// Octet String:
/// A series of octets, not necessarily NULL terminated.  Used for
/// short_message, whose length is carried separately in sm_length.
#[derive(Debug, PartialEq, Clone)]
pub struct OctetString {
    value: Vec<u8>,
}

impl OctetString {
    pub fn from_bytes(
        bytes: &[u8],
        max_len: usize,
    ) -> Result<Self, PduParseError> {
        if bytes.len() > max_len {
            return Err(PduParseError::new(
                PduParseErrorBody::OctetStringTooLong(max_len),
            ));
        }
        Ok(Self {
            value: bytes.to_vec(),
        })
    }

    pub fn read(
        bytes: &mut dyn BufRead,
        len: usize,
    ) -> Result<Self, PduParseError> {
        let mut buf = vec![0; len];
        bytes.read_exact(buf.as_mut_slice())?;
        Ok(Self { value: buf })
    }

    pub async fn write(&self, stream: &mut WriteStream) -> io::Result<()> {
        stream.write_all(&self.value).await
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }
}
