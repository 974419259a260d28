use core::fmt::{Display, Formatter};
use std::error;
use std::io;

use crate::pdu::status::PduStatus;
use crate::pdu::validate_command_length::CommandLengthError;

#[derive(Debug, PartialEq)]
pub enum PduParseErrorBody {
    COctetStringMissingNull,
    COctetStringTooLong(usize),
    LengthTooLong(u32),
    LengthTooShort(u32),
    NotEnoughBytes,
    OctetStringTooLong(usize),
    OtherIoError(io::ErrorKind, String),
    StatusIsNotZero(u32),
    UnknownCommandId,
}

/// An error encountered while parsing a PDU, with as much context as we
/// managed to gather before failing: the command_id and sequence_number if
/// the header parsed, and the name of the field that was being read.
#[derive(Debug, PartialEq)]
pub struct PduParseError {
    pub command_id: Option<u32>,
    pub sequence_number: Option<u32>,
    pub field_name: Option<String>,
    pub body: PduParseErrorBody,
}

impl PduParseError {
    pub fn new(body: PduParseErrorBody) -> Self {
        Self {
            command_id: None,
            sequence_number: None,
            field_name: None,
            body,
        }
    }

    pub fn for_unknown_command_id() -> Self {
        Self::new(PduParseErrorBody::UnknownCommandId)
    }

    pub fn into_with_command_id(mut self, command_id: u32) -> Self {
        self.command_id = Some(command_id);
        self
    }

    pub fn into_with_sequence_number(mut self, sequence_number: u32) -> Self {
        self.sequence_number = Some(sequence_number);
        self
    }

    pub fn into_with_field_name(mut self, field_name: &str) -> Self {
        if self.field_name.is_none() {
            self.field_name = Some(String::from(field_name));
        }
        self
    }

    /// The command_status to use when reporting this error to the peer.
    pub fn status(&self) -> u32 {
        match self.body {
            PduParseErrorBody::LengthTooLong(_)
            | PduParseErrorBody::LengthTooShort(_) => {
                PduStatus::ESME_RINVCMDLEN as u32
            }
            _ => PduStatus::ESME_RINVCMDID as u32,
        }
    }
}

/// Attach a field name to any error produced while reading that field.
pub fn fld<T, E: Into<PduParseError>>(
    field_name: &str,
    res: Result<T, E>,
) -> Result<T, PduParseError> {
    res.map_err(|e| e.into().into_with_field_name(field_name))
}

impl From<io::Error> for PduParseError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                Self::new(PduParseErrorBody::NotEnoughBytes)
            }
            kind => {
                Self::new(PduParseErrorBody::OtherIoError(kind, e.to_string()))
            }
        }
    }
}

impl From<CommandLengthError> for PduParseError {
    fn from(e: CommandLengthError) -> Self {
        match e {
            CommandLengthError::TooLong(length) => {
                Self::new(PduParseErrorBody::LengthTooLong(length))
            }
            CommandLengthError::TooShort(length) => {
                Self::new(PduParseErrorBody::LengthTooShort(length))
            }
        }
    }
}

impl Display for PduParseError {
    fn fmt(
        &self,
        formatter: &mut Formatter,
    ) -> std::result::Result<(), std::fmt::Error> {
        let command_id = self
            .command_id
            .map(|id| format!("{:#010X}", id))
            .unwrap_or(String::from("UNKNOWN"));
        let field_name =
            self.field_name.as_deref().unwrap_or("UNKNOWN");
        let message = match &self.body {
            PduParseErrorBody::COctetStringMissingNull => String::from(
                "C-Octet String does not end with the NULL character.",
            ),
            PduParseErrorBody::COctetStringTooLong(max_len) => format!(
                "C-Octet String is too long.  Max length is {}, \
                including final zero byte.",
                max_len
            ),
            PduParseErrorBody::LengthTooLong(length) => format!(
                "Length ({}) too long.  Max allowed is {} octets.",
                length,
                crate::pdu::validate_command_length::MAX_PDU_LENGTH
            ),
            PduParseErrorBody::LengthTooShort(length) => format!(
                "Length ({}) too short.  Min allowed is {} octets.",
                length,
                crate::pdu::validate_command_length::MIN_PDU_LENGTH
            ),
            PduParseErrorBody::NotEnoughBytes => String::from(
                "Reached end of PDU length (or end of input) before \
                finding all fields of the PDU.",
            ),
            PduParseErrorBody::OctetStringTooLong(max_len) => format!(
                "Octet String is too long.  Max length is {}.",
                max_len
            ),
            PduParseErrorBody::OtherIoError(_kind, message) => {
                message.clone()
            }
            PduParseErrorBody::StatusIsNotZero(status) => format!(
                "command_status must be 0, but was {}.",
                status
            ),
            PduParseErrorBody::UnknownCommandId => {
                String::from("Supplied command_id is unknown.")
            }
        };
        formatter.write_fmt(format_args!(
            "Error parsing PDU (command_id={}, field_name={}): {}",
            command_id, field_name, message
        ))
    }
}

impl error::Error for PduParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_command_id_and_field_name() {
        let e = PduParseError::new(PduParseErrorBody::COctetStringMissingNull)
            .into_with_field_name("system_id")
            .into_with_command_id(0x00000002);
        assert_eq!(
            e.to_string(),
            "Error parsing PDU (command_id=0x00000002, \
            field_name=system_id): C-Octet String does not end with the \
            NULL character."
        );
    }

    #[test]
    fn fld_keeps_innermost_field_name() {
        let inner: Result<(), PduParseError> =
            Err(PduParseError::new(PduParseErrorBody::NotEnoughBytes)
                .into_with_field_name("source_addr"));
        let e = fld("submit_sm", inner).unwrap_err();
        assert_eq!(e.field_name.as_deref(), Some("source_addr"));
    }

    #[test]
    fn length_errors_map_to_invalid_command_length_status() {
        let e = PduParseError::new(PduParseErrorBody::LengthTooLong(70000));
        assert_eq!(e.status(), PduStatus::ESME_RINVCMDLEN as u32);
    }

    #[test]
    fn body_errors_map_to_invalid_command_id_status() {
        let e = PduParseError::new(PduParseErrorBody::NotEnoughBytes);
        assert_eq!(e.status(), PduStatus::ESME_RINVCMDID as u32);
    }
}
