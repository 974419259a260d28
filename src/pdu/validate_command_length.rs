use core::fmt::{Display, Formatter};

use crate::pdu::formats::Integer4;

// https://smpp.org/SMPP_v3_4_Issue1_2.pdf: command_length is carried in a
// u32, but no PDU we handle can legitimately be longer than 64K.
pub const MAX_PDU_LENGTH: usize = 65535;

// A PDU is at least a 16 byte header
pub const MIN_PDU_LENGTH: usize = 16;

#[derive(Debug, PartialEq)]
pub enum CommandLengthError {
    TooLong(u32),
    TooShort(u32),
}

impl Display for CommandLengthError {
    fn fmt(
        &self,
        formatter: &mut Formatter,
    ) -> std::result::Result<(), std::fmt::Error> {
        match self {
            CommandLengthError::TooLong(length) => {
                formatter.write_fmt(format_args!(
                    "PDU too long!  Length: {}, max allowed: {}.",
                    length, MAX_PDU_LENGTH
                ))
            }
            CommandLengthError::TooShort(length) => {
                formatter.write_fmt(format_args!(
                    "PDU too short!  Length: {}, min allowed: {}.",
                    length, MIN_PDU_LENGTH
                ))
            }
        }
    }
}

pub fn validate_command_length(
    command_length: &Integer4,
) -> Result<(), CommandLengthError> {
    let len = command_length.value as usize;
    if len > MAX_PDU_LENGTH {
        Err(CommandLengthError::TooLong(command_length.value))
    } else if len < MIN_PDU_LENGTH {
        Err(CommandLengthError::TooShort(command_length.value))
    } else {
        Ok(())
    }
}
