use core::fmt::Formatter;
use std::convert::TryFrom;
use std::error;
use std::fmt::Display;
use std::io;

use crate::pdu::formats::Integer4;
use crate::pdu::validate_command_length::validate_command_length;

#[derive(Debug, PartialEq)]
pub struct CheckError {
    pub message: String,
    pub io_errorkind: Option<io::ErrorKind>,
}

impl Display for CheckError {
    fn fmt(
        &self,
        formatter: &mut Formatter,
    ) -> std::result::Result<(), std::fmt::Error> {
        if let Some(ek) = self.io_errorkind {
            formatter.write_fmt(format_args!(
                "Error checking PDU length: {}.  io::ErrorKind={:?}",
                self.message, ek
            ))
        } else {
            formatter.write_str(&self.message)
        }
    }
}

impl error::Error for CheckError {}

#[derive(Debug, PartialEq)]
pub enum CheckOutcome {
    Ready,
    Incomplete,
}

/// Check whether the supplied bytes contain one complete PDU, without
/// parsing it.  Rejects impossible command_length values, so a caller that
/// sees an error here must treat the stream as desynchronised.
pub fn check(bytes: &mut dyn io::BufRead) -> Result<CheckOutcome, CheckError> {
    Integer4::read(bytes)
        .map(|len| {
            match validate_command_length(&len) {
                Ok(()) => (),
                Err(e) => {
                    return Err(CheckError {
                        message: e.to_string(),
                        io_errorkind: None,
                    })
                }
            }
            check_can_read(bytes, len.value)
        })
        .unwrap_or_else(result_from_io_error)
}

fn result_from_io_error(
    io_error: io::Error,
) -> Result<CheckOutcome, CheckError> {
    match io_error.kind() {
        io::ErrorKind::UnexpectedEof => Ok(CheckOutcome::Incomplete),
        _ => Err(CheckError {
            message: io_error.to_string(),
            io_errorkind: Some(io_error.kind()),
        }),
    }
}

fn check_can_read(
    bytes: &mut dyn io::BufRead,
    command_length: u32,
) -> Result<CheckOutcome, CheckError> {
    let len = usize::try_from(command_length - 4).map_err(|_| CheckError {
        message: String::from("Invalid command length."),
        io_errorkind: None,
    })?;
    let mut buf = vec![0; len];
    bytes
        .read_exact(buf.as_mut_slice())
        .map(|_| CheckOutcome::Ready)
        .or_else(result_from_io_error)
}
