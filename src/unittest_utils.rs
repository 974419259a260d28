use std::io;
use std::io::{BufReader, Read};

/// A reader that always fails, for exercising error paths in parsers.
pub struct FailingRead {}

impl FailingRead {
    pub fn new_bufreader() -> BufReader<FailingRead> {
        BufReader::new(FailingRead {})
    }

    fn error() -> io::Error {
        // EINVAL
        io::Error::from_raw_os_error(22)
    }

    pub fn error_string() -> String {
        FailingRead::error().to_string()
    }
}

impl Read for FailingRead {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(FailingRead::error())
    }
}
