use std::io;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Codec precondition failures. Raised before any encoder state is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{field} value {value} is out of range 0..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        max: u16,
    },
}

impl Error {
    pub(crate) fn check(field: &'static str, value: i64, max: u16) -> Result<()> {
        if (0..=max as i64).contains(&value) {
            Ok(())
        } else {
            Err(Error::OutOfRange { field, value, max })
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}
