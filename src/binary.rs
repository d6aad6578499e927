use std::{
    error,
    fmt::{self, Display},
};

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::spec::BinarySubtype;

/// Represents a BSON binary value.
///
/// For [`BinarySubtype::BinaryOld`], `bytes` holds the payload only; the
/// codec adds and strips the redundant inner length that subtype carries on
/// the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binary {
    /// The subtype of the bytes.
    pub subtype: BinarySubtype,

    /// The binary bytes.
    pub bytes: Vec<u8>,
}

impl Display for Binary {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "Binary({:#x}, {})",
            u8::from(self.subtype),
            STANDARD.encode(&self.bytes)
        )
    }
}

impl Binary {
    /// Creates a [`Binary`] from a base64 string and optional
    /// [`BinarySubtype`]. If the `subtype` argument is `None`, the
    /// [`Binary`] constructed will default to [`BinarySubtype::Generic`].
    pub fn from_base64(
        input: impl AsRef<str>,
        subtype: impl Into<Option<BinarySubtype>>,
    ) -> Result<Self> {
        let bytes = STANDARD.decode(input.as_ref()).map_err(|e| Error::DecodingError {
            message: e.to_string(),
        })?;
        let subtype = match subtype.into() {
            Some(s) => s,
            None => BinarySubtype::Generic,
        };
        Ok(Binary { subtype, bytes })
    }
}

/// Possible errors that can arise during [`Binary`] construction.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Error {
    /// While trying to decode from base64, an error was returned.
    DecodingError { message: String },
}

impl error::Error for Error {}

impl Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DecodingError { message } => fmt.write_str(message),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
