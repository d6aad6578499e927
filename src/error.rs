use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// The error type for BSON encoding, decoding, and wire message assembly.
///
/// Errors are never recovered internally: the first one encountered aborts
/// the operation in progress and is returned to the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The document cannot be serialized: a key failed validation, a regex
    /// pattern contained a NUL byte, or nesting exceeded the recursion limit.
    #[error("invalid document: {message}")]
    InvalidDocument { message: String },

    /// A byte sequence declared as text is not valid UTF-8.
    #[error("invalid string data: {message}")]
    InvalidStringData { message: String },

    /// Malformed BSON bytes were encountered while decoding.
    #[error("invalid BSON: {message}")]
    InvalidBson { message: String },

    /// An integer does not fit in a signed 64-bit BSON value.
    #[error("MongoDB can only handle up to 8-byte ints")]
    Overflow,

    /// A wire message could not be assembled from the given arguments.
    #[error("invalid operation: {message}")]
    InvalidOperation { message: String },

    /// The output buffer failed to grow.
    #[error("out of memory: could not reserve {requested} additional bytes")]
    OutOfMemory { requested: usize },
}

impl Error {
    pub(crate) fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_string_data(message: impl Into<String>) -> Self {
        Self::InvalidStringData {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_bson(message: impl Into<String>) -> Self {
        Self::InvalidBson {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
