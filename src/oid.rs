//! The 12-byte document identifiers assigned by MongoDB clients and servers.

use std::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU32, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use lazy_static::lazy_static;
use rand::{thread_rng, Rng};
use thiserror::Error;

use crate::datetime::DateTime;

lazy_static! {
    // Fixed for the lifetime of the process; distinguishes generators that
    // share a clock second.
    static ref PROCESS_RANDOM: [u8; 5] = thread_rng().gen();
    // Seeded randomly so ids from short-lived processes don't cluster.
    static ref COUNTER: AtomicU32 = AtomicU32::new(thread_rng().gen());
}

/// Errors from parsing the hexadecimal form of an id.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The input was not exactly 24 characters long.
    #[error("an ObjectId is 24 hex characters, got {length}")]
    InvalidLength { length: usize },

    /// The input contained a character outside `[0-9a-fA-F]`.
    #[error(transparent)]
    InvalidHex(#[from] hex::FromHexError),
}

/// Alias for `Result<T, oid::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// A 12-byte BSON document identifier.
///
/// Generated ids lead with the creation time in seconds (big-endian),
/// followed by five random bytes fixed per process and the low three bytes
/// of an incrementing counter, so ids sort roughly by creation time. The
/// BSON format itself is little-endian; these twelve bytes travel as-is.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Generates a new id from the clock, the per-process random value, and
    /// the counter.
    pub fn new() -> ObjectId {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as u32)
            .unwrap_or(0);
        let count = COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut id = [0u8; 12];
        id[..4].copy_from_slice(&seconds.to_be_bytes());
        id[4..9].copy_from_slice(&*PROCESS_RANDOM);
        id[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        ObjectId(id)
    }

    /// Wraps an existing raw byte representation.
    pub const fn from_bytes(bytes: [u8; 12]) -> ObjectId {
        ObjectId(bytes)
    }

    /// Parses an id from its 24-character hexadecimal form.
    pub fn parse_str(hex: impl AsRef<str>) -> Result<ObjectId> {
        let hex = hex.as_ref();
        if hex.len() != 24 {
            return Err(Error::InvalidLength { length: hex.len() });
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(hex, &mut bytes)?;
        Ok(ObjectId(bytes))
    }

    /// The raw byte representation.
    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// The 24-character hexadecimal form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The creation instant recorded in the leading four bytes.
    pub fn timestamp(&self) -> DateTime {
        let seconds = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        DateTime::from_millis(i64::from(seconds) * 1000)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<ObjectId> {
        ObjectId::parse_str(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}
