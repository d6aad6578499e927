//! UUID support.
//!
//! UUID values travel in BSON as binary elements with subtype 3, with the
//! bytes stored in little-endian order. This module wraps [`uuid::Uuid`] so
//! the codec can apply that byte-order convention in one place.

use std::fmt;

/// A UUID value, carried on the wire as binary subtype 3.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uuid {
    uuid: uuid::Uuid,
}

impl Uuid {
    /// Creates a random (version 4) UUID.
    pub fn new() -> Self {
        Self {
            uuid: uuid::Uuid::new_v4(),
        }
    }

    /// Creates a [`Uuid`] from the provided big-endian bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self {
            uuid: uuid::Uuid::from_bytes(bytes),
        }
    }

    /// Returns the big-endian bytes of this [`Uuid`].
    pub const fn bytes(self) -> [u8; 16] {
        *self.uuid.as_bytes()
    }

    /// Creates a [`Uuid`] from bytes in the little-endian order used on the
    /// wire by binary subtype 3.
    pub(crate) const fn from_bytes_le(bytes: [u8; 16]) -> Self {
        Self {
            uuid: uuid::Uuid::from_bytes_le(bytes),
        }
    }

    /// Returns the bytes of this [`Uuid`] in the little-endian order used on
    /// the wire by binary subtype 3.
    pub(crate) const fn bytes_le(self) -> [u8; 16] {
        self.uuid.to_bytes_le()
    }
}

impl Default for Uuid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::str::FromStr for Uuid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            uuid: uuid::Uuid::parse_str(s)?,
        })
    }
}

impl From<uuid::Uuid> for Uuid {
    fn from(uuid: uuid::Uuid) -> Self {
        Self { uuid }
    }
}

impl From<Uuid> for uuid::Uuid {
    fn from(uuid: Uuid) -> Self {
        uuid.uuid
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.uuid, f)
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Uuid(\"{}\")", self.uuid)
    }
}
