#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Git-compatible content addressing for package trees
//!
//! Every file is hashed as a git blob object, and the whole tree is reduced
//! to a single blob hash over a `git ls-files -s` style listing. The result
//! only depends on names, relative layout and file bytes.

mod exclude;
mod tree;

pub use exclude::{ExclusionSet, DEFAULT_EXCLUDE_PATTERNS};
pub use tree::{TreeEntry, TreeHasher, TreeListing, ENTRY_MODE, ENTRY_STAGE};

use otumat_errors::{Error, InputError};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;

/// Length of a SHA-1 digest in bytes
pub const OBJECT_ID_LEN: usize = 20;

/// A git blob object id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    bytes: [u8; OBJECT_ID_LEN],
}

impl ObjectId {
    /// Create an object id from raw bytes
    #[must_use]
    pub fn from_bytes(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self { bytes }
    }

    /// Get the raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.bytes
    }

    /// Convert to lowercase hex string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse from hex string
    ///
    /// # Errors
    /// Returns an error if the input is not valid hexadecimal or is not exactly 40 characters.
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s).map_err(|e| InputError::InvalidObjectId {
            value: s.to_string(),
            message: e.to_string(),
        })?;

        let array: [u8; OBJECT_ID_LEN] =
            bytes
                .try_into()
                .map_err(|b: Vec<u8>| InputError::InvalidObjectId {
                    value: s.to_string(),
                    message: format!("must be {OBJECT_ID_LEN} bytes, got {}", b.len()),
                })?;
        Ok(Self::from_bytes(array))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Hash bytes the way `git hash-object` does: `SHA1("blob {len}\0" + data)`
#[must_use]
pub fn object_hash(data: &[u8]) -> ObjectId {
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", data.len()).as_bytes());
    hasher.update(data);
    ObjectId::from_bytes(hasher.finalize().into())
}
