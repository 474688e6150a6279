use std::fmt;

use sha2::{Digest, Sha256};

use crate::{ImageReference, ModelError, ModelResult};

/// Number of digest bytes kept in a key (64 bits).
const KEY_BYTES: usize = 8;

/// Stable on-disk filename for an [`ImageReference`].
///
/// The key is the first 64 bits of SHA-256 over the reference, hex encoded.
/// It has no time or process component, so a key computed today names the
/// same file after a restart and on any platform.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct CacheKey(String);

impl CacheKey {
    /// Length of the hex-encoded key.
    pub const LEN: usize = KEY_BYTES * 2;

    pub fn derive(reference: &ImageReference) -> Self {
        let digest = Sha256::digest(reference.as_str().as_bytes());
        Self(hex::encode(&digest[..KEY_BYTES]))
    }

    /// Parse a filename back into a key. Anything that `derive` could not
    /// have produced is rejected, including temp-file names.
    pub fn parse(raw: &str) -> ModelResult<Self> {
        if Self::is_valid(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ModelError::InvalidCacheKey(raw.to_string()))
        }
    }

    pub fn is_valid(raw: &str) -> bool {
        raw.len() == Self::LEN
            && raw
                .as_bytes()
                .iter()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CacheKey").field(&self.0).finish()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&ImageReference> for CacheKey {
    fn from(reference: &ImageReference) -> Self {
        Self::derive(reference)
    }
}

impl TryFrom<String> for CacheKey {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}
