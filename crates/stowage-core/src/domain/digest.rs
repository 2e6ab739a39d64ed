//! Content digests.
//!
//! A digest is written `<algorithm>:<hex>`. Only `sha256` is produced by this
//! crate, but any well-formed algorithm name is accepted when parsing so that
//! foreign descriptors can be carried through without loss.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use thiserror::Error;

/// Algorithm name for SHA-256 digests.
pub const SHA256: &str = "sha256";

const SHA256_HEX_LEN: usize = 64;

/// Error returned when a string is not a well-formed digest.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid digest '{value}': {reason}")]
pub struct DigestParseError {
    pub value: String,
    pub reason: &'static str,
}

impl DigestParseError {
    fn new(value: &str, reason: &'static str) -> Self {
        Self {
            value: value.to_string(),
            reason,
        }
    }
}

/// A validated content digest such as `sha256:9f86d0...`.
///
/// The hex part is always stored lowercase so that two digests of the same
/// bytes compare equal regardless of how an upstream spelled them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest {
    algorithm: String,
    hex: String,
}

impl Digest {
    /// Parse `<algorithm>:<hex>`.
    pub fn parse(value: &str) -> Result<Self, DigestParseError> {
        let (algorithm, hex) = value
            .split_once(':')
            .ok_or_else(|| DigestParseError::new(value, "missing ':' separator"))?;

        if algorithm.is_empty()
            || !algorithm
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(DigestParseError::new(value, "malformed algorithm"));
        }
        Self::from_parts(value, algorithm, hex)
    }

    /// Build a SHA-256 digest from a bare hex string (as reported by the Model Hub).
    pub fn sha256_from_hex(hex: &str) -> Result<Self, DigestParseError> {
        Self::from_parts(hex, SHA256, hex)
    }

    /// Hash an in-memory buffer.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = DigestHasher::new();
        hasher.update(bytes);
        hasher.finish()
    }

    fn from_parts(original: &str, algorithm: &str, hex: &str) -> Result<Self, DigestParseError> {
        if hex.is_empty() {
            return Err(DigestParseError::new(original, "empty hex"));
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DigestParseError::new(original, "non-hex characters"));
        }
        if algorithm == SHA256 && hex.len() != SHA256_HEX_LEN {
            return Err(DigestParseError::new(
                original,
                "sha256 digests must be 64 hex characters",
            ));
        }
        Ok(Self {
            algorithm: algorithm.to_string(),
            hex: hex.to_ascii_lowercase(),
        })
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Location of this blob below an OCI layout root: `blobs/<alg>/<hex>`.
    pub fn blob_path(&self, root: &Path) -> PathBuf {
        root.join("blobs").join(&self.algorithm).join(&self.hex)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

impl FromStr for Digest {
    type Err = DigestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Digest {
    type Error = DigestParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Digest> for String {
    fn from(value: Digest) -> Self {
        value.to_string()
    }
}

/// Incremental SHA-256 hasher that also counts the bytes it has seen.
#[derive(Default)]
pub struct DigestHasher {
    inner: Sha256,
    bytes: u64,
}

impl DigestHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
        self.bytes += data.len() as u64;
    }

    /// Number of bytes hashed so far.
    pub const fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn finish(self) -> Digest {
        Digest {
            algorithm: SHA256.to_string(),
            hex: format!("{:x}", self.inner.finalize()),
        }
    }
}
