//! Content cache port: digest-addressed blobs plus names and GC.

use std::io;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use super::blob_store::StoreError;
use crate::domain::{ByteReader, Digest, DigestParseError};

/// Errors raised by a content cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// No blob or name under the given key.
    #[error("not found: {key}")]
    NotFound { key: String },

    /// Content hashed to a different digest than the caller declared.
    #[error("digest mismatch: expected {expected}, content hashes to {actual}")]
    KeyMismatch { expected: Digest, actual: Digest },

    /// Content length differs from the declared size.
    #[error("size mismatch for {digest}: expected {expected} bytes, read {actual}")]
    SizeMismatch {
        digest: Digest,
        expected: u64,
        actual: u64,
    },

    /// The source produced no bytes.
    #[error("no content to store")]
    EmptyContent,

    #[error(transparent)]
    InvalidDigest(#[from] DigestParseError),

    /// Reading the incoming stream failed.
    #[error("reading content stream: {0}")]
    Stream(#[source] io::Error),

    /// Local scratch I/O (spill files) failed.
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CacheError {
    pub fn not_found(key: impl ToString) -> Self {
        Self::NotFound {
            key: key.to_string(),
        }
    }

    /// True for corrupted or mislabelled content.
    pub const fn is_integrity(&self) -> bool {
        matches!(
            self,
            Self::KeyMismatch { .. } | Self::SizeMismatch { .. } | Self::EmptyContent
        )
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Outcome of a garbage collection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GcReport {
    /// Blobs reachable from a live name.
    pub retained: usize,
    /// Blobs deleted.
    pub removed: usize,
    /// Bytes freed by the deleted blobs.
    pub reclaimed_bytes: u64,
    /// Abandoned staging files deleted.
    pub staging_removed: usize,
}

/// Digest-addressed storage with names and garbage collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentCache: Send + Sync {
    /// True iff a blob is stored under `key`. Only I/O failures are errors.
    async fn exists(&self, key: &Digest) -> CacheResult<bool>;

    /// Open a stored blob; `NotFound` when absent.
    async fn get(&self, key: &Digest) -> CacheResult<ByteReader>;

    /// Store a stream and return the digest of the bytes actually written.
    ///
    /// When `key` or `size` are supplied they are checked against the content
    /// before anything becomes visible.
    async fn put(
        &self,
        key: Option<Digest>,
        size: Option<u64>,
        reader: ByteReader,
    ) -> CacheResult<Digest>;

    /// Remove a blob and any name pointing at it. Absent keys are a no-op.
    async fn delete(&self, key: &Digest) -> CacheResult<()>;

    /// Point `alias` at a stored blob; `NotFound` if the blob is absent.
    async fn name(&self, key: &Digest, alias: &str) -> CacheResult<()>;

    /// Remove `alias`. Unknown aliases are a no-op.
    async fn unname(&self, alias: &str) -> CacheResult<()>;

    /// Digest for `alias`; `NotFound` when unknown.
    async fn resolve(&self, alias: &str) -> CacheResult<Digest>;

    /// Persist the index and reclaim blobs no name can reach.
    async fn gc(&self) -> CacheResult<GcReport>;
}
