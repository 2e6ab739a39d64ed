//! Blob store port: digest-indexed byte storage with a persisted name index.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::domain::{ByteReader, Descriptor, Digest};

/// Errors raised by a blob store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure, with the operation and path for context.
    #[error("{operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The persisted index could not be read or written.
    #[error("index {path}: {message}")]
    Index { path: PathBuf, message: String },
}

impl StoreError {
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// A blob being written, not yet visible under any digest.
///
/// Dropping a staged blob without committing it removes the file.
#[derive(Debug)]
pub struct StagedBlob {
    file: NamedTempFile,
}

impl StagedBlob {
    pub const fn new(file: NamedTempFile) -> Self {
        Self { file }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Async handle for writing the staged bytes.
    pub fn writer(&self) -> io::Result<tokio::fs::File> {
        Ok(tokio::fs::File::from_std(self.file.as_file().try_clone()?))
    }

    pub fn into_temp_file(self) -> NamedTempFile {
        self.file
    }
}

/// Physical storage consumed by the content cache.
///
/// Implementations own the on-disk layout. Names are stored as descriptors so
/// that the layout can record media types alongside the digest.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn exists(&self, digest: &Digest) -> Result<bool, StoreError>;

    /// Open a blob for reading; `None` when absent.
    async fn open(&self, digest: &Digest) -> Result<Option<ByteReader>, StoreError>;

    /// Size of a stored blob; `None` when absent.
    async fn size(&self, digest: &Digest) -> Result<Option<u64>, StoreError>;

    /// Create a staging file for a new blob.
    async fn stage(&self) -> Result<StagedBlob, StoreError>;

    /// Publish a staged blob under `digest`. Committing a digest that is
    /// already present discards the staged bytes.
    async fn commit(&self, staged: StagedBlob, digest: &Digest) -> Result<(), StoreError>;

    /// Remove a blob. Returns the number of bytes freed, `None` if absent.
    async fn delete(&self, digest: &Digest) -> Result<Option<u64>, StoreError>;

    /// Every blob currently present.
    async fn digests(&self) -> Result<Vec<Digest>, StoreError>;

    /// Point `name` at `descriptor`, replacing any previous target.
    async fn tag(&self, name: &str, descriptor: Descriptor) -> Result<(), StoreError>;

    /// Remove `name`. Returns the descriptor it pointed at, if any.
    async fn untag(&self, name: &str) -> Result<Option<Descriptor>, StoreError>;

    async fn resolve(&self, name: &str) -> Result<Option<Descriptor>, StoreError>;

    /// All names with their descriptors.
    async fn tags(&self) -> Result<Vec<(String, Descriptor)>, StoreError>;

    /// Persist the name index.
    async fn save_index(&self) -> Result<(), StoreError>;

    /// Remove abandoned staging files. Returns how many were removed.
    async fn purge_staging(&self) -> Result<usize, StoreError>;
}
