//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core services expect from
//! infrastructure. They use only domain types.
//!
//! # Design Rules
//!
//! - No HTTP client or filesystem layout types in any signature
//! - Adapters map their own errors into the port error types here

pub mod blob_store;
pub mod cache;
pub mod download;

pub use blob_store::{BlobStore, StagedBlob, StoreError};
pub use cache::{CacheError, CacheResult, ContentCache, GcReport};
pub use download::{DownloadError, Downloader, DownloaderFactory};

#[cfg(test)]
pub use cache::MockContentCache;
#[cfg(test)]
pub use download::{MockDownloader, MockDownloaderFactory};
