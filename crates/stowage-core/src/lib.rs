//! Core domain types, ports and services for stowage, a local
//! content-addressable caching proxy.
//!
//! - [`domain`]: digests, locators, credentials, content items and the OCI
//!   manifest model
//! - [`ports`]: the blob store, content cache and downloader traits
//! - [`services`]: [`StoreCache`] (the content cache) and [`ContentService`]
//!   (the acquisition pipeline)
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod paths;
pub mod ports;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::{
    ByteReader, ContentItem, ContentRequest, Credentials, CredentialsError, Descriptor, Digest,
    DigestHasher, DigestParseError, EnsureOutcome, ImageIndex, ImageManifest, Locator,
    LocatorError, Scheme, reader_from_bytes, reader_from_stream,
};
pub use paths::{DEFAULT_CACHE_DIR_RELATIVE, PathError, default_cache_dir, ensure_directory};
pub use ports::{
    BlobStore, CacheError, CacheResult, ContentCache, DownloadError, Downloader,
    DownloaderFactory, GcReport, StagedBlob, StoreError,
};
pub use services::{ContentError, ContentService, StoreCache, spill_and_hash};
