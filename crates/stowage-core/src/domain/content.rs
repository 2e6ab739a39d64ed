//! Transient content items produced by downloaders.

use std::fmt;
use std::io;
use std::io::Cursor;

use bytes::Bytes;
use futures_core::Stream;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;

use super::credentials::Credentials;
use super::digest::Digest;

/// Owned, sendable byte stream.
pub type ByteReader = Box<dyn AsyncRead + Send + Unpin>;

/// Wrap an in-memory buffer as a [`ByteReader`].
pub fn reader_from_bytes(bytes: impl Into<Bytes>) -> ByteReader {
    Box::new(Cursor::new(bytes.into()))
}

/// Wrap a stream of byte chunks (e.g. an HTTP response body) as a [`ByteReader`].
pub fn reader_from_stream<S>(stream: S) -> ByteReader
where
    S: Stream<Item = io::Result<Bytes>> + Send + 'static,
{
    Box::new(StreamReader::new(Box::pin(stream)))
}

/// One unit of downloaded content.
///
/// `digest` and `size` are present only when the source publishes them; the
/// pipeline computes whatever is missing. The reader is consumed exactly once.
pub struct ContentItem {
    pub digest: Option<Digest>,
    pub size: Option<u64>,
    pub reader: ByteReader,
}

impl ContentItem {
    /// An item whose address is not known yet.
    pub fn unaddressed(reader: ByteReader) -> Self {
        Self {
            digest: None,
            size: None,
            reader,
        }
    }

    /// An item with a digest published by the source.
    pub fn addressed(digest: Digest, size: Option<u64>, reader: ByteReader) -> Self {
        Self {
            digest: Some(digest),
            size: size.filter(|s| *s > 0),
            reader,
        }
    }
}

impl fmt::Debug for ContentItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentItem")
            .field("digest", &self.digest)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// A caller's request to materialise a locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    pub locator: String,
    pub credentials: Option<Credentials>,
}

impl ContentRequest {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            credentials: None,
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }
}

/// Result of an Ensure call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsureOutcome {
    /// Root digest the locator is named to.
    pub digest: Digest,
    /// True when the locator was already satisfied and nothing was downloaded.
    pub cached: bool,
    /// Items returned by the downloader.
    pub items: usize,
    /// Items written to the cache (the rest were dedup hits).
    pub stored: usize,
}

impl EnsureOutcome {
    pub const fn hit(digest: Digest) -> Self {
        Self {
            digest,
            cached: true,
            items: 0,
            stored: 0,
        }
    }
}
