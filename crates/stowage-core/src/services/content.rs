//! Acquisition pipeline: Lookup, Ensure and Evict over a cache and downloaders.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::hashing::spill_and_hash;
use crate::domain::{ContentItem, ContentRequest, Digest, EnsureOutcome};
use crate::ports::{CacheError, ContentCache, DownloadError, DownloaderFactory, GcReport};

/// Errors surfaced by the acquisition pipeline.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The downloader succeeded but returned no items.
    #[error("download of '{locator}' returned no content")]
    NothingDownloaded { locator: String },
}

/// Orchestrates hit check, download, hash/dedup/store and naming.
///
/// Store-then-name sequences hold a shared gate; eviction and GC hold it
/// exclusively, so a blob is never collected between its store and its name.
pub struct ContentService {
    cache: Arc<dyn ContentCache>,
    downloaders: Arc<dyn DownloaderFactory>,
    spill_dir: Option<PathBuf>,
    gate: RwLock<()>,
}

impl ContentService {
    pub fn new(cache: Arc<dyn ContentCache>, downloaders: Arc<dyn DownloaderFactory>) -> Self {
        Self {
            cache,
            downloaders,
            spill_dir: None,
            gate: RwLock::new(()),
        }
    }

    /// Directory for spill files; the system temp dir when unset.
    #[must_use]
    pub fn with_spill_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.spill_dir = dir;
        self
    }

    pub fn cache(&self) -> &Arc<dyn ContentCache> {
        &self.cache
    }

    /// Digest the locator is named to, if its root blob is present.
    pub async fn lookup(&self, locator: &str) -> Result<Option<Digest>, ContentError> {
        let digest = match self.cache.resolve(locator).await {
            Ok(digest) => digest,
            Err(CacheError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if self.cache.exists(&digest).await? {
            Ok(Some(digest))
        } else {
            warn!(locator = %locator, digest = %digest, "name points at a missing blob");
            Ok(None)
        }
    }

    /// Make sure the locator's content is cached and return its root digest.
    pub async fn ensure(&self, request: &ContentRequest) -> Result<EnsureOutcome, ContentError> {
        let locator = request.locator.as_str();
        if let Some(digest) = self.lookup(locator).await? {
            debug!(locator = %locator, digest = %digest, "cache hit");
            return Ok(EnsureOutcome::hit(digest));
        }

        let downloader = self.downloaders.downloader(request).inspect_err(|e| {
            warn!(locator = %locator, error = %e, "no downloader for locator");
        })?;
        info!(locator = %locator, "cache miss, downloading");
        let items = downloader.download().await.inspect_err(|e| {
            warn!(locator = %locator, error = %e, "download failed");
        })?;

        let _guard = self.gate.read().await;
        let outcome = self
            .store_items(locator, items)
            .await
            .inspect_err(|e| warn!(locator = %locator, error = %e, "storing content failed"))?;

        self.cache
            .name(&outcome.digest, locator)
            .await
            .inspect_err(|e| warn!(locator = %locator, error = %e, "naming content failed"))?;

        info!(
            locator = %locator,
            digest = %outcome.digest,
            items = outcome.items,
            stored = outcome.stored,
            "content cached"
        );
        Ok(outcome)
    }

    /// Store every item in order; the first item's digest is the root.
    async fn store_items(
        &self,
        locator: &str,
        items: Vec<ContentItem>,
    ) -> Result<EnsureOutcome, ContentError> {
        let total = items.len();
        let mut root: Option<Digest> = None;
        let mut stored = 0;

        for item in items {
            let (digest, size, reader) = match item.digest {
                Some(digest) => (digest, item.size, item.reader),
                None => {
                    let spilled = spill_and_hash(item.reader, self.spill_dir.as_deref())
                        .await
                        .map_err(|e| read_failure(locator, e))?;
                    (spilled.digest, Some(spilled.size), spilled.reader)
                }
            };
            root.get_or_insert_with(|| digest.clone());

            if self.cache.exists(&digest).await? {
                debug!(locator = %locator, digest = %digest, "dedup hit");
                continue;
            }
            self.cache
                .put(Some(digest), size, reader)
                .await
                .map_err(|e| read_failure(locator, e))?;
            stored += 1;
        }

        let digest = root.ok_or_else(|| ContentError::NothingDownloaded {
            locator: locator.to_string(),
        })?;
        Ok(EnsureOutcome {
            digest,
            cached: false,
            items: total,
            stored,
        })
    }

    /// Remove the locator's name and collect garbage. Returns false if the
    /// locator was not named.
    pub async fn evict(&self, locator: &str) -> Result<bool, ContentError> {
        let _guard = self.gate.write().await;
        match self.cache.resolve(locator).await {
            Ok(_) => {}
            Err(CacheError::NotFound { .. }) => {
                debug!(locator = %locator, "evict of unknown locator");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }
        self.cache.unname(locator).await?;
        let report = self.cache.gc().await?;
        info!(locator = %locator, removed = report.removed, "evicted");
        Ok(true)
    }

    /// Run garbage collection on its own.
    pub async fn gc(&self) -> Result<GcReport, ContentError> {
        let _guard = self.gate.write().await;
        Ok(self.cache.gc().await?)
    }
}

/// A source stream that breaks mid-transfer is an upstream failure of the
/// locator, not a local cache error.
fn read_failure(locator: &str, err: CacheError) -> ContentError {
    match err {
        CacheError::Stream(source) => {
            DownloadError::upstream(locator, "read content", source.to_string()).into()
        }
        other => other.into(),
    }
}
