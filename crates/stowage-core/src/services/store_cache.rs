//! Content cache built on a [`BlobStore`].

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use super::hashing::copy_hashing;
use crate::domain::oci::{self, OCTET_STREAM};
use crate::domain::{ByteReader, Descriptor, Digest, DigestHasher};
use crate::ports::{BlobStore, CacheError, CacheResult, ContentCache, GcReport};

/// Blobs larger than this are never inspected for a manifest media type.
const MAX_MANIFEST_SIZE: u64 = 4 * 1024 * 1024;

/// The content cache: verified writes, names and reachability GC over a blob store.
pub struct StoreCache<S> {
    store: S,
}

impl<S: BlobStore> StoreCache<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    async fn read_all(&self, digest: &Digest) -> CacheResult<Option<Vec<u8>>> {
        let Some(mut reader) = self.store.open(digest).await? else {
            return Ok(None);
        };
        let mut payload = Vec::new();
        reader
            .read_to_end(&mut payload)
            .await
            .map_err(|source| CacheError::Io {
                context: "read blob",
                source,
            })?;
        Ok(Some(payload))
    }

    /// Media type recorded for a name: the manifest type if the blob is one.
    async fn media_type_of(&self, digest: &Digest, size: u64) -> CacheResult<String> {
        if size > MAX_MANIFEST_SIZE {
            return Ok(OCTET_STREAM.to_string());
        }
        let sniffed = self
            .read_all(digest)
            .await?
            .and_then(|payload| oci::sniff_media_type(&payload));
        Ok(sniffed.unwrap_or(OCTET_STREAM).to_string())
    }

    /// Every digest reachable from a live name.
    async fn reachable(&self) -> CacheResult<HashSet<Digest>> {
        let mut reachable = HashSet::new();
        let mut queue: VecDeque<Descriptor> = self
            .store
            .tags()
            .await?
            .into_iter()
            .map(|(_, descriptor)| descriptor)
            .collect();

        while let Some(descriptor) = queue.pop_front() {
            if !reachable.insert(descriptor.digest.clone()) {
                continue;
            }
            if !oci::is_branch(&descriptor.media_type) {
                continue;
            }
            let Some(payload) = self.read_all(&descriptor.digest).await? else {
                warn!(digest = %descriptor.digest, "named manifest is missing from the store");
                continue;
            };
            match oci::successors(&descriptor.media_type, &payload) {
                Ok(children) => queue.extend(children),
                Err(e) => warn!(
                    digest = %descriptor.digest,
                    error = %e,
                    "cannot parse manifest during GC; children left unmarked"
                ),
            }
        }
        Ok(reachable)
    }
}

#[async_trait]
impl<S: BlobStore> ContentCache for StoreCache<S> {
    async fn exists(&self, key: &Digest) -> CacheResult<bool> {
        Ok(self.store.exists(key).await?)
    }

    async fn get(&self, key: &Digest) -> CacheResult<ByteReader> {
        self.store
            .open(key)
            .await?
            .ok_or_else(|| CacheError::not_found(key))
    }

    async fn put(
        &self,
        key: Option<Digest>,
        size: Option<u64>,
        mut reader: ByteReader,
    ) -> CacheResult<Digest> {
        let staged = self.store.stage().await?;
        let mut writer = staged.writer().map_err(|source| CacheError::Io {
            context: "open staged blob",
            source,
        })?;

        let mut hasher = DigestHasher::new();
        copy_hashing(&mut reader, &mut writer, &mut hasher, "write staged blob").await?;
        drop(writer);

        let written = hasher.bytes();
        if written == 0 {
            return Err(CacheError::EmptyContent);
        }
        let actual = hasher.finish();

        if let Some(expected) = key {
            if expected != actual {
                warn!(expected = %expected, actual = %actual, "rejecting blob with mismatched digest");
                return Err(CacheError::KeyMismatch { expected, actual });
            }
        }
        if let Some(expected) = size.filter(|s| *s > 0) {
            if expected != written {
                warn!(digest = %actual, expected, actual = written, "rejecting blob with mismatched size");
                return Err(CacheError::SizeMismatch {
                    digest: actual,
                    expected,
                    actual: written,
                });
            }
        }

        self.store.commit(staged, &actual).await?;
        self.store.save_index().await?;
        debug!(digest = %actual, size = written, "stored blob");
        Ok(actual)
    }

    async fn delete(&self, key: &Digest) -> CacheResult<()> {
        for (name, descriptor) in self.store.tags().await? {
            if descriptor.digest == *key {
                self.store.untag(&name).await?;
                debug!(name = %name, digest = %key, "removed name of deleted blob");
            }
        }
        if self.store.delete(key).await?.is_some() {
            debug!(digest = %key, "deleted blob");
        }
        self.store.save_index().await?;
        Ok(())
    }

    async fn name(&self, key: &Digest, alias: &str) -> CacheResult<()> {
        let Some(size) = self.store.size(key).await? else {
            return Err(CacheError::not_found(key));
        };
        let media_type = self.media_type_of(key, size).await?;
        self.store
            .tag(alias, Descriptor::new(media_type, key.clone(), size))
            .await?;
        self.store.save_index().await?;
        debug!(alias = %alias, digest = %key, "named blob");
        Ok(())
    }

    async fn unname(&self, alias: &str) -> CacheResult<()> {
        if self.store.untag(alias).await?.is_some() {
            self.store.save_index().await?;
            debug!(alias = %alias, "removed name");
        }
        Ok(())
    }

    async fn resolve(&self, alias: &str) -> CacheResult<Digest> {
        self.store
            .resolve(alias)
            .await?
            .map(|descriptor| descriptor.digest)
            .ok_or_else(|| CacheError::not_found(alias))
    }

    async fn gc(&self) -> CacheResult<GcReport> {
        self.store.save_index().await?;
        let reachable = self.reachable().await?;

        let mut report = GcReport::default();
        for digest in self.store.digests().await? {
            if reachable.contains(&digest) {
                report.retained += 1;
                continue;
            }
            if let Some(freed) = self.store.delete(&digest).await? {
                debug!(digest = %digest, bytes = freed, "collected unreachable blob");
                report.removed += 1;
                report.reclaimed_bytes += freed;
            }
        }
        report.staging_removed = self.store.purge_staging().await?;

        info!(
            retained = report.retained,
            removed = report.removed,
            reclaimed_bytes = report.reclaimed_bytes,
            "garbage collection finished"
        );
        Ok(report)
    }
}
