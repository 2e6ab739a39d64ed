//! Disk-backed [`BlobStore`] using the OCI image layout.
//!
//! ```text
//! <root>/
//!   oci-layout
//!   index.json          names, one descriptor each
//!   blobs/sha256/<hex>  immutable blobs
//!   ingest/             staging files, renamed into blobs/ on commit
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use stowage_core::{BlobStore, ByteReader, Descriptor, Digest, StagedBlob, StoreError};
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::layout::{
    BLOBS_DIR, INDEX_FILE, INGEST_DIR, LAYOUT_FILE, LayoutMarker, NameIndex, decode_index,
    encode_index,
};

/// Staging files older than this are considered abandoned.
pub const DEFAULT_STAGING_TTL: Duration = Duration::from_secs(60 * 60);

/// Blob store rooted at an OCI image layout directory.
pub struct OciLayoutStore {
    root: PathBuf,
    names: Mutex<NameIndex>,
    staging_ttl: Duration,
}

impl OciLayoutStore {
    /// Open (creating if needed) a layout at `root` and load its index.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();

        for dir in [root.join(BLOBS_DIR), root.join(INGEST_DIR)] {
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| StoreError::io("create directory", &dir, e))?;
        }

        let marker_path = root.join(LAYOUT_FILE);
        match fs::read(&marker_path).await {
            Ok(bytes) => {
                let marker: LayoutMarker =
                    serde_json::from_slice(&bytes).map_err(|e| StoreError::Index {
                        path: marker_path.clone(),
                        message: e.to_string(),
                    })?;
                debug!(version = %marker.image_layout_version, "opened existing layout");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let bytes = serde_json::to_vec(&LayoutMarker::default()).map_err(|e| {
                    StoreError::Index {
                        path: marker_path.clone(),
                        message: e.to_string(),
                    }
                })?;
                fs::write(&marker_path, bytes)
                    .await
                    .map_err(|e| StoreError::io("write", &marker_path, e))?;
            }
            Err(e) => return Err(StoreError::io("read", &marker_path, e)),
        }

        let index_path = root.join(INDEX_FILE);
        let names = match fs::read(&index_path).await {
            Ok(bytes) => decode_index(&index_path, &bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => NameIndex::new(),
            Err(e) => return Err(StoreError::io("read", &index_path, e)),
        };
        debug!(root = %root.display(), names = names.len(), "blob store ready");

        Ok(Self {
            root,
            names: Mutex::new(names),
            staging_ttl: DEFAULT_STAGING_TTL,
        })
    }

    /// Override how old a staging file must be before `purge_staging` removes it.
    #[must_use]
    pub const fn with_staging_ttl(mut self, ttl: Duration) -> Self {
        self.staging_ttl = ttl;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ingest_dir(&self) -> PathBuf {
        self.root.join(INGEST_DIR)
    }

    async fn list_dir(path: &Path) -> Result<Vec<fs::DirEntry>, StoreError> {
        let mut entries = Vec::new();
        let mut dir = match fs::read_dir(path).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(entries),
            Err(e) => return Err(StoreError::io("read directory", path, e)),
        };
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| StoreError::io("read directory", path, e))?
        {
            entries.push(entry);
        }
        Ok(entries)
    }
}

#[async_trait]
impl BlobStore for OciLayoutStore {
    async fn exists(&self, digest: &Digest) -> Result<bool, StoreError> {
        let path = digest.blob_path(&self.root);
        fs::try_exists(&path)
            .await
            .map_err(|e| StoreError::io("stat", &path, e))
    }

    async fn open(&self, digest: &Digest) -> Result<Option<ByteReader>, StoreError> {
        let path = digest.blob_path(&self.root);
        match fs::File::open(&path).await {
            Ok(file) => Ok(Some(Box::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io("open", &path, e)),
        }
    }

    async fn size(&self, digest: &Digest) -> Result<Option<u64>, StoreError> {
        let path = digest.blob_path(&self.root);
        match fs::metadata(&path).await {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io("stat", &path, e)),
        }
    }

    async fn stage(&self) -> Result<StagedBlob, StoreError> {
        let dir = self.ingest_dir();
        let file = blocking({
            let dir = dir.clone();
            move || NamedTempFile::new_in(dir)
        })
        .await
        .map_err(|e| StoreError::io("create staging file", &dir, e))?;
        Ok(StagedBlob::new(file))
    }

    async fn commit(&self, staged: StagedBlob, digest: &Digest) -> Result<(), StoreError> {
        let target = digest.blob_path(&self.root);
        if fs::try_exists(&target)
            .await
            .map_err(|e| StoreError::io("stat", &target, e))?
        {
            debug!(digest = %digest, "blob already present, discarding staged copy");
            return Ok(());
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io("create directory", parent, e))?;
        }
        let temp = staged.into_temp_file();
        blocking({
            let target = target.clone();
            move || temp.persist(target).map(drop).map_err(|e| e.error)
        })
        .await
        .map_err(|e| StoreError::io("commit blob", &target, e))?;
        Ok(())
    }

    async fn delete(&self, digest: &Digest) -> Result<Option<u64>, StoreError> {
        let path = digest.blob_path(&self.root);
        let Some(size) = self.size(digest).await? else {
            return Ok(None);
        };
        match fs::remove_file(&path).await {
            Ok(()) => Ok(Some(size)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io("remove", &path, e)),
        }
    }

    async fn digests(&self) -> Result<Vec<Digest>, StoreError> {
        let mut digests = Vec::new();
        for algorithm in Self::list_dir(&self.root.join(BLOBS_DIR)).await? {
            let Some(algorithm_name) = algorithm.file_name().to_str().map(str::to_string) else {
                continue;
            };
            for blob in Self::list_dir(&algorithm.path()).await? {
                let Some(hex) = blob.file_name().to_str().map(str::to_string) else {
                    continue;
                };
                match Digest::parse(&format!("{algorithm_name}:{hex}")) {
                    Ok(digest) => digests.push(digest),
                    Err(e) => warn!(path = %blob.path().display(), error = %e, "ignoring stray file in blobs"),
                }
            }
        }
        digests.sort();
        Ok(digests)
    }

    async fn tag(&self, name: &str, descriptor: Descriptor) -> Result<(), StoreError> {
        self.names.lock().await.insert(name.to_string(), descriptor);
        Ok(())
    }

    async fn untag(&self, name: &str) -> Result<Option<Descriptor>, StoreError> {
        Ok(self.names.lock().await.remove(name))
    }

    async fn resolve(&self, name: &str) -> Result<Option<Descriptor>, StoreError> {
        Ok(self.names.lock().await.get(name).cloned())
    }

    async fn tags(&self) -> Result<Vec<(String, Descriptor)>, StoreError> {
        Ok(self
            .names
            .lock()
            .await
            .iter()
            .map(|(name, descriptor)| (name.clone(), descriptor.clone()))
            .collect())
    }

    async fn save_index(&self) -> Result<(), StoreError> {
        let names = self.names.lock().await;
        let index_path = self.root.join(INDEX_FILE);
        let bytes = encode_index(&index_path, &names)?;

        let tmp_path = self.root.join(format!("{INDEX_FILE}.tmp"));
        fs::write(&tmp_path, bytes)
            .await
            .map_err(|e| StoreError::io("write", &tmp_path, e))?;
        fs::rename(&tmp_path, &index_path)
            .await
            .map_err(|e| StoreError::io("replace", &index_path, e))?;
        Ok(())
    }

    async fn purge_staging(&self) -> Result<usize, StoreError> {
        let now = SystemTime::now();
        let mut removed = 0;
        for entry in Self::list_dir(&self.ingest_dir()).await? {
            let path = entry.path();
            let modified = entry
                .metadata()
                .await
                .and_then(|meta| meta.modified())
                .map_err(|e| StoreError::io("stat", &path, e))?;
            let age = now.duration_since(modified).unwrap_or_default();
            if age < self.staging_ttl {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io("remove", &path, e)),
            }
        }
        Ok(removed)
    }
}

/// Run a blocking filesystem call off the async workers.
async fn blocking<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(io::Error::other)?
}
