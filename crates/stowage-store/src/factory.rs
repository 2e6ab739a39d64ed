//! Composition helpers for building a content cache on the layout store.
//!
//! Construction only, no domain logic.

use std::path::PathBuf;

use stowage_core::{StoreCache, StoreError};

use crate::store::OciLayoutStore;

/// Content cache backed by an on-disk OCI layout.
pub type LayoutCache = StoreCache<OciLayoutStore>;

/// Open the layout at `root` and wrap it in a content cache.
pub async fn open_cache(root: impl Into<PathBuf>) -> Result<LayoutCache, StoreError> {
    let store = OciLayoutStore::open(root).await?;
    Ok(StoreCache::new(store))
}
