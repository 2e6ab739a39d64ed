//! On-disk documents of an OCI image layout.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stowage_core::domain::oci::{OCI_IMAGE_INDEX, REF_NAME_ANNOTATION};
use stowage_core::{Descriptor, ImageIndex, StoreError};

pub const LAYOUT_FILE: &str = "oci-layout";
pub const INDEX_FILE: &str = "index.json";
pub const BLOBS_DIR: &str = "blobs";
pub const INGEST_DIR: &str = "ingest";

pub const LAYOUT_VERSION: &str = "1.0.0";

/// Contents of the `oci-layout` marker file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutMarker {
    pub image_layout_version: String,
}

impl Default for LayoutMarker {
    fn default() -> Self {
        Self {
            image_layout_version: LAYOUT_VERSION.to_string(),
        }
    }
}

pub type NameIndex = BTreeMap<String, Descriptor>;

/// Parse `index.json` into names. Entries without a ref name are ignored.
pub fn decode_index(path: &Path, bytes: &[u8]) -> Result<NameIndex, StoreError> {
    let index: ImageIndex = serde_json::from_slice(bytes).map_err(|e| StoreError::Index {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut names = NameIndex::new();
    for mut descriptor in index.manifests {
        let Some(name) = descriptor
            .annotations
            .as_mut()
            .and_then(|annotations| annotations.remove(REF_NAME_ANNOTATION))
        else {
            continue;
        };
        if descriptor.annotations.as_ref().is_some_and(BTreeMap::is_empty) {
            descriptor.annotations = None;
        }
        names.insert(name, descriptor);
    }
    Ok(names)
}

/// Render names as an `index.json` document.
pub fn encode_index(path: &Path, names: &NameIndex) -> Result<Vec<u8>, StoreError> {
    let index = ImageIndex {
        schema_version: 2,
        media_type: Some(OCI_IMAGE_INDEX.to_string()),
        manifests: names
            .iter()
            .map(|(name, descriptor)| {
                descriptor
                    .clone()
                    .with_annotation(REF_NAME_ANNOTATION, name.clone())
            })
            .collect(),
    };
    serde_json::to_vec_pretty(&index).map_err(|e| StoreError::Index {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
