//! OCI / Docker manifest model.
//!
//! Only the fields needed to walk a content graph are modelled. Unknown fields
//! are ignored on input, so Docker manifest lists (which carry `platform`) and
//! OCI artifacts parse with the same types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::digest::Digest;

pub const OCI_IMAGE_INDEX: &str = "application/vnd.oci.image.index.v1+json";
pub const OCI_IMAGE_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
pub const DOCKER_MANIFEST_LIST: &str = "application/vnd.docker.distribution.manifest.list.v2+json";
pub const DOCKER_MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Annotation carrying a Name in an OCI layout `index.json`.
pub const REF_NAME_ANNOTATION: &str = "org.opencontainers.image.ref.name";

/// Media types that reference other blobs, in registry `Accept` order.
pub const MANIFEST_MEDIA_TYPES: [&str; 4] = [
    OCI_IMAGE_INDEX,
    OCI_IMAGE_MANIFEST,
    DOCKER_MANIFEST_LIST,
    DOCKER_MANIFEST_V2,
];

/// A typed pointer to a blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub media_type: String,
    pub digest: Digest,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

impl Descriptor {
    pub fn new(media_type: impl Into<String>, digest: Digest, size: u64) -> Self {
        Self {
            media_type: media_type.into(),
            digest,
            size,
            annotations: None,
        }
    }

    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.as_ref()?.get(key).map(String::as_str)
    }
}

/// OCI image index or Docker manifest list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageIndex {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub manifests: Vec<Descriptor>,
}

/// OCI image manifest or Docker manifest v2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageManifest {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    pub config: Descriptor,
    #[serde(default)]
    pub layers: Vec<Descriptor>,
}

/// True for media types whose payload lists child descriptors.
pub fn is_branch(media_type: &str) -> bool {
    MANIFEST_MEDIA_TYPES.contains(&media_type)
}

/// Children referenced by a blob of the given media type.
///
/// Indexes yield their manifests; manifests yield their layers followed by the
/// config. Leaves yield nothing.
pub fn successors(media_type: &str, payload: &[u8]) -> Result<Vec<Descriptor>, serde_json::Error> {
    match media_type {
        OCI_IMAGE_INDEX | DOCKER_MANIFEST_LIST => {
            let index: ImageIndex = serde_json::from_slice(payload)?;
            Ok(index.manifests)
        }
        OCI_IMAGE_MANIFEST | DOCKER_MANIFEST_V2 => {
            let manifest: ImageManifest = serde_json::from_slice(payload)?;
            let mut children = manifest.layers;
            children.push(manifest.config);
            Ok(children)
        }
        _ => Ok(Vec::new()),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Probe {
    media_type: Option<String>,
    manifests: Option<serde_json::Value>,
    config: Option<serde_json::Value>,
}

/// Guess the media type of a manifest-like JSON payload.
///
/// Uses the embedded `mediaType` when it names a manifest type, otherwise the
/// document shape. Returns `None` for anything that is not a manifest.
pub fn sniff_media_type(payload: &[u8]) -> Option<&'static str> {
    let probe: Probe = serde_json::from_slice(payload).ok()?;
    if let Some(declared) = probe.media_type.as_deref() {
        if let Some(known) = MANIFEST_MEDIA_TYPES.iter().copied().find(|m| *m == declared) {
            return Some(known);
        }
    }
    if probe.manifests.is_some() {
        Some(OCI_IMAGE_INDEX)
    } else if probe.config.is_some() {
        Some(OCI_IMAGE_MANIFEST)
    } else {
        None
    }
}
