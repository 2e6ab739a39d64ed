//! OCI content-graph downloader.
//!
//! Resolves the root manifest, then walks the graph breadth-first. Branches
//! (indexes and manifests) are fetched whole and verified; leaves are opened
//! as streams. Any failure aborts the download, so a partial graph is never
//! returned.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use stowage_core::domain::oci::{is_branch, successors};
use stowage_core::{
    ContentItem, Credentials, Descriptor, DownloadError, Downloader, Locator, reader_from_bytes,
};
use tracing::debug;

use crate::client::{RegistryClient, verify};
use crate::error::OciError;
use crate::reference::OciReference;

pub struct OciDownloader {
    client: Arc<RegistryClient>,
    reference: OciReference,
    credentials: Option<Credentials>,
}

impl OciDownloader {
    pub fn new(
        client: Arc<RegistryClient>,
        locator: &Locator,
        credentials: Option<Credentials>,
    ) -> Result<Self, DownloadError> {
        Ok(Self {
            client,
            reference: OciReference::from_locator(locator)?,
            credentials,
        })
    }

    pub const fn reference(&self) -> &OciReference {
        &self.reference
    }
}

#[async_trait]
impl Downloader for OciDownloader {
    async fn download(&self) -> Result<Vec<ContentItem>, DownloadError> {
        let origin = self.reference.to_string();
        let repository = self
            .client
            .repository(&self.reference, self.credentials.clone())
            .map_err(|e| map_error(e, &origin, "open repository"))?;

        let (root, root_bytes) = repository
            .resolve(&self.reference.reference)
            .await
            .map_err(|e| map_error(e, &origin, "resolve reference"))?;

        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut frontier: VecDeque<(Descriptor, Option<Bytes>)> =
            VecDeque::from([(root, Some(root_bytes))]);

        while let Some((descriptor, prefetched)) = frontier.pop_front() {
            if !seen.insert(descriptor.digest.clone()) {
                continue;
            }
            let node = descriptor.digest.to_string();

            if is_branch(&descriptor.media_type) {
                let bytes = match prefetched {
                    Some(bytes) => {
                        verify(&descriptor, &bytes).map_err(|e| map_error(e, &node, "verify"))?;
                        bytes
                    }
                    None => repository
                        .fetch_manifest(&descriptor)
                        .await
                        .map_err(|e| map_error(e, &node, "fetch manifest"))?,
                };
                let children = successors(&descriptor.media_type, &bytes)
                    .map_err(|e| DownloadError::graph(&node, e.to_string()))?;
                debug!(node, children = children.len(), "expanded branch");
                frontier.extend(children.into_iter().map(|child| (child, None)));
                items.push(ContentItem::addressed(
                    descriptor.digest,
                    Some(descriptor.size),
                    reader_from_bytes(bytes),
                ));
            } else {
                // Opened now so a missing or forbidden blob fails the whole
                // download. Idle bodies wait while earlier items are stored.
                let reader = repository
                    .open_blob(&descriptor)
                    .await
                    .map_err(|e| map_error(e, &node, "fetch blob"))?;
                items.push(ContentItem::addressed(
                    descriptor.digest,
                    Some(descriptor.size),
                    reader,
                ));
            }
        }

        debug!(reference = %origin, items = items.len(), "walked content graph");
        Ok(items)
    }
}

fn map_error(err: OciError, origin: &str, operation: &str) -> DownloadError {
    if err.is_integrity() {
        return DownloadError::graph(origin, err.to_string());
    }
    match err {
        OciError::InvalidUrl(e) => DownloadError::invalid_locator(origin, e.to_string()),
        other => DownloadError::Upstream {
            origin: origin.to_string(),
            operation: operation.to_string(),
            status: other.status(),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OciClientConfig;
    use stowage_core::Digest;

    fn client() -> Arc<RegistryClient> {
        Arc::new(RegistryClient::new(OciClientConfig::new()).unwrap())
    }

    #[test]
    fn test_new_parses_reference() {
        let downloader = OciDownloader::new(
            client(),
            &Locator::parse("oci://registry.local/repo:tag").unwrap(),
            None,
        )
        .unwrap();
        assert_eq!(downloader.reference().to_string(), "registry.local/repo:tag");
    }

    #[test]
    fn test_new_rejects_bad_reference() {
        let result = OciDownloader::new(
            client(),
            &Locator::parse("oci://registry.local/").unwrap(),
            None,
        );
        assert!(matches!(result, Err(DownloadError::InvalidLocator { .. })));
    }

    #[test]
    fn test_map_error_classes() {
        let integrity = map_error(
            OciError::DigestMismatch {
                expected: Digest::of_bytes(b"a"),
                actual: Digest::of_bytes(b"b"),
            },
            "node",
            "fetch manifest",
        );
        assert!(matches!(integrity, DownloadError::GraphIntegrity { .. }));

        let upstream = map_error(
            OciError::Status {
                status: 404,
                url: "u".into(),
            },
            "r/x:1",
            "resolve reference",
        );
        assert!(matches!(
            upstream,
            DownloadError::Upstream { status: Some(404), ref operation, .. } if operation == "resolve reference"
        ));
    }
}
