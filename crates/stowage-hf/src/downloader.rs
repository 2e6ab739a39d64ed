//! Model-hub downloader: one file per locator.

use std::sync::Arc;

use async_trait::async_trait;
use stowage_core::{ContentItem, Credentials, DownloadError, Downloader, Locator};
use tracing::debug;

use crate::client::HfClient;
use crate::error::HfError;
use crate::http::HttpBackend;
use crate::target::HfTarget;

/// Fetches a single Hub file, keyed by its LFS hash when the Hub publishes one.
pub struct HfDownloader<B: HttpBackend> {
    client: Arc<HfClient<B>>,
    target: HfTarget,
    credentials: Option<Credentials>,
}

impl<B: HttpBackend> HfDownloader<B> {
    pub fn new(
        client: Arc<HfClient<B>>,
        locator: &Locator,
        credentials: Option<Credentials>,
    ) -> Result<Self, DownloadError> {
        Ok(Self {
            client,
            target: HfTarget::from_locator(locator)?,
            credentials,
        })
    }

    pub const fn target(&self) -> &HfTarget {
        &self.target
    }
}

#[async_trait]
impl<B: HttpBackend + 'static> Downloader for HfDownloader<B> {
    async fn download(&self) -> Result<Vec<ContentItem>, DownloadError> {
        let origin = self.target.repo.id();
        let auth = self.client.auth_for(self.credentials.as_ref());

        let resolved = self
            .client
            .resolve_file(&self.target, auth.as_ref())
            .await
            .map_err(|e| map_error(e, &origin, "fetch revision metadata"))?;
        debug!(
            url = %resolved.url,
            digest = ?resolved.digest.as_ref().map(ToString::to_string),
            size = ?resolved.size,
            "resolved hub file"
        );

        let reader = self
            .client
            .open_file(&resolved.url, auth.as_ref())
            .await
            .map_err(|e| map_error(e, &origin, "download file"))?;

        let item = match resolved.digest {
            Some(digest) => ContentItem::addressed(digest, resolved.size, reader),
            None => ContentItem {
                digest: None,
                size: resolved.size,
                reader,
            },
        };
        Ok(vec![item])
    }
}

fn map_error(err: HfError, origin: &str, operation: &str) -> DownloadError {
    match err {
        HfError::InvalidUrl(e) => DownloadError::invalid_locator(origin, e.to_string()),
        HfError::JsonParse(e) => {
            DownloadError::upstream(origin, operation, format!("invalid metadata: {e}"))
        }
        other => match other.status() {
            Some(status) => DownloadError::Upstream {
                origin: origin.to_string(),
                operation: operation.to_string(),
                message: other.to_string(),
                status: Some(status),
            },
            None => DownloadError::upstream(origin, operation, other.to_string()),
        },
    }
}
