//! Plain stream downloader for `http`/`https` locators.

use std::io;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::header::AUTHORIZATION;
use stowage_core::{ContentItem, Credentials, DownloadError, Downloader, Locator, reader_from_stream};
use tracing::debug;
use url::Url;

/// Streams one URL. The item is unaddressed; the pipeline hashes it.
pub struct PlainHttpDownloader {
    http: reqwest::Client,
    url: Url,
    credentials: Option<Credentials>,
}

impl PlainHttpDownloader {
    pub fn new(http: reqwest::Client, locator: &Locator, credentials: Option<Credentials>) -> Self {
        Self {
            http,
            url: locator.url().clone(),
            credentials,
        }
    }
}

#[async_trait]
impl Downloader for PlainHttpDownloader {
    async fn download(&self) -> Result<Vec<ContentItem>, DownloadError> {
        let mut request = self.http.get(self.url.clone());
        if let Some(credentials) = &self.credentials {
            request = request.header(AUTHORIZATION, credentials.authorization_header());
        }

        let response = request
            .send()
            .await
            .map_err(|e| DownloadError::upstream(self.url.as_str(), "GET", e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::upstream_status(
                self.url.as_str(),
                "GET",
                status.as_u16(),
            ));
        }

        debug!(url = %self.url, content_length = ?response.content_length(), "streaming download");
        let reader = reader_from_stream(response.bytes_stream().map_err(io::Error::other));
        Ok(vec![ContentItem::unaddressed(reader)])
    }
}
