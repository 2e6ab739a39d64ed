//! HTTP backend abstraction for the `HuggingFace` Hub.
//!
//! The production implementation uses reqwest with retry for metadata
//! requests. Content streams are opened once and never retried.

use std::io;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use serde::de::DeserializeOwned;
use stowage_core::{ByteReader, Credentials, reader_from_stream};
use tracing::debug;
use url::Url;

use crate::error::{HfError, HfResult};
use crate::models::HfConfig;
use crate::url::extract_repo_id_from_path;

// ============================================================================
// HTTP Backend Trait
// ============================================================================

/// Transport used by the client.
///
/// `auth` is the already-resolved credential for the request.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Fetch JSON from a URL and deserialize it.
    async fn get_json<T: DeserializeOwned + Send>(
        &self,
        url: &Url,
        auth: Option<&Credentials>,
    ) -> HfResult<T>;

    /// Open a streaming GET.
    async fn get_stream(&self, url: &Url, auth: Option<&Credentials>) -> HfResult<ByteReader>;
}

// ============================================================================
// Reqwest Backend
// ============================================================================

/// Upper bound on a single retry pause.
const MAX_RETRY_DELAY: std::time::Duration = std::time::Duration::from_secs(60);

/// Exponential backoff for retry `attempt` (1-based), capped at
/// [`MAX_RETRY_DELAY`].
fn backoff_delay(base_ms: u64, attempt: u8) -> std::time::Duration {
    let factor = 2u64
        .checked_pow(u32::from(attempt.saturating_sub(1)))
        .unwrap_or(u64::MAX);
    std::time::Duration::from_millis(base_ms.saturating_mul(factor)).min(MAX_RETRY_DELAY)
}

/// Production HTTP backend using reqwest.
///
/// Metadata requests use exponential backoff for transient server errors
/// (5xx) and network errors.
pub struct ReqwestBackend {
    client: reqwest::Client,
    max_retries: u8,
    retry_base_delay_ms: u64,
    timeout: std::time::Duration,
}

impl ReqwestBackend {
    /// Create a new reqwest backend with the given configuration.
    pub fn new(config: &HfConfig) -> HfResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            #[allow(clippy::cast_possible_truncation)] // Duration milliseconds won't exceed u64 in practice
            retry_base_delay_ms: config.retry_base_delay.as_millis() as u64,
            timeout: config.timeout,
        })
    }

    /// Build a request with optional authentication.
    fn build_request(&self, url: &Url, auth: Option<&Credentials>) -> reqwest::RequestBuilder {
        let mut request = self.client.get(url.as_str());
        if let Some(credentials) = auth {
            request = request.header("Authorization", credentials.authorization_header());
        }
        request
    }

    /// Fetch a URL with automatic retry for transient errors.
    async fn fetch_with_retry(
        &self,
        url: &Url,
        auth: Option<&Credentials>,
    ) -> HfResult<reqwest::Response> {
        let mut last_error: Option<HfError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.retry_base_delay_ms, attempt);
                debug!(url = %url, attempt, ?delay, "retrying metadata request");
                tokio::time::sleep(delay).await;
            }

            match self
                .build_request(url, auth)
                .timeout(self.timeout)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    // 5xx errors are retryable (server-side issues)
                    if status.is_server_error() && attempt < self.max_retries {
                        last_error = Some(HfError::ApiRequestFailed {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                        continue;
                    }

                    return Err(status_error(status.as_u16(), url));
                }
                Err(e) => {
                    // Network errors are retryable
                    if attempt < self.max_retries {
                        last_error = Some(e.into());
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(last_error.unwrap_or_else(|| HfError::InvalidResponse {
            message: "Unknown error during fetch".to_string(),
        }))
    }
}

/// Map a failure status to the most specific error.
fn status_error(status: u16, url: &Url) -> HfError {
    match (status, extract_repo_id_from_path(url.path())) {
        (404, Some(repo)) if url.path().starts_with("/api/models/") => {
            HfError::RepoNotFound { repo }
        }
        (401 | 403, Some(repo)) => HfError::AuthRequired { repo },
        _ => HfError::ApiRequestFailed {
            status,
            url: url.to_string(),
        },
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get_json<T: DeserializeOwned + Send>(
        &self,
        url: &Url,
        auth: Option<&Credentials>,
    ) -> HfResult<T> {
        let response = self.fetch_with_retry(url, auth).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_stream(&self, url: &Url, auth: Option<&Credentials>) -> HfResult<ByteReader> {
        let response = self.build_request(url, auth).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status.as_u16(), url));
        }
        Ok(reader_from_stream(
            response.bytes_stream().map_err(io::Error::other),
        ))
    }
}

// ============================================================================
// Fake Backend for Testing
// ============================================================================
