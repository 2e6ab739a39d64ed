//! `HuggingFace` client for fetching revision metadata and file content.

mod files;

pub use files::ResolvedFile;

use stowage_core::Credentials;
use url::Url;

use crate::config::HfClientConfig;
use crate::error::HfResult;
use crate::http::{HttpBackend, ReqwestBackend};
use crate::models::HfConfig;

// ============================================================================
// Type Aliases
// ============================================================================

/// Default `HuggingFace` client using the reqwest HTTP backend.
pub type DefaultHfClient = HfClient<ReqwestBackend>;

// ============================================================================
// Client
// ============================================================================

/// Client for the `HuggingFace` Hub.
///
/// Generic over an HTTP backend for testing. Use `DefaultHfClient` in
/// production code.
pub struct HfClient<B: HttpBackend> {
    pub(crate) backend: B,
    pub(crate) config: HfConfig,
}

impl DefaultHfClient {
    /// Create a new client with the given configuration.
    pub fn new(config: &HfClientConfig) -> HfResult<Self> {
        let internal_config = Self::to_internal_config(config)?;
        let backend = ReqwestBackend::new(&internal_config)?;
        Ok(Self {
            backend,
            config: internal_config,
        })
    }

    /// Create a new client with default configuration.
    pub fn default_client() -> HfResult<Self> {
        Self::new(&HfClientConfig::default())
    }

    fn to_internal_config(config: &HfClientConfig) -> HfResult<HfConfig> {
        Ok(HfConfig {
            endpoint: Url::parse(&config.endpoint)?,
            token: config.token.clone(),
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
            timeout: config.timeout,
            connect_timeout: config.connect_timeout,
            user_agent: config.user_agent.clone(),
        })
    }
}

impl<B: HttpBackend> HfClient<B> {
    /// Create a new client with a custom backend.
    #[cfg(test)]
    pub(crate) const fn with_backend(config: HfConfig, backend: B) -> Self {
        Self { backend, config }
    }

    /// Credentials for a request: the caller's, else the configured token.
    pub fn auth_for(&self, request: Option<&Credentials>) -> Option<Credentials> {
        request
            .cloned()
            .or_else(|| self.config.token.clone().map(Credentials::Bearer))
    }
}
