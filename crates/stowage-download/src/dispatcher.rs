//! Locator dispatcher: picks a downloader by scheme.

use std::sync::Arc;
use std::time::Duration;

use stowage_core::{
    ContentRequest, Credentials, DownloadError, Downloader, DownloaderFactory, Locator, Scheme,
};
use stowage_hf::{DefaultHfClient, HfClientConfig, HfDownloader};
use stowage_oci::{OciClientConfig, OciDownloader, RegistryClient};
use tracing::debug;

use crate::error::DispatcherError;
use crate::plain::PlainHttpDownloader;

/// Configuration for the clients behind each scheme.
///
/// # Example
///
/// ```
/// use stowage_download::DispatcherConfig;
/// use stowage_hf::HfClientConfig;
///
/// let config = DispatcherConfig::new()
///     .with_hf(HfClientConfig::new().with_token("hf_xxx"));
/// ```
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub(crate) hf: HfClientConfig,
    pub(crate) oci: OciClientConfig,
    /// User agent for plain downloads
    pub(crate) user_agent: String,
    pub(crate) connect_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            hf: HfClientConfig::default(),
            oci: OciClientConfig::default(),
            user_agent: concat!("stowage/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl DispatcherConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_hf(mut self, hf: HfClientConfig) -> Self {
        self.hf = hf;
        self
    }

    #[must_use]
    pub fn with_oci(mut self, oci: OciClientConfig) -> Self {
        self.oci = oci;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Connect timeout for plain downloads. Bodies are not time-bounded.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Maps `http`/`https`, `oci` and `hf`/`huggingface` locators to their
/// downloaders. Clients are built once and shared by every downloader.
pub struct Dispatcher {
    http: reqwest::Client,
    hf: Arc<DefaultHfClient>,
    oci: Arc<RegistryClient>,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Result<Self, DispatcherError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent)
            .build()?;
        Ok(Self {
            http,
            hf: Arc::new(DefaultHfClient::new(&config.hf)?),
            oci: Arc::new(RegistryClient::new(config.oci)?),
        })
    }

    /// Build the downloader for a locator.
    pub fn dispatch(
        &self,
        locator: &str,
        credentials: Option<Credentials>,
    ) -> Result<Box<dyn Downloader>, DownloadError> {
        let locator = Locator::parse(locator)?;
        debug!(locator = %locator.as_str(), scheme = %locator.scheme(), "dispatching");

        Ok(match locator.scheme() {
            Scheme::Http | Scheme::Https => Box::new(PlainHttpDownloader::new(
                self.http.clone(),
                &locator,
                credentials,
            )),
            Scheme::Oci => Box::new(OciDownloader::new(
                Arc::clone(&self.oci),
                &locator,
                credentials,
            )?),
            Scheme::HuggingFace => Box::new(HfDownloader::new(
                Arc::clone(&self.hf),
                &locator,
                credentials,
            )?),
        })
    }
}

impl DownloaderFactory for Dispatcher {
    fn downloader(&self, request: &ContentRequest) -> Result<Box<dyn Downloader>, DownloadError> {
        self.dispatch(&request.locator, request.credentials.clone())
    }
}
