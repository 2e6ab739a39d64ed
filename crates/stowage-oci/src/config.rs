//! Public configuration for the registry client.

use std::time::Duration;

/// Configuration for the OCI registry client.
///
/// # Example
///
/// ```
/// use stowage_oci::OciClientConfig;
///
/// let config = OciClientConfig::new().with_plain_http("localhost:5000");
/// assert!(config.is_plain_http("localhost:5000"));
/// ```
#[derive(Debug, Clone)]
pub struct OciClientConfig {
    /// Registries (`host[:port]`) reached over plain HTTP
    pub(crate) plain_http: Vec<String>,
    /// User agent string for HTTP requests
    pub(crate) user_agent: String,
    /// Timeout for manifest and token requests
    pub(crate) timeout: Duration,
    /// Connect timeout, applied to every request including blob streams
    pub(crate) connect_timeout: Duration,
}

impl Default for OciClientConfig {
    fn default() -> Self {
        Self {
            plain_http: Vec::new(),
            user_agent: concat!("stowage-oci/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl OciClientConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reach `registry` over plain HTTP instead of HTTPS.
    #[must_use]
    pub fn with_plain_http(mut self, registry: impl Into<String>) -> Self {
        self.plain_http.push(registry.into());
        self
    }

    /// Replace the plain-HTTP registry list.
    #[must_use]
    pub fn with_plain_http_registries(mut self, registries: Vec<String>) -> Self {
        self.plain_http = registries;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the manifest/token request timeout.
    ///
    /// Defaults to 30 seconds. Blob streams are bounded only by the connect
    /// timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn is_plain_http(&self, registry: &str) -> bool {
        self.plain_http.iter().any(|r| r.eq_ignore_ascii_case(registry))
    }

    pub(crate) fn scheme_for(&self, registry: &str) -> &'static str {
        if self.is_plain_http(registry) {
            "http"
        } else {
            "https"
        }
    }
}
