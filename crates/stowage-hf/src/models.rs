//! Internal API types for the `HuggingFace` Hub.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

// ============================================================================
// Configuration (used internally, see config.rs for public config)
// ============================================================================

/// Internal configuration for the `HuggingFace` client.
#[derive(Debug, Clone)]
pub struct HfConfig {
    /// Hub endpoint (default: <https://huggingface.co>)
    pub endpoint: Url,
    /// Token used when a request has no credentials of its own
    pub token: Option<String>,
    /// Maximum number of retry attempts for transient errors (default: 3)
    pub max_retries: u8,
    /// Base delay for exponential backoff (default: 500ms)
    pub retry_base_delay: Duration,
    /// Timeout for metadata requests (default: 30s)
    pub timeout: Duration,
    /// Connect timeout for every request (default: 10s)
    pub connect_timeout: Duration,
    pub user_agent: String,
}

// ============================================================================
// Repository Reference
// ============================================================================

/// Reference to a `HuggingFace` repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HfRepoRef {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl HfRepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Full repository ID (`owner/name`).
    pub fn id(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

// ============================================================================
// Revision metadata
// ============================================================================

/// Response of `GET /api/models/{repo}/revision/{rev}?blobs=true`.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoInfo {
    /// Commit the revision resolved to.
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub siblings: Vec<Sibling>,
}

/// One file in a repository listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sibling {
    pub rfilename: String,
    /// Git blob ID (SHA-1); not a content address we can use.
    #[serde(default)]
    pub blob_id: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    /// Present for files tracked by large file storage.
    #[serde(default)]
    pub lfs: Option<LfsInfo>,
}

/// Large-file-storage pointer with the published SHA-256 of the content.
#[derive(Debug, Clone, Deserialize)]
pub struct LfsInfo {
    pub sha256: String,
    pub size: u64,
}

impl RepoInfo {
    pub fn find(&self, file: &str) -> Option<&Sibling> {
        self.siblings.iter().find(|s| s.rfilename == file)
    }
}
