//! Internal error types for `HuggingFace` operations.
//!
//! Mapped to [`stowage_core::DownloadError`] at the downloader boundary.

use thiserror::Error;

/// Result type alias for `HuggingFace` operations.
pub type HfResult<T> = Result<T, HfError>;

/// Errors related to `HuggingFace` Hub operations.
#[derive(Debug, Error)]
pub enum HfError {
    /// Request failed with an HTTP error status.
    #[error("HuggingFace request failed with status {status}: {url}")]
    ApiRequestFailed {
        /// HTTP status code
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// API returned an invalid or unexpected response.
    #[error("Invalid response from HuggingFace API: {message}")]
    InvalidResponse {
        /// Description of what was invalid
        message: String,
    },

    /// The repository (or revision) does not exist.
    #[error("Repository '{repo}' not found on HuggingFace")]
    RepoNotFound {
        /// The repository ID that was not found
        repo: String,
    },

    /// The repository is gated or private and the token was missing or rejected.
    #[error("Repository '{repo}' requires authentication")]
    AuthRequired {
        /// The repository ID
        repo: String,
    },

    /// Network or HTTP client error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL construction error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl HfError {
    /// HTTP status behind the error, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiRequestFailed { status, .. } => Some(*status),
            Self::RepoNotFound { .. } => Some(404),
            Self::AuthRequired { .. } => Some(401),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            Self::InvalidResponse { .. } | Self::InvalidUrl(_) | Self::JsonParse(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_request_failed_error_message() {
        let error = HfError::ApiRequestFailed {
            status: 503,
            url: "https://huggingface.co/org/model/resolve/abc/config.json".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("resolve/abc"));
        assert_eq!(error.status(), Some(503));
    }

    #[test]
    fn test_repo_not_found_error_message() {
        let error = HfError::RepoNotFound {
            repo: "org/missing".to_string(),
        };
        assert!(error.to_string().contains("org/missing"));
        assert_eq!(error.status(), Some(404));
    }

    #[test]
    fn test_auth_required_status() {
        let error = HfError::AuthRequired {
            repo: "org/gated".to_string(),
        };
        assert_eq!(error.status(), Some(401));
    }

    #[test]
    fn test_invalid_response_has_no_status() {
        let error = HfError::InvalidResponse {
            message: "missing sha".to_string(),
        };
        assert!(error.status().is_none());
    }
}
