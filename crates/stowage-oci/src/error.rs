//! Internal error types for registry operations.
//!
//! Mapped to [`stowage_core::DownloadError`] at the downloader boundary.

use stowage_core::Digest;
use thiserror::Error;

pub type OciResult<T> = Result<T, OciError>;

#[derive(Debug, Error)]
pub enum OciError {
    /// Registry answered with an unexpected status.
    #[error("registry request failed with status {status}: {url}")]
    Status { status: u16, url: String },

    /// Credentials were missing or rejected.
    #[error("registry denied access to {url}")]
    Unauthorized { url: String },

    /// `WWW-Authenticate` header was missing or could not be parsed.
    #[error("unusable authentication challenge: {message}")]
    InvalidChallenge { message: String },

    /// Token endpoint answered without a token.
    #[error("token response from {realm} carried no token")]
    MissingToken { realm: String },

    /// Fetched bytes do not hash to the expected digest.
    #[error("content of {expected} hashed to {actual}")]
    DigestMismatch { expected: Digest, actual: Digest },

    #[error("{digest}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        digest: Digest,
        expected: u64,
        actual: u64,
    },

    /// Manifest response was not a recognised manifest type.
    #[error("unsupported manifest media type '{media_type}'")]
    UnsupportedManifest { media_type: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl OciError {
    /// HTTP status behind the error, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized { .. } => Some(401),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when the registry served content that fails verification.
    pub const fn is_integrity(&self) -> bool {
        matches!(
            self,
            Self::DigestMismatch { .. }
                | Self::SizeMismatch { .. }
                | Self::UnsupportedManifest { .. }
                | Self::JsonParse(_)
        )
    }
}
