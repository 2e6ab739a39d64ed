//! Downloader port definitions.
//!
//! A downloader turns one locator into an ordered list of content items, root
//! first. The factory selects a downloader for a request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ContentItem, ContentRequest, CredentialsError, LocatorError};

/// Error type for download operations.
///
/// Carries strings rather than transport errors so that adapters can map it
/// without depending on any HTTP client.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DownloadError {
    /// The locator's scheme has no registered downloader.
    #[error("unsupported scheme '{scheme}'")]
    UnsupportedScheme {
        /// The offending scheme.
        scheme: String,
    },

    /// The locator could not be interpreted by its downloader.
    #[error("invalid locator '{locator}': {reason}")]
    InvalidLocator {
        /// The locator as supplied.
        locator: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Credentials were supplied in an unusable form.
    #[error("invalid credentials: {reason}")]
    InvalidCredentials {
        /// Why they were rejected.
        reason: String,
    },

    /// Reaching or reading from the remote source failed.
    #[error("{operation} {origin} failed: {message}")]
    Upstream {
        /// Remote resource (URL, repository or registry reference).
        origin: String,
        /// What was being attempted, e.g. "fetch manifest".
        operation: String,
        /// Detailed error message.
        message: String,
        /// HTTP status code if available.
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
    },

    /// A manifest or index in a content graph was malformed or did not
    /// match its descriptor.
    #[error("graph integrity error at {node}: {message}")]
    GraphIntegrity {
        /// Digest or reference of the offending node.
        node: String,
        /// Detailed error message.
        message: String,
    },
}

impl DownloadError {
    /// Create an upstream error.
    pub fn upstream(
        origin: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            origin: origin.into(),
            operation: operation.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create an upstream error for an unexpected HTTP status.
    pub fn upstream_status(
        origin: impl Into<String>,
        operation: impl Into<String>,
        status: u16,
    ) -> Self {
        Self::Upstream {
            origin: origin.into(),
            operation: operation.into(),
            message: format!("unexpected status {status}"),
            status: Some(status),
        }
    }

    pub fn invalid_locator(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLocator {
            locator: locator.into(),
            reason: reason.into(),
        }
    }

    pub fn graph(node: impl ToString, message: impl Into<String>) -> Self {
        Self::GraphIntegrity {
            node: node.to_string(),
            message: message.into(),
        }
    }

    /// True when the caller's input was at fault.
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedScheme { .. }
                | Self::InvalidLocator { .. }
                | Self::InvalidCredentials { .. }
        )
    }
}

impl From<LocatorError> for DownloadError {
    fn from(err: LocatorError) -> Self {
        match err {
            LocatorError::UnsupportedScheme { scheme } => Self::UnsupportedScheme { scheme },
            LocatorError::Malformed { locator, reason } => Self::InvalidLocator { locator, reason },
        }
    }
}

impl From<CredentialsError> for DownloadError {
    fn from(err: CredentialsError) -> Self {
        Self::InvalidCredentials {
            reason: err.to_string(),
        }
    }
}

/// A protocol-specific strategy producing the items behind one locator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetch everything needed to satisfy the locator, root first.
    ///
    /// Either every item is returned or the call fails; partial graphs are
    /// never returned.
    async fn download(&self) -> Result<Vec<ContentItem>, DownloadError>;
}

/// Selects a downloader for a request by locator scheme.
#[cfg_attr(test, mockall::automock)]
pub trait DownloaderFactory: Send + Sync {
    fn downloader(&self, request: &ContentRequest) -> Result<Box<dyn Downloader>, DownloadError>;
}
