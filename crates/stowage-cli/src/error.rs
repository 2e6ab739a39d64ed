//! CLI-specific error types and mappings.
//!
//! Maps pipeline errors to exit codes and user-facing messages.

use stowage_core::{CacheError, ContentError, CredentialsError, DownloadError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument or locator error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Lookup miss.
    #[error("Not cached: {0}")]
    NotFound(String),

    /// The remote source failed or could not be reached.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Content did not match its declared digest or size.
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Local cache I/O failed.
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CliError {
    /// Map error to an exit code.
    ///
    /// Exit codes follow sysexits.h where one fits:
    /// - 1: General error (lookup miss)
    /// - 2: Invalid arguments
    /// - 65: Data error (integrity)
    /// - 69: Service unavailable (upstream)
    /// - 74: IO error
    /// - 78: Configuration error
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::NotFound(_) => 1,
            Self::Arguments(_) => 2,   // EX_USAGE
            Self::Integrity(_) => 65,  // EX_DATAERR
            Self::Upstream(_) => 69,   // EX_UNAVAILABLE
            Self::Io(_) => 74,         // EX_IOERR
            Self::Config(_) => 78,     // EX_CONFIG
        }
    }
}

impl From<ContentError> for CliError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Download(e) => e.into(),
            ContentError::Cache(e) => e.into(),
            e @ ContentError::NothingDownloaded { .. } => Self::Upstream(e.to_string()),
        }
    }
}

impl From<DownloadError> for CliError {
    fn from(err: DownloadError) -> Self {
        if err.is_client_error() {
            return Self::Arguments(err.to_string());
        }
        match err {
            DownloadError::Upstream { .. } => Self::Upstream(err.to_string()),
            other => Self::Integrity(other.to_string()),
        }
    }
}

impl From<CacheError> for CliError {
    fn from(err: CacheError) -> Self {
        if err.is_integrity() {
            return Self::Integrity(err.to_string());
        }
        match err {
            CacheError::NotFound { key } => Self::NotFound(key),
            other => Self::Io(other.to_string()),
        }
    }
}

impl From<CredentialsError> for CliError {
    fn from(err: CredentialsError) -> Self {
        Self::Arguments(format!("invalid credentials: {err}"))
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Exit code for an error returned from `main`.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<CliError>().map_or(1, CliError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_errors_map_to_exit_codes() {
        let err: CliError = DownloadError::UnsupportedScheme {
            scheme: "ftp".into(),
        }
        .into();
        assert_eq!(err.exit_code(), 2);

        let err: CliError = DownloadError::upstream_status("https://e.com", "GET", 500).into();
        assert_eq!(err.exit_code(), 69);

        let err: CliError = DownloadError::graph("sha256:00", "truncated").into();
        assert_eq!(err.exit_code(), 65);
    }

    #[test]
    fn test_cache_errors_map_to_exit_codes() {
        let err: CliError = ContentError::Cache(CacheError::EmptyContent).into();
        assert_eq!(err.exit_code(), 65);

        let err: CliError = CacheError::not_found("x").into();
        assert!(matches!(err, CliError::NotFound(ref key) if key == "x"));
    }

    #[test]
    fn test_broken_source_stream_is_unavailable() {
        let err: CliError = ContentError::Download(DownloadError::upstream(
            "https://e.com/big.bin",
            "read content",
            "connection reset by peer",
        ))
        .into();
        assert_eq!(err.exit_code(), 69);
        assert!(err.to_string().contains("https://e.com/big.bin"));
    }

    #[test]
    fn test_exit_code_for_anyhow() {
        let err = anyhow::Error::new(CliError::Config("bad".into()));
        assert_eq!(exit_code_for(&err), 78);
        assert_eq!(exit_code_for(&anyhow::anyhow!("other")), 1);
    }
}
