//! Axum-specific error types and mappings.
//!
//! Maps pipeline, download and cache errors onto HTTP status codes and JSON
//! response bodies. Caller mistakes are 400, upstream failures are 502 and
//! corrupted content or local storage failures are 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use stowage_core::{CacheError, ContentError, CredentialsError, DownloadError};
use thiserror::Error;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (invalid input).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The remote source failed or could not be reached.
    #[error("Bad gateway: {message}")]
    BadGateway {
        message: String,
        upstream_status: Option<u16>,
    },

    /// Content did not match its declared digest or size.
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
    /// Stable error type discriminant for client-side handling
    #[serde(skip_serializing_if = "Option::is_none", rename = "type")]
    error_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "upstreamStatus")]
    upstream_status: Option<u16>,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, error_type, upstream_status) = match &self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, None, None),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, None, None),
            Self::BadGateway {
                upstream_status, ..
            } => (StatusCode::BAD_GATEWAY, Some("UPSTREAM"), *upstream_status),
            Self::Integrity(_) => (StatusCode::INTERNAL_SERVER_ERROR, Some("INTEGRITY"), None),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, None, None),
        };

        let message = match self {
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Integrity(msg)
            | Self::Internal(msg)
            | Self::BadGateway { message: msg, .. } => msg,
        };

        let body = ErrorBody {
            error: message,
            status: status.as_u16(),
            error_type,
            upstream_status,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<ContentError> for HttpError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Download(e) => e.into(),
            ContentError::Cache(e) => e.into(),
            e @ ContentError::NothingDownloaded { .. } => Self::BadGateway {
                message: e.to_string(),
                upstream_status: None,
            },
        }
    }
}

impl From<DownloadError> for HttpError {
    fn from(err: DownloadError) -> Self {
        if err.is_client_error() {
            return Self::BadRequest(err.to_string());
        }
        match err {
            DownloadError::Upstream { status, .. } => Self::BadGateway {
                message: err.to_string(),
                upstream_status: status,
            },
            other => Self::Integrity(other.to_string()),
        }
    }
}

impl From<CacheError> for HttpError {
    fn from(err: CacheError) -> Self {
        if err.is_integrity() {
            return Self::Integrity(err.to_string());
        }
        match err {
            CacheError::NotFound { key } => Self::NotFound(format!("content not found: {key}")),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<CredentialsError> for HttpError {
    fn from(err: CredentialsError) -> Self {
        Self::BadRequest(format!("invalid credentials: {err}"))
    }
}
