//! Content handlers: Lookup, Ensure and Evict.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use stowage_core::{ContentRequest, Credentials};
use tracing::{debug, info};

use crate::dto::{ContentResponse, ContentSource};
use crate::error::HttpError;
use crate::state::AppState;

/// Decode the base64 locator carried in the request path.
///
/// Accepts the standard and URL-safe alphabets, padded or not.
pub fn decode_locator(encoded: &str) -> Result<String, HttpError> {
    let bytes = [STANDARD, URL_SAFE, STANDARD_NO_PAD, URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(encoded).ok())
        .ok_or_else(|| HttpError::BadRequest(format!("invalid base64 locator '{encoded}'")))?;
    let locator = String::from_utf8(bytes)
        .map_err(|_| HttpError::BadRequest("locator is not valid UTF-8".to_string()))?;
    if locator.is_empty() {
        return Err(HttpError::BadRequest("empty locator".to_string()));
    }
    Ok(locator)
}

/// Look up the digest a locator is named to.
pub async fn lookup(
    State(state): State<AppState>,
    Path(encoded): Path<String>,
) -> Result<Json<ContentResponse>, HttpError> {
    let locator = decode_locator(&encoded)?;
    match state.content.lookup(&locator).await? {
        Some(digest) => Ok(Json(ContentResponse {
            url: locator,
            digest: digest.to_string(),
        })),
        None => Err(HttpError::NotFound(format!("content not found: {locator}"))),
    }
}

/// Remove a locator's content. Succeeds whether or not it was cached.
pub async fn evict(
    State(state): State<AppState>,
    Path(encoded): Path<String>,
) -> Result<StatusCode, HttpError> {
    let locator = decode_locator(&encoded)?;
    let removed = state.content.evict(&locator).await?;
    debug!(%locator, removed, "evict");
    Ok(StatusCode::OK)
}

/// Make a locator's content present, downloading it on a miss.
///
/// The body is parsed by hand so malformed JSON is a plain 400.
pub async fn ensure(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ContentResponse>, HttpError> {
    let source: ContentSource = serde_json::from_slice(&body)
        .map_err(|e| HttpError::BadRequest(format!("invalid request body: {e}")))?;
    if source.url.trim().is_empty() {
        return Err(HttpError::BadRequest("url is required".to_string()));
    }

    let credentials = Credentials::from_wire(
        source.credentials.as_deref(),
        source.credentials_type.as_deref(),
    )?;
    let request = ContentRequest::new(source.url.clone()).with_credentials(credentials);
    let outcome = state.content.ensure(&request).await?;

    info!(
        url = %source.url,
        digest = %outcome.digest,
        cached = outcome.cached,
        stored = outcome.stored,
        "ensure"
    );
    Ok(Json(ContentResponse {
        url: source.url,
        digest: outcome.digest.to_string(),
    }))
}
