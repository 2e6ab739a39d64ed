//! Router configuration.

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::bootstrap::{AxumContext, CorsConfig};
use crate::handlers;
use crate::state::AppState;

fn build_cors_layer(config: &CorsConfig) -> Option<CorsLayer> {
    match config {
        CorsConfig::Disabled => None,
        CorsConfig::AllowAll => Some(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        ),
        CorsConfig::AllowOrigins(origins) => {
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            Some(
                CorsLayer::new()
                    .allow_origin(allowed)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
        }
    }
}

/// Content routes, without state applied.
///
/// The locator segment is a catch-all because standard base64 may contain `/`.
pub(crate) fn content_routes() -> Router<AppState> {
    Router::new()
        .route("/content", post(handlers::content::ensure))
        .route("/content/", post(handlers::content::ensure))
        .route(
            "/content/{*encoded}",
            get(handlers::content::lookup).delete(handlers::content::evict),
        )
}

/// Create the application router.
pub fn create_router(ctx: AxumContext, cors_config: &CorsConfig) -> Router {
    let state: AppState = Arc::new(ctx);

    let router = Router::new()
        .route("/health", get(health_check))
        .merge(content_routes().with_state(state))
        .layer(TraceLayer::new_for_http());

    match build_cors_layer(cors_config) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

async fn health_check() -> &'static str {
    "OK"
}
