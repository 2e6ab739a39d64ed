//! Composition root for the HTTP server.
//!
//! Opens the on-disk cache, builds the dispatcher and wires both into a
//! `ContentService`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use stowage_core::paths::verify_writable;
use stowage_core::{ContentService, ensure_directory};
use stowage_download::{Dispatcher, DispatcherConfig};
use tokio::net::TcpListener;
use tracing::info;

/// Default listen address.
pub const DEFAULT_ADDRESS: &str = "localhost:8050";

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// No CORS headers; only same-origin and non-browser clients.
    #[default]
    Disabled,
    /// Allow all origins.
    AllowAll,
    /// Allow specific origins.
    AllowOrigins(Vec<String>),
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address, `host:port`.
    pub address: String,
    /// Root of the on-disk cache.
    pub cache_dir: PathBuf,
    /// Directory for spill files; the system temp dir when unset.
    pub spill_dir: Option<PathBuf>,
    /// Clients behind each locator scheme.
    pub dispatcher: DispatcherConfig,
    /// CORS configuration.
    pub cors: CorsConfig,
}

impl ServerConfig {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            cache_dir: cache_dir.into(),
            spill_dir: None,
            dispatcher: DispatcherConfig::default(),
            cors: CorsConfig::default(),
        }
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    #[must_use]
    pub fn with_spill_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.spill_dir = dir;
        self
    }

    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: DispatcherConfig) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    #[must_use]
    pub fn with_cors(mut self, cors: CorsConfig) -> Self {
        self.cors = cors;
        self
    }
}

/// Everything the handlers need.
pub struct AxumContext {
    pub content: Arc<ContentService>,
}

impl AxumContext {
    pub const fn new(content: Arc<ContentService>) -> Self {
        Self { content }
    }
}

/// Build the content service described by `config`.
pub async fn build_service(config: &ServerConfig) -> Result<ContentService> {
    ensure_directory(&config.cache_dir)?;
    verify_writable(&config.cache_dir)?;
    if let Some(spill) = &config.spill_dir {
        ensure_directory(spill)?;
    }

    let cache = stowage_store::open_cache(&config.cache_dir)
        .await
        .with_context(|| format!("opening cache at {}", config.cache_dir.display()))?;
    let dispatcher =
        Dispatcher::new(config.dispatcher.clone()).context("building downloader clients")?;

    Ok(ContentService::new(Arc::new(cache), Arc::new(dispatcher))
        .with_spill_dir(config.spill_dir.clone()))
}

/// Bootstrap the server context.
pub async fn bootstrap(config: &ServerConfig) -> Result<AxumContext> {
    let service = build_service(config).await?;
    info!(cache_dir = %config.cache_dir.display(), "content cache ready");
    Ok(AxumContext::new(Arc::new(service)))
}

/// Start the HTTP server and serve until Ctrl-C.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let ctx = bootstrap(&config).await?;
    let app = crate::routes::create_router(ctx, &config.cors);

    let listener = TcpListener::bind(&config.address)
        .await
        .with_context(|| format!("binding {}", config.address))?;
    info!("stowage listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("stowage stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler; run until the process is killed.
        std::future::pending::<()>().await;
    }
}
