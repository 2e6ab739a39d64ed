//! Serve command handler.

use anyhow::Result;
use stowage_axum::start_server;

use crate::bootstrap::{CliConfig, cors_config};

/// Run the HTTP control API until Ctrl-C.
pub async fn execute(config: &CliConfig, address: &str, cors_origins: &[String]) -> Result<()> {
    let server = config.server_config(address, cors_config(cors_origins));
    tracing::info!(
        cache_dir = %server.cache_dir.display(),
        address = %server.address,
        "starting stowage server"
    );
    start_server(server).await
}
