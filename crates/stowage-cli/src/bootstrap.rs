//! CLI bootstrap: the composition root.
//!
//! Resolves paths and client settings from the parsed arguments and builds
//! the `ContentService` the handlers delegate to.

use std::path::PathBuf;

use anyhow::Result;
use stowage_axum::bootstrap::{DEFAULT_ADDRESS, build_service};
use stowage_axum::{CorsConfig, ServerConfig};
use stowage_core::{ContentService, default_cache_dir};
use stowage_download::DispatcherConfig;
use stowage_hf::HfClientConfig;
use stowage_oci::OciClientConfig;

use crate::error::CliError;
use crate::parser::Cli;

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub cache_dir: PathBuf,
    pub spill_dir: Option<PathBuf>,
    pub hf_token: Option<String>,
    pub hf_endpoint: Option<String>,
    pub plain_http_registries: Vec<String>,
}

impl CliConfig {
    /// Resolve settings from the parsed command line.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let cache_dir = match &cli.cache_dir {
            Some(dir) => dir.clone(),
            None => default_cache_dir().map_err(|e| CliError::Config(e.to_string()))?,
        };
        Ok(Self {
            cache_dir,
            spill_dir: cli.spill_dir.clone(),
            hf_token: cli.hf_token.clone().filter(|t| !t.trim().is_empty()),
            hf_endpoint: cli.hf_endpoint.clone(),
            plain_http_registries: cli.plain_http_registries.clone(),
        })
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        let mut hf = HfClientConfig::new().with_optional_token(self.hf_token.clone());
        if let Some(endpoint) = &self.hf_endpoint {
            hf = hf.with_endpoint(endpoint.clone());
        }
        DispatcherConfig::new()
            .with_hf(hf)
            .with_oci(OciClientConfig::new().with_plain_http_registries(
                self.plain_http_registries.clone(),
            ))
    }

    pub fn server_config(&self, address: &str, cors: CorsConfig) -> ServerConfig {
        ServerConfig::new(&self.cache_dir)
            .with_address(address)
            .with_spill_dir(self.spill_dir.clone())
            .with_dispatcher(self.dispatcher_config())
            .with_cors(cors)
    }
}

/// Composed context for the cache subcommands.
pub struct CliContext {
    pub content: ContentService,
    pub cache_dir: PathBuf,
}

/// Open the cache and build the content service.
pub async fn bootstrap(config: &CliConfig) -> Result<CliContext> {
    let server = config.server_config(DEFAULT_ADDRESS, CorsConfig::Disabled);
    let content = build_service(&server).await?;
    Ok(CliContext {
        content,
        cache_dir: config.cache_dir.clone(),
    })
}

/// CORS policy from `--cors-origin` values.
pub fn cors_config(origins: &[String]) -> CorsConfig {
    if origins.is_empty() {
        CorsConfig::Disabled
    } else if origins.iter().any(|o| o == "*") {
        CorsConfig::AllowAll
    } else {
        CorsConfig::AllowOrigins(origins.to_vec())
    }
}
