//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::commands::Commands;

/// Local content-addressable caching proxy.
#[derive(Debug, Parser)]
#[command(name = "stowage")]
#[command(about = "Cache web, model hub and OCI registry content locally")]
#[command(version = stowage_build_info::LONG_VERSION)]
pub struct Cli {
    /// Cache directory [default: <data dir>/stowage/cache]
    #[arg(long = "cache-dir", env = "STOWAGE_CACHE_DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Directory for temporary spill files [default: system temp dir]
    #[arg(long = "spill-dir", env = "STOWAGE_SPILL_DIR", global = true)]
    pub spill_dir: Option<PathBuf>,

    /// Model hub token used when a request carries no credentials
    #[arg(long = "hf-token", env = "HF_TOKEN", global = true, hide_env_values = true)]
    pub hf_token: Option<String>,

    /// Model hub endpoint
    #[arg(long = "hf-endpoint", env = "HF_ENDPOINT", global = true)]
    pub hf_endpoint: Option<String>,

    /// Registry reached over plain HTTP instead of HTTPS (repeatable)
    #[arg(long = "plain-http-registry", value_name = "HOST[:PORT]", global = true)]
    pub plain_http_registries: Vec<String>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}
