//! The `stowage` command-line interface.
//!
//! `serve` runs the HTTP control API; `ensure`, `lookup`, `evict` and `gc`
//! operate on the cache directory in-process.
#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings
#[cfg(test)]
use axum as _;

// Used by main.rs binary
use dotenvy as _;
use tokio as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod parser;

// Re-export primary types for convenient access
pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;
