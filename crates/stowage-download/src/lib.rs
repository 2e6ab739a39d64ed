//! Downloaders for stowage.
//!
//! [`Dispatcher`] implements the core `DownloaderFactory` port: it parses a
//! locator, switches on its scheme and hands back the matching strategy.
//! Plain `http`/`https` downloads live here; model-hub and registry
//! downloads come from `stowage-hf` and `stowage-oci`.

#![deny(unused_crate_dependencies)]

mod dispatcher;
mod error;
mod plain;

pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use error::DispatcherError;
pub use plain::PlainHttpDownloader;

#[cfg(test)]
use {axum as _, serde_json as _, stowage_store as _, tempfile as _, tokio as _};
