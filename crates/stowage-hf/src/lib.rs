//! `HuggingFace` Hub support for stowage.
//!
//! Resolves `hf://owner/repo[@revision]/path` locators against the Hub API,
//! pins them to a commit and streams the file. Files tracked by LFS are
//! keyed by their published SHA-256 so the cache can verify them.

#![deny(unused_crate_dependencies)]

mod client;
mod config;
mod downloader;
mod error;
mod http;
mod models;
mod target;
mod url;

pub use client::{DefaultHfClient, HfClient, ResolvedFile};
pub use config::{DEFAULT_ENDPOINT, HfClientConfig};
pub use downloader::HfDownloader;
pub use error::{HfError, HfResult};
pub use http::{HttpBackend, ReqwestBackend};
pub use models::{HfRepoRef, RepoInfo};
pub use target::{DEFAULT_REVISION, HfTarget};

