//! OCI registry support for stowage.
//!
//! Resolves `oci://registry/repository[:tag|@digest]` locators through the
//! distribution API and flattens the referenced content graph (index,
//! manifests, config and layers) into content items, root first.

#![deny(unused_crate_dependencies)]

mod auth;
mod client;
mod config;
mod downloader;
mod error;
mod reference;

pub use client::{RegistryClient, Repository};
pub use config::OciClientConfig;
pub use downloader::OciDownloader;
pub use error::{OciError, OciResult};
pub use reference::{DEFAULT_TAG, OciReference, Reference};

#[cfg(test)]
use axum as _;
