//! Disk-backed blob store for stowage.
//!
//! Blobs, names and the persisted index live in a directory laid out as an OCI
//! image layout, so the cache directory can be inspected or copied with
//! standard OCI tooling.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

pub mod factory;
pub mod layout;
pub mod store;

pub use factory::{LayoutCache, open_cache};
pub use store::{DEFAULT_STAGING_TTL, OciLayoutStore};

