//! Core services: the content cache over a blob store and the acquisition
//! pipeline that drives downloaders into it.

pub mod content;
pub mod hashing;
pub mod store_cache;

pub use content::{ContentError, ContentService};
pub use hashing::{Spilled, copy_hashing, spill_and_hash};
pub use store_cache::StoreCache;
