//! HTTP request handlers.
//!
//! Handlers are thin wrappers that delegate to the `ContentService`.

pub mod content;
