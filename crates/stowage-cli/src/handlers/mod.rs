//! Command handlers.
//!
//! Each handler is a thin wrapper: validate CLI input, call the
//! `ContentService`, print the result. Results go to stdout, logs to stderr.

pub mod evict;
pub mod ensure;
pub mod gc;
pub mod lookup;
pub mod serve;
pub mod version;
