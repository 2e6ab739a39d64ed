//! Data Transfer Objects (DTOs) for the HTTP API contract.

pub mod content;

pub use content::{ContentResponse, ContentSource};
