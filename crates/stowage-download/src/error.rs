//! Errors raised while building the dispatcher's clients.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to build HuggingFace client: {0}")]
    Hf(#[from] stowage_hf::HfError),

    #[error("failed to build registry client: {0}")]
    Oci(#[from] stowage_oci::OciError),
}
