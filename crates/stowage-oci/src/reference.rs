//! Parsing of `oci://` locators into registry references.
//!
//! `oci://<registry>/<repository>[:<tag>|@<digest>]`; the tag defaults to
//! `latest`.

use std::fmt;

use stowage_core::{Digest, DownloadError, Locator};

pub const DEFAULT_TAG: &str = "latest";

/// Tag or digest selecting a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Tag(String),
    Digest(Digest),
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.write_str(tag),
            Self::Digest(digest) => write!(f, "{digest}"),
        }
    }
}

/// A manifest in a registry repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OciReference {
    /// `host[:port]`
    pub registry: String,
    pub repository: String,
    pub reference: Reference,
}

impl OciReference {
    pub fn from_locator(locator: &Locator) -> Result<Self, DownloadError> {
        let invalid = |reason: String| DownloadError::invalid_locator(locator.as_str(), reason);

        let registry = locator.authority();
        if registry.is_empty() {
            return Err(invalid("missing registry".into()));
        }

        let path = locator.url().path().trim_start_matches('/');
        let (repository, reference) = if let Some((repository, digest)) = path.split_once('@') {
            let digest = Digest::parse(digest).map_err(|e| invalid(e.to_string()))?;
            (repository, Reference::Digest(digest))
        } else {
            match path.rsplit_once(':') {
                Some((repository, tag)) if !tag.contains('/') => {
                    if tag.is_empty() {
                        return Err(invalid("empty tag".into()));
                    }
                    (repository, Reference::Tag(tag.to_string()))
                }
                _ => (path, Reference::Tag(DEFAULT_TAG.to_string())),
            }
        };

        if repository.is_empty() || repository.ends_with('/') {
            return Err(invalid(
                "expected oci://<registry>/<repository>[:<tag>|@<digest>]".into(),
            ));
        }

        Ok(Self {
            registry,
            repository: repository.to_string(),
            reference,
        })
    }
}

impl fmt::Display for OciReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reference {
            Reference::Tag(tag) => write!(f, "{}/{}:{tag}", self.registry, self.repository),
            Reference::Digest(digest) => {
                write!(f, "{}/{}@{digest}", self.registry, self.repository)
            }
        }
    }
}
