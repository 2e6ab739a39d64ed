//! Parsing of `hf://` / `huggingface://` locators.
//!
//! `hf://<owner>/<name>[@<revision>]/<path/to/file>`; the revision defaults
//! to `main`.

use stowage_core::{DownloadError, Locator};

use crate::models::HfRepoRef;

pub const DEFAULT_REVISION: &str = "main";

const EXPECTED_FORM: &str = "expected hf://<owner>/<repo>[@<revision>]/<file>";

/// The file a model-hub locator points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HfTarget {
    pub repo: HfRepoRef,
    pub revision: String,
    /// Path of the file inside the repository; may contain `/`.
    pub file: String,
}

impl HfTarget {
    pub fn from_locator(locator: &Locator) -> Result<Self, DownloadError> {
        let invalid = |reason: &str| DownloadError::invalid_locator(locator.as_str(), reason);
        let decode = |segment: &str| {
            urlencoding::decode(segment)
                .map(std::borrow::Cow::into_owned)
                .map_err(|_| invalid("path is not valid UTF-8"))
        };

        let owner = decode(locator.url().host_str().unwrap_or_default())?;
        let segments = locator
            .url()
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .map(decode)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        if owner.is_empty() || segments.len() < 2 {
            return Err(invalid(EXPECTED_FORM));
        }

        let (name, revision) = match segments[0].split_once('@') {
            Some((name, revision)) if !name.is_empty() && !revision.is_empty() => {
                (name.to_string(), revision.to_string())
            }
            Some(_) => return Err(invalid(EXPECTED_FORM)),
            None => (segments[0].clone(), DEFAULT_REVISION.to_string()),
        };

        Ok(Self {
            repo: HfRepoRef::new(owner, name),
            revision,
            file: segments[1..].join("/"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(raw: &str) -> Result<HfTarget, DownloadError> {
        HfTarget::from_locator(&Locator::parse(raw).unwrap())
    }

    #[test]
    fn test_simple_locator() {
        let t = target("hf://org/model/config.json").unwrap();
        assert_eq!(t.repo, HfRepoRef::new("org", "model"));
        assert_eq!(t.revision, "main");
        assert_eq!(t.file, "config.json");
    }

    #[test]
    fn test_long_scheme_revision_and_nested_file() {
        let t = target("huggingface://Org/Model-7B@v1.0/onnx/model.onnx").unwrap();
        assert_eq!(t.repo.id(), "Org/Model-7B");
        assert_eq!(t.revision, "v1.0");
        assert_eq!(t.file, "onnx/model.onnx");
    }

    #[test]
    fn test_percent_encoded_file() {
        let t = target("hf://org/model/my%20file.txt").unwrap();
        assert_eq!(t.file, "my file.txt");
    }

    #[test]
    fn test_missing_file_is_invalid() {
        for raw in ["hf://org/model", "hf://org/model/", "hf://org/model@/file"] {
            assert!(
                matches!(target(raw), Err(DownloadError::InvalidLocator { .. })),
                "{raw}"
            );
        }
    }
}
