//! Revision metadata and file download.

use stowage_core::{ByteReader, Credentials, Digest};
use tracing::{debug, warn};
use url::Url;

use super::HfClient;
use crate::error::HfResult;
use crate::http::HttpBackend;
use crate::models::{HfRepoRef, RepoInfo};
use crate::target::HfTarget;
use crate::url::{build_resolve_url, build_revision_url};

/// Where to fetch a file and what the Hub says about its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub url: Url,
    /// Published SHA-256 for LFS files.
    pub digest: Option<Digest>,
    pub size: Option<u64>,
}

impl<B: HttpBackend> HfClient<B> {
    /// Fetch the file listing of a revision.
    pub async fn repo_info(
        &self,
        repo: &HfRepoRef,
        revision: &str,
        auth: Option<&Credentials>,
    ) -> HfResult<RepoInfo> {
        let url = build_revision_url(&self.config, repo, revision)?;
        debug!(repo = %repo.id(), revision, "fetching revision metadata");
        self.backend.get_json(&url, auth).await
    }

    /// Resolve a target to a download URL pinned to the revision's commit.
    pub async fn resolve_file(
        &self,
        target: &HfTarget,
        auth: Option<&Credentials>,
    ) -> HfResult<ResolvedFile> {
        let info = self.repo_info(&target.repo, &target.revision, auth).await?;
        let commit = info
            .sha
            .as_deref()
            .filter(|sha| !sha.is_empty())
            .unwrap_or(&target.revision);
        let url = build_resolve_url(&self.config, &target.repo, commit, &target.file)?;

        let (digest, size) = match info.find(&target.file) {
            Some(sibling) => match &sibling.lfs {
                Some(lfs) => match Digest::sha256_from_hex(&lfs.sha256) {
                    Ok(digest) => (Some(digest), Some(lfs.size)),
                    Err(e) => {
                        warn!(file = %target.file, error = %e, "ignoring malformed LFS hash");
                        (None, Some(lfs.size))
                    }
                },
                None => (None, sibling.size),
            },
            None => {
                debug!(file = %target.file, "file not listed, content will be hashed locally");
                (None, None)
            }
        };

        Ok(ResolvedFile { url, digest, size })
    }

    /// Open the content of a resolved file.
    pub async fn open_file(&self, url: &Url, auth: Option<&Credentials>) -> HfResult<ByteReader> {
        self.backend.get_stream(url, auth).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HfError;
    use crate::http::testing::{CannedResponse, FakeBackend};
    use crate::url::tests::test_config;
    use serde_json::json;

    fn target(file: &str) -> HfTarget {
        HfTarget {
            repo: HfRepoRef::new("org", "model"),
            revision: "main".into(),
            file: file.into(),
        }
    }

    fn listing() -> CannedResponse {
        CannedResponse::Json(json!({
            "sha": "c0ffee",
            "siblings": [
                {"rfilename": "config.json", "size": 17},
                {"rfilename": "model.bin", "size": 135,
                 "lfs": {"sha256": "AB".repeat(32), "size": 4096}},
                {"rfilename": "broken.bin", "lfs": {"sha256": "xyz", "size": 9}}
            ]
        }))
    }

    fn client() -> HfClient<FakeBackend> {
        HfClient::with_backend(
            test_config("https://hub.test"),
            FakeBackend::new().with_response("revision/main", listing()),
        )
    }

    #[tokio::test]
    async fn test_lfs_file_resolves_digest_and_size() {
        let resolved = client().resolve_file(&target("model.bin"), None).await.unwrap();
        assert_eq!(
            resolved.url.as_str(),
            "https://hub.test/org/model/resolve/c0ffee/model.bin"
        );
        assert_eq!(resolved.digest, Some(Digest::sha256_from_hex(&"ab".repeat(32)).unwrap()));
        assert_eq!(resolved.size, Some(4096));
    }

    #[tokio::test]
    async fn test_plain_file_has_size_only() {
        let resolved = client().resolve_file(&target("config.json"), None).await.unwrap();
        assert_eq!(resolved.digest, None);
        assert_eq!(resolved.size, Some(17));
    }

    #[tokio::test]
    async fn test_malformed_lfs_hash_is_ignored() {
        let resolved = client().resolve_file(&target("broken.bin"), None).await.unwrap();
        assert_eq!(resolved.digest, None);
        assert_eq!(resolved.size, Some(9));
    }

    #[tokio::test]
    async fn test_unlisted_file_falls_back_to_local_hashing() {
        let resolved = client().resolve_file(&target("other.txt"), None).await.unwrap();
        assert_eq!(resolved.digest, None);
        assert_eq!(resolved.size, None);
    }

    #[tokio::test]
    async fn test_missing_sha_uses_revision() {
        let client = HfClient::with_backend(
            test_config("https://hub.test"),
            FakeBackend::new()
                .with_response("revision/main", CannedResponse::Json(json!({"siblings": []}))),
        );
        let resolved = client.resolve_file(&target("a.txt"), None).await.unwrap();
        assert_eq!(resolved.url.as_str(), "https://hub.test/org/model/resolve/main/a.txt");
    }

    #[tokio::test]
    async fn test_unknown_repo() {
        let client = HfClient::with_backend(test_config("https://hub.test"), FakeBackend::new());
        let err = client.resolve_file(&target("a.txt"), None).await.unwrap_err();
        assert!(matches!(err, HfError::RepoNotFound { repo } if repo == "org/model"));
    }
}
