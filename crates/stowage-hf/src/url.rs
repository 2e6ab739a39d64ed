//! URL construction helpers for the `HuggingFace` Hub.
//!
//! Pure functions, so every request URL is built the same way.

use url::Url;

use crate::error::HfResult;
use crate::models::{HfConfig, HfRepoRef};

/// Percent-encode each `/`-separated segment of a repository path.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn join(config: &HfConfig, path: &str) -> HfResult<Url> {
    let base = config.endpoint.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{base}/{path}"))?)
}

/// `{endpoint}/api/models/{owner}/{name}/revision/{revision}?blobs=true`
///
/// `blobs=true` makes the Hub include sizes and LFS hashes in the listing.
pub fn build_revision_url(config: &HfConfig, repo: &HfRepoRef, revision: &str) -> HfResult<Url> {
    let mut url = join(
        config,
        &format!(
            "api/models/{}/{}/revision/{}",
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name),
            urlencoding::encode(revision)
        ),
    )?;
    url.set_query(Some("blobs=true"));
    Ok(url)
}

/// `{endpoint}/{owner}/{name}/resolve/{commit}/{file}`
pub fn build_resolve_url(
    config: &HfConfig,
    repo: &HfRepoRef,
    commit: &str,
    file: &str,
) -> HfResult<Url> {
    join(
        config,
        &format!(
            "{}/{}/resolve/{}/{}",
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name),
            urlencoding::encode(commit),
            encode_path(file)
        ),
    )
}

/// Try to extract a repository ID from a metadata or resolve path.
pub fn extract_repo_id_from_path(path: &str) -> Option<String> {
    let path = path.trim_start_matches('/');
    let rest = path.strip_prefix("api/models/").unwrap_or(path);
    let parts: Vec<&str> = rest.splitn(3, '/').collect();
    if parts.len() >= 2 && !parts[0].is_empty() && !parts[1].is_empty() {
        return Some(format!("{}/{}", parts[0], parts[1]));
    }
    None
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::Duration;

    pub fn test_config(endpoint: &str) -> HfConfig {
        HfConfig {
            endpoint: Url::parse(endpoint).unwrap(),
            token: None,
            max_retries: 0,
            retry_base_delay: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
            user_agent: "stowage-hf-test".to_string(),
        }
    }

    #[test]
    fn test_build_revision_url() {
        let config = test_config("https://huggingface.co");
        let url = build_revision_url(&config, &HfRepoRef::new("org", "model"), "main").unwrap();
        assert_eq!(
            url.as_str(),
            "https://huggingface.co/api/models/org/model/revision/main?blobs=true"
        );
    }

    #[test]
    fn test_build_revision_url_encodes_revision() {
        let config = test_config("http://127.0.0.1:8080/");
        let url =
            build_revision_url(&config, &HfRepoRef::new("org", "model"), "refs/pr/1").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/api/models/org/model/revision/refs%2Fpr%2F1?blobs=true"
        );
    }

    #[test]
    fn test_build_resolve_url_keeps_file_directories() {
        let config = test_config("https://huggingface.co");
        let url = build_resolve_url(
            &config,
            &HfRepoRef::new("org", "model"),
            "0123abcd",
            "onnx/model weights.onnx",
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://huggingface.co/org/model/resolve/0123abcd/onnx/model%20weights.onnx"
        );
    }

    #[test]
    fn test_extract_repo_id_from_path() {
        assert_eq!(
            extract_repo_id_from_path("/api/models/org/model/revision/main"),
            Some("org/model".to_string())
        );
        assert_eq!(
            extract_repo_id_from_path("/org/model/resolve/abc/config.json"),
            Some("org/model".to_string())
        );
        assert_eq!(extract_repo_id_from_path("/api/models/"), None);
        assert_eq!(extract_repo_id_from_path("/single"), None);
    }
}
