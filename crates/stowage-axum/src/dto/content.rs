use serde::{Deserialize, Serialize};

/// Body of an Ensure request.
///
/// `credentials` is a bearer token, or base64 `user:pass` when
/// `credentialsType` is `basic`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ContentSource {
    pub url: String,
    #[serde(default)]
    pub credentials: Option<String>,
    #[serde(default, rename = "credentialsType")]
    pub credentials_type: Option<String>,
}

/// A locator and the root digest it resolves to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ContentResponse {
    pub url: String,
    pub digest: String,
}
