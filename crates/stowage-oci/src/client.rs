//! Distribution API client.
//!
//! [`RegistryClient`] holds the connection pool and configuration;
//! [`Repository`] is a per-download session that remembers the authorization
//! the registry accepted.

use std::io;

use bytes::Bytes;
use futures_util::TryStreamExt;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
use stowage_core::domain::oci::{MANIFEST_MEDIA_TYPES, sniff_media_type};
use stowage_core::{ByteReader, Credentials, Descriptor, Digest, reader_from_stream};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{Challenge, TokenResponse, parse_challenge};
use crate::config::OciClientConfig;
use crate::error::{OciError, OciResult};
use crate::reference::{OciReference, Reference};

const DOCKER_CONTENT_DIGEST: &str = "Docker-Content-Digest";

/// Shared registry client.
pub struct RegistryClient {
    http: reqwest::Client,
    config: OciClientConfig,
}

impl RegistryClient {
    pub fn new(config: OciClientConfig) -> OciResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { http, config })
    }

    /// Open a session on the repository named by `reference`.
    pub fn repository(
        &self,
        reference: &OciReference,
        credentials: Option<Credentials>,
    ) -> OciResult<Repository<'_>> {
        let base = Url::parse(&format!(
            "{}://{}/v2/{}/",
            self.config.scheme_for(&reference.registry),
            reference.registry,
            reference.repository
        ))?;
        Ok(Repository {
            client: self,
            base,
            name: reference.repository.clone(),
            credentials,
            authorization: Mutex::new(None),
        })
    }
}

/// Requests against one repository.
pub struct Repository<'a> {
    client: &'a RegistryClient,
    base: Url,
    name: String,
    credentials: Option<Credentials>,
    /// Authorization the registry accepted last.
    authorization: Mutex<Option<String>>,
}

impl Repository<'_> {
    /// Resolve a tag or digest to the root descriptor and its manifest bytes.
    ///
    /// The digest is computed from the body; a disagreeing
    /// `Docker-Content-Digest` header is an error.
    pub async fn resolve(&self, reference: &Reference) -> OciResult<(Descriptor, Bytes)> {
        let url = self.base.join(&format!("manifests/{reference}"))?;
        let response = self
            .send(&url, Some(&MANIFEST_MEDIA_TYPES.join(", ")), true)
            .await?;

        let declared = response
            .headers()
            .get(DOCKER_CONTENT_DIGEST)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| match Digest::parse(v) {
                Ok(digest) => Some(digest),
                Err(e) => {
                    warn!(url = %url, error = %e, "ignoring malformed Docker-Content-Digest");
                    None
                }
            });
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_string());

        let body = response.bytes().await?;
        let actual = Digest::of_bytes(&body);
        for expected in [declared, pinned(reference)].into_iter().flatten() {
            if expected != actual {
                return Err(OciError::DigestMismatch { expected, actual });
            }
        }

        let media_type = manifest_media_type(content_type.as_deref(), &body)?;
        debug!(url = %url, digest = %actual, media_type, "resolved manifest");
        Ok((Descriptor::new(media_type, actual, body.len() as u64), body))
    }

    /// Fetch and verify a child manifest.
    pub async fn fetch_manifest(&self, descriptor: &Descriptor) -> OciResult<Bytes> {
        let url = self.base.join(&format!("manifests/{}", descriptor.digest))?;
        let accept = format!(
            "{}, {}",
            descriptor.media_type,
            MANIFEST_MEDIA_TYPES.join(", ")
        );
        let body = self.send(&url, Some(&accept), true).await?.bytes().await?;
        verify(descriptor, &body)?;
        Ok(body)
    }

    /// Open a blob for streaming. Verification happens when the stream is
    /// stored.
    pub async fn open_blob(&self, descriptor: &Descriptor) -> OciResult<ByteReader> {
        let url = self.base.join(&format!("blobs/{}", descriptor.digest))?;
        let response = self.send(&url, None, false).await?;
        Ok(reader_from_stream(
            response.bytes_stream().map_err(io::Error::other),
        ))
    }

    /// GET with the session's authorization, answering one challenge.
    async fn send(
        &self,
        url: &Url,
        accept: Option<&str>,
        bounded: bool,
    ) -> OciResult<reqwest::Response> {
        let initial = self.initial_authorization().await;
        let response = self
            .request(url, accept, bounded, initial.as_deref())
            .send()
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response, url);
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let authorization = self.authorize(url, challenge.as_deref()).await?;

        let response = self
            .request(url, accept, bounded, Some(&authorization))
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(OciError::Unauthorized {
                url: url.to_string(),
            });
        }
        *self.authorization.lock().await = Some(authorization);
        check_status(response, url)
    }

    fn request(
        &self,
        url: &Url,
        accept: Option<&str>,
        bounded: bool,
        authorization: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let mut request = self.client.http.get(url.clone());
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        if let Some(authorization) = authorization {
            request = request.header(AUTHORIZATION, authorization);
        }
        if bounded {
            request = request.timeout(self.client.config.timeout);
        }
        request
    }

    async fn initial_authorization(&self) -> Option<String> {
        if let Some(cached) = self.authorization.lock().await.clone() {
            return Some(cached);
        }
        match &self.credentials {
            Some(credentials @ Credentials::Bearer(_)) => Some(credentials.authorization_header()),
            _ => None,
        }
    }

    async fn authorize(&self, url: &Url, challenge: Option<&str>) -> OciResult<String> {
        let header = challenge.ok_or_else(|| OciError::InvalidChallenge {
            message: "401 without WWW-Authenticate".to_string(),
        })?;
        let unauthorized = || OciError::Unauthorized {
            url: url.to_string(),
        };

        match parse_challenge(header) {
            Some(Challenge::Basic) => match &self.credentials {
                Some(credentials @ Credentials::Basic { .. }) => {
                    Ok(credentials.authorization_header())
                }
                _ => Err(unauthorized()),
            },
            Some(Challenge::Bearer {
                realm,
                service,
                scope,
            }) => {
                if matches!(self.credentials, Some(Credentials::Bearer(_))) {
                    return Err(unauthorized());
                }
                let token = self
                    .fetch_token(&realm, service.as_deref(), scope.as_deref())
                    .await?;
                Ok(format!("Bearer {token}"))
            }
            None => Err(OciError::InvalidChallenge {
                message: header.to_string(),
            }),
        }
    }

    async fn fetch_token(
        &self,
        realm: &str,
        service: Option<&str>,
        scope: Option<&str>,
    ) -> OciResult<String> {
        let default_scope = format!("repository:{}:pull", self.name);
        let mut url = Url::parse(realm)?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(service) = service {
                query.append_pair("service", service);
            }
            query.append_pair("scope", scope.unwrap_or(&default_scope));
        }
        debug!(realm, "requesting registry token");

        let mut request = self
            .client
            .http
            .get(url.clone())
            .timeout(self.client.config.timeout);
        if let Some(credentials @ Credentials::Basic { .. }) = &self.credentials {
            request = request.header(AUTHORIZATION, credentials.authorization_header());
        }

        let response = check_status(request.send().await?, &url)?;
        let body: TokenResponse = serde_json::from_slice(&response.bytes().await?)?;
        body.into_token().ok_or_else(|| OciError::MissingToken {
            realm: realm.to_string(),
        })
    }
}

fn pinned(reference: &Reference) -> Option<Digest> {
    match reference {
        Reference::Digest(digest) => Some(digest.clone()),
        Reference::Tag(_) => None,
    }
}

fn check_status(response: reqwest::Response, url: &Url) -> OciResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => OciError::Unauthorized {
            url: url.to_string(),
        },
        _ => OciError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        },
    })
}

/// Media type of a manifest response: the `Content-Type` when it names a
/// manifest type, else sniffed from the body.
fn manifest_media_type(content_type: Option<&str>, body: &[u8]) -> OciResult<&'static str> {
    if let Some(known) = content_type
        .and_then(|ct| MANIFEST_MEDIA_TYPES.iter().copied().find(|m| *m == ct))
    {
        return Ok(known);
    }
    sniff_media_type(body).ok_or_else(|| OciError::UnsupportedManifest {
        media_type: content_type.unwrap_or_default().to_string(),
    })
}

/// Check fetched bytes against their descriptor.
pub(crate) fn verify(descriptor: &Descriptor, body: &[u8]) -> OciResult<()> {
    let actual_size = body.len() as u64;
    if actual_size != descriptor.size {
        return Err(OciError::SizeMismatch {
            digest: descriptor.digest.clone(),
            expected: descriptor.size,
            actual: actual_size,
        });
    }
    let actual = Digest::of_bytes(body);
    if actual != descriptor.digest {
        return Err(OciError::DigestMismatch {
            expected: descriptor.digest.clone(),
            actual,
        });
    }
    Ok(())
}
