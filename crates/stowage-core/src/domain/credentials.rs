//! Upstream credentials attached to a content request.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Credential kinds accepted on the wire.
pub const CREDENTIALS_BASIC: &str = "basic";
pub const CREDENTIALS_BEARER: &str = "bearer";

/// Errors produced while decoding request credentials.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("unsupported credentials type '{0}' (expected 'basic' or 'bearer')")]
    UnsupportedType(String),

    #[error("basic credentials are not valid base64: {0}")]
    InvalidEncoding(String),

    #[error("basic credentials must decode to 'username:password'")]
    MissingSeparator,
}

/// Credentials forwarded to an upstream source.
///
/// `Debug` never prints secrets.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Opaque token sent as `Authorization: Bearer <token>`.
    Bearer(String),
    /// Username and password, decoded from the base64 `user:pass` wire form.
    Basic { username: String, password: String },
}

impl Credentials {
    /// Decode the `(credentials, credentialsType)` pair of a content request.
    ///
    /// An empty or absent credentials string means anonymous access. When the
    /// type is absent the credentials are treated as a bearer token.
    pub fn from_wire(
        credentials: Option<&str>,
        kind: Option<&str>,
    ) -> Result<Option<Self>, CredentialsError> {
        let Some(credentials) = credentials.map(str::trim).filter(|c| !c.is_empty()) else {
            return Ok(None);
        };

        let kind = kind
            .map(|k| k.trim().to_ascii_lowercase())
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| CREDENTIALS_BEARER.to_string());

        match kind.as_str() {
            CREDENTIALS_BEARER => Ok(Some(Self::Bearer(credentials.to_string()))),
            CREDENTIALS_BASIC => {
                let decoded = STANDARD
                    .decode(credentials)
                    .map_err(|e| CredentialsError::InvalidEncoding(e.to_string()))?;
                let decoded = String::from_utf8(decoded)
                    .map_err(|e| CredentialsError::InvalidEncoding(e.to_string()))?;
                let (username, password) = decoded
                    .split_once(':')
                    .ok_or(CredentialsError::MissingSeparator)?;
                Ok(Some(Self::Basic {
                    username: username.to_string(),
                    password: password.to_string(),
                }))
            }
            other => Err(CredentialsError::UnsupportedType(other.to_string())),
        }
    }

    /// Value for an HTTP `Authorization` header.
    pub fn authorization_header(&self) -> String {
        match self {
            Self::Bearer(token) => format!("Bearer {token}"),
            Self::Basic { username, password } => {
                format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
            }
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bearer(_) => CREDENTIALS_BEARER,
            Self::Basic { .. } => CREDENTIALS_BASIC,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_credentials_are_anonymous() {
        assert_eq!(Credentials::from_wire(None, None).unwrap(), None);
        assert_eq!(Credentials::from_wire(Some(""), Some("basic")).unwrap(), None);
    }

    #[test]
    fn test_bearer_passes_through() {
        let creds = Credentials::from_wire(Some("tok"), Some("bearer"))
            .unwrap()
            .unwrap();
        assert_eq!(creds, Credentials::Bearer("tok".into()));
        assert_eq!(creds.authorization_header(), "Bearer tok");
    }

    #[test]
    fn test_missing_type_defaults_to_bearer() {
        let creds = Credentials::from_wire(Some("tok"), None).unwrap().unwrap();
        assert_eq!(creds.kind(), "bearer");
    }

    #[test]
    fn test_basic_is_base64_decoded() {
        let wire = STANDARD.encode("alice:s3cr:et");
        let creds = Credentials::from_wire(Some(&wire), Some("Basic"))
            .unwrap()
            .unwrap();
        assert_eq!(
            creds,
            Credentials::Basic {
                username: "alice".into(),
                password: "s3cr:et".into(),
            }
        );
        assert_eq!(creds.authorization_header(), format!("Basic {wire}"));
    }

    #[test]
    fn test_basic_errors() {
        assert!(matches!(
            Credentials::from_wire(Some("%%%"), Some("basic")),
            Err(CredentialsError::InvalidEncoding(_))
        ));
        let no_colon = STANDARD.encode("alice");
        assert_eq!(
            Credentials::from_wire(Some(&no_colon), Some("basic")),
            Err(CredentialsError::MissingSeparator)
        );
        assert!(matches!(
            Credentials::from_wire(Some("x"), Some("digest")),
            Err(CredentialsError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let bearer = format!("{:?}", Credentials::Bearer("topsecret".into()));
        assert!(!bearer.contains("topsecret"));
        let basic = format!(
            "{:?}",
            Credentials::Basic {
                username: "alice".into(),
                password: "hunter2".into(),
            }
        );
        assert!(basic.contains("alice"));
        assert!(!basic.contains("hunter2"));
    }
}
