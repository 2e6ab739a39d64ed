//! Locators: scheme-qualified strings naming a remote content source.
//!
//! The cache never interprets a locator; the raw string is the Name. Only the
//! dispatcher looks at the scheme and only the matching downloader looks at the
//! remainder.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

/// Errors produced while classifying a locator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocatorError {
    #[error("invalid locator '{locator}': {reason}")]
    Malformed { locator: String, reason: String },

    #[error("unsupported scheme '{scheme}'")]
    UnsupportedScheme { scheme: String },
}

/// Protocols with a registered downloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
    Oci,
    HuggingFace,
}

impl Scheme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Oci => "oci",
            Self::HuggingFace => "hf",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            "oci" => Ok(Self::Oci),
            "hf" | "huggingface" => Ok(Self::HuggingFace),
            _ => Err(LocatorError::UnsupportedScheme {
                scheme: s.to_string(),
            }),
        }
    }
}

/// A parsed locator. Keeps the raw string alongside the parsed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    raw: String,
    url: Url,
    scheme: Scheme,
}

impl Locator {
    pub fn parse(raw: &str) -> Result<Self, LocatorError> {
        let url = Url::parse(raw).map_err(|e| LocatorError::Malformed {
            locator: raw.to_string(),
            reason: e.to_string(),
        })?;
        let scheme = url.scheme().parse::<Scheme>()?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(LocatorError::Malformed {
                locator: raw.to_string(),
                reason: "missing host".to_string(),
            });
        }
        Ok(Self {
            raw: raw.to_string(),
            url,
            scheme,
        })
    }

    /// The locator exactly as the caller supplied it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub const fn url(&self) -> &Url {
        &self.url
    }

    pub const fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Host (plus `:port` when present) of the locator.
    pub fn authority(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
