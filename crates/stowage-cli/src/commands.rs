//! Subcommands.

use clap::{Subcommand, ValueEnum};
use stowage_axum::bootstrap::DEFAULT_ADDRESS;

/// How `--credentials` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CredentialsType {
    /// Sent as `Authorization: Bearer <token>`
    Bearer,
    /// Base64 `user:pass`
    Basic,
}

impl CredentialsType {
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Bearer => "bearer",
            Self::Basic => "basic",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP control API
    Serve {
        /// Listen address
        #[arg(long, env = "STOWAGE_ADDRESS", default_value = DEFAULT_ADDRESS)]
        address: String,
        /// Allowed CORS origin (repeatable, `*` for any); CORS is off when absent
        #[arg(long = "cors-origin", value_name = "ORIGIN")]
        cors_origins: Vec<String>,
    },

    /// Cache a locator's content, downloading it on a miss
    Ensure {
        /// http(s)://, oci:// or hf:// locator
        locator: String,
        /// Bearer token, or base64 `user:pass` with `--credentials-type basic`
        #[arg(long, env = "STOWAGE_CREDENTIALS", hide_env_values = true)]
        credentials: Option<String>,
        #[arg(long = "credentials-type", value_enum, requires = "credentials")]
        credentials_type: Option<CredentialsType>,
    },

    /// Print the digest a locator is cached under
    Lookup {
        locator: String,
    },

    /// Remove a locator's content from the cache
    Evict {
        locator: String,
    },

    /// Delete blobs no longer reachable from any cached locator
    Gc,

    /// Print version information
    Version,
}
