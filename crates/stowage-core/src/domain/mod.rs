//! Domain types shared by every stowage crate.

pub mod content;
pub mod credentials;
pub mod digest;
pub mod locator;
pub mod oci;

pub use content::{
    ByteReader, ContentItem, ContentRequest, EnsureOutcome, reader_from_bytes, reader_from_stream,
};
pub use credentials::{Credentials, CredentialsError};
pub use digest::{Digest, DigestHasher, DigestParseError};
pub use locator::{Locator, LocatorError, Scheme};
pub use oci::{Descriptor, ImageIndex, ImageManifest};
