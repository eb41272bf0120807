//! CRX package pipeline
//!
//! Fetches a browser-extension package, decodes its header, authenticates
//! legacy (version 2) packages and exposes the embedded ZIP payload as a
//! random-access [`CrxArchive`] without writing it to storage.
//!
//! # Trust model
//!
//! Only legacy packages carry an authenticity guarantee from this module:
//! the embedded RSA key must hash to the requested application id and must
//! have signed the payload. Current (version 3) packages are structurally
//! validated and their header block is skipped; their payload is handed
//! back unauthenticated. Use [`CrxArchive::is_authenticated`] to tell the
//! two apart.
//!
//! # Example
//!
//! ```no_run
//! use sth_pollen::crx::{CrxFetcher, UrlVariant};
//!
//! # fn example() -> Result<(), sth_pollen::crx::CrxError> {
//! let fetcher = CrxFetcher::with_defaults(UrlVariant::Legacy)?;
//! let mut archive = fetcher.fetch("ojjgnpkioondelmggbekfhllhdaimnho")?;
//! for entry in archive.entries()? {
//!     println!("{} ({} bytes)", entry.name, entry.size);
//! }
//! # Ok(())
//! # }
//! ```

mod archive;
mod fetch;
mod header;
mod reader;
mod update_url;
mod verify;

pub use archive::{ArchiveEntry, CrxArchive};
pub use fetch::{open_crx, CrxFetcher, HttpClient, ReqwestClient, DEFAULT_TIMEOUT};
pub use header::{
    parse_crx, CrxHeader, CrxVariant, CurrentHeader, LegacyHeader, ParsedCrx, CRX_MAGIC,
    CURRENT_VERSION, LEGACY_VERSION,
};
pub use reader::PayloadReader;
pub use update_url::{build_crx_url, build_crx_url_at, UrlVariant, DEFAULT_UPDATE_HOST, UPDATE_PATH};
pub use verify::{app_id_from_digest, app_id_from_public_key, verify_legacy, Verification};

use thiserror::Error;

/// Boxed underlying cause attached to transport errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the CRX pipeline
///
/// Every variant is terminal for the fetch attempt that produced it.
#[derive(Debug, Error)]
pub enum CrxError {
    #[error("failed to create HTTP client: {0}")]
    HttpClientSetup(#[source] BoxError),

    #[error("failed to get CRX from {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to download CRX: {0}")]
    DownloadReadFailed(#[source] BoxError),

    #[error("failed to parse CRX header: {0}")]
    MalformedHeader(String),

    #[error("downloaded file doesn't look like a CRX (magic {found:02x?})")]
    NotAPackage { found: [u8; 4] },

    #[error("unsupported CRX format version {0}")]
    UnsupportedVersion(u32),

    #[error("failed to parse public key: {0}")]
    InvalidPublicKey(String),

    #[error("not signed with an RSA key (algorithm {algorithm})")]
    UnsupportedKeyType { algorithm: String },

    #[error("public key mismatch: expected {expected}, package key is {actual}")]
    IdentifierMismatch { expected: String, actual: String },

    #[error("signature verification failure: {0}")]
    SignatureInvalid(#[source] rsa::Error),

    #[error("failed to parse ZIP file: {0}")]
    ArchiveParseFailed(#[source] zip::result::ZipError),

    #[error("failed to open {name} in ZIP: {source}")]
    EntryOpenFailed {
        name: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed to read {name} in ZIP: {source}")]
    EntryReadFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl CrxError {
    /// Network or body-read failure
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::HttpClientSetup(_) | Self::FetchFailed { .. } | Self::DownloadReadFailed(_)
        )
    }

    /// Bad magic, bad header lengths, unknown version or a broken archive
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MalformedHeader(_)
                | Self::NotAPackage { .. }
                | Self::UnsupportedVersion(_)
                | Self::ArchiveParseFailed(_)
                | Self::EntryOpenFailed { .. }
                | Self::EntryReadFailed { .. }
        )
    }

    /// Key decoding, key family, identity or signature failure
    pub fn is_crypto(&self) -> bool {
        matches!(
            self,
            Self::InvalidPublicKey(_)
                | Self::UnsupportedKeyType { .. }
                | Self::IdentifierMismatch { .. }
                | Self::SignatureInvalid(_)
        )
    }

    /// Returns true if a caller-side retry could plausibly succeed
    ///
    /// The pipeline itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::FetchFailed { .. } | Self::DownloadReadFailed(_)
        )
    }

    /// Returns a suggestion for resolving this error
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::FetchFailed { .. } | Self::DownloadReadFailed(_) => {
                Some("Check network connectivity to the update service and try again")
            }
            Self::NotAPackage { .. } => {
                Some("The update service returned something other than a CRX; check the application id")
            }
            Self::IdentifierMismatch { .. } => {
                Some("The package was signed by a different key than the requested application id")
            }
            Self::UnsupportedVersion(_) => {
                Some("Request the other package format variant")
            }
            _ => None,
        }
    }
}
