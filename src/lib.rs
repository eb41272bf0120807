//! Fetch the Certificate Transparency STH-set extension package and relay
//! the signed tree heads it carries.
//!
//! The [`crx`] module does the byte-level work: URL construction, header
//! parsing for both package variants, authenticity checks for legacy
//! packages, and an in-memory random-access view over the ZIP payload.
//! [`sth`] scans that archive for STH records and aggregates them.

pub mod binary;
pub mod config;
pub mod crx;
mod error;
pub mod prelude;
pub mod sth;

pub use config::{Config, ConfigError, STH_SET_APP_ID};
pub use crx::{CrxArchive, CrxError, CrxFetcher};
pub use error::Error;
pub use sth::{collect_sths, SignedTreeHead, SthError, SthPollen, SthScan, SthSource};
