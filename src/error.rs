//! Unified error type for the sth-pollen public API
//!
//! Internal modules keep their own error types for precise handling.
//! This type is what callers driving the whole pipeline deal with.
//!
//! # Example
//!
//! ```no_run
//! use sth_pollen::{Config, Error};
//!
//! fn run() -> Result<(), Error> {
//!     let config = Config::from_env()?;
//!     let mut archive = config.fetcher()?.fetch(&config.app_id)?;
//!     let scan = sth_pollen::collect_sths(&mut archive, &config.sth_source)?;
//!     scan.pollen.write_json(std::io::stdout().lock())?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all sth-pollen operations
///
/// # Error Categories
///
/// - **Crx**: fetching, parsing or authenticating the package
/// - **Sth**: a single STH record could not be decoded
/// - **Config**: an environment override has an invalid value
/// - **Output**: the result could not be written
#[derive(Debug, Error)]
pub enum Error {
    /// Package pipeline error
    #[error("CRX error: {0}")]
    Crx(#[from] crate::crx::CrxError),

    /// STH record error
    #[error("STH error: {0}")]
    Sth(#[from] crate::sth::SthError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Writing the output document failed
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

impl Error {
    /// Returns true if the error is potentially retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Crx(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns a suggestion for resolving this error
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Crx(e) => e.suggestion(),
            Self::Config(_) => Some("Check the STH_POLLEN_* environment variables"),
            _ => None,
        }
    }

    /// Returns true if the package failed an authenticity check
    pub fn is_crypto_error(&self) -> bool {
        matches!(self, Self::Crx(e) if e.is_crypto())
    }

    /// Returns true if the package or archive is structurally invalid
    pub fn is_structural_error(&self) -> bool {
        matches!(self, Self::Crx(e) if e.is_structural())
    }

    /// Returns true if the download itself failed
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Crx(e) if e.is_transport())
    }
}
