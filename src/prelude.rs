//! sth-pollen prelude
//!
//! The prelude module provides a convenient way to import commonly used types.
//!
//! # Example
//!
//! ```rust
//! use sth_pollen::prelude::*;
//!
//! let url = build_crx_url(STH_SET_APP_ID, UrlVariant::Legacy);
//! assert!(url.starts_with("http://"));
//! ```

// Pipeline entry points
pub use crate::config::{Config, ConfigError, STH_SET_APP_ID};
pub use crate::crx::{
    build_crx_url, open_crx, ArchiveEntry, CrxArchive, CrxError, CrxFetcher, HttpClient,
    ReqwestClient, UrlVariant, Verification,
};
pub use crate::error::Error;

// Scanner
pub use crate::sth::{collect_sths, SignedTreeHead, SthPollen, SthScan, SthSource};
