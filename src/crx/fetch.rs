//! CRX download and unpacking
//!
//! One GET, the whole body buffered in memory, then header parsing,
//! verification and archive construction. Nothing is retried and nothing
//! is written to disk.

use super::archive::CrxArchive;
use super::header::parse_crx;
use super::reader::PayloadReader;
use super::update_url::{build_crx_url_at, UrlVariant, DEFAULT_UPDATE_HOST};
use super::CrxError;
use std::time::Duration;

/// Default request timeout for [`ReqwestClient`]
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for HTTP GET so the transport can be swapped in tests
pub trait HttpClient {
    /// Performs a GET and returns the complete response body
    fn get(&self, url: &str) -> Result<Vec<u8>, CrxError>;
}

/// Blocking HTTP client backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client with the default timeout
    pub fn new() -> Result<Self, CrxError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, CrxError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CrxError::HttpClientSetup(e.into()))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, CrxError> {
        let fetch_failed = |e: reqwest::Error| CrxError::FetchFailed {
            url: url.to_string(),
            source: e.into(),
        };

        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(fetch_failed)?;

        // The ZIP reader needs to seek, so read the whole reply into memory
        let body = response
            .bytes()
            .map_err(|e| CrxError::DownloadReadFailed(e.into()))?;
        Ok(body.to_vec())
    }
}

/// Unpack a downloaded package requested as `app_id`
///
/// Legacy packages are authenticated against `app_id` before the archive
/// is opened; current packages are not (see [`CrxArchive::is_authenticated`]).
pub fn open_crx(bytes: Vec<u8>, app_id: &str) -> Result<CrxArchive, CrxError> {
    let (payload_start, verification) = {
        let parsed = parse_crx(&bytes)?;
        let verification = parsed.header.verify(app_id, parsed.payload)?;
        (bytes.len() - parsed.payload.len(), verification)
    };
    CrxArchive::new(PayloadReader::new(bytes, payload_start), verification)
}

/// Fetches CRX packages from an update service
#[derive(Debug, Clone)]
pub struct CrxFetcher<C = ReqwestClient> {
    client: C,
    origin: String,
    variant: UrlVariant,
}

impl CrxFetcher<ReqwestClient> {
    /// Fetcher for the public update service with a default reqwest client
    pub fn with_defaults(variant: UrlVariant) -> Result<Self, CrxError> {
        Ok(Self::new(ReqwestClient::new()?, variant))
    }
}

impl<C: HttpClient> CrxFetcher<C> {
    pub fn new(client: C, variant: UrlVariant) -> Self {
        Self {
            client,
            origin: format!("{}://{}", variant.scheme(), DEFAULT_UPDATE_HOST),
            variant,
        }
    }

    /// Point the fetcher at another `scheme://host[:port]`
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn variant(&self) -> UrlVariant {
        self.variant
    }

    /// URL that [`fetch`](Self::fetch) requests for `app_id`
    pub fn url_for(&self, app_id: &str) -> String {
        build_crx_url_at(&self.origin, app_id, self.variant)
    }

    /// Download the latest package for `app_id` and open its archive
    pub fn fetch(&self, app_id: &str) -> Result<CrxArchive, CrxError> {
        let bytes = self.client.get(&self.url_for(app_id))?;
        open_crx(bytes, app_id)
    }
}
