//! Update-service URLs for fetching the latest CRX of an application

use url::form_urlencoded;

/// Host of the public extension update service
pub const DEFAULT_UPDATE_HOST: &str = "clients2.google.com";

/// Path of the CRX download endpoint
pub const UPDATE_PATH: &str = "/service/update2/crx";

/// Which package format the request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlVariant {
    /// Plain HTTP, no format negotiation; served as a legacy (v2) package
    #[default]
    Legacy,
    /// HTTPS with `acceptformat=crx3`; served as a current (v3) package
    Current,
}

impl UrlVariant {
    pub fn scheme(self) -> &'static str {
        match self {
            UrlVariant::Legacy => "http",
            UrlVariant::Current => "https",
        }
    }
}

/// URL of the latest CRX for `app_id` on the public update service
pub fn build_crx_url(app_id: &str, variant: UrlVariant) -> String {
    let origin = format!("{}://{}", variant.scheme(), DEFAULT_UPDATE_HOST);
    build_crx_url_at(&origin, app_id, variant)
}

/// URL of the latest CRX for `app_id` on an explicit `scheme://host[:port]`
///
/// Query parameters are emitted in sorted key order.
pub fn build_crx_url_at(origin: &str, app_id: &str, variant: UrlVariant) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if variant == UrlVariant::Current {
        query.append_pair("acceptformat", "crx3");
    }
    query.append_pair("response", "redirect");
    query.append_pair("x", &format!("id={}&uc", app_id));

    format!(
        "{}{}?{}",
        origin.trim_end_matches('/'),
        UPDATE_PATH,
        query.finish()
    )
}
