//! Runtime configuration
//!
//! Defaults target the public STH-set package. Each field can be
//! overridden from the environment:
//!
//! | Variable                   | Meaning                                   |
//! |----------------------------|-------------------------------------------|
//! | `STH_POLLEN_APP_ID`        | application id to fetch                   |
//! | `STH_POLLEN_FORMAT`        | `legacy` (default) or `current`           |
//! | `STH_POLLEN_UPDATE_ORIGIN` | `scheme://host[:port]` of the update service |
//! | `STH_POLLEN_TIMEOUT_SECS`  | HTTP timeout in seconds                   |
//! | `STH_POLLEN_STH_PREFIX`    | archive directory holding STH files       |

use crate::crx::{CrxError, CrxFetcher, ReqwestClient, UrlVariant, DEFAULT_TIMEOUT};
use crate::sth::SthSource;
use std::time::Duration;
use thiserror::Error;

/// Application id of the STH-set extension
pub const STH_SET_APP_ID: &str = "ojjgnpkioondelmggbekfhllhdaimnho";

pub const ENV_APP_ID: &str = "STH_POLLEN_APP_ID";
pub const ENV_FORMAT: &str = "STH_POLLEN_FORMAT";
pub const ENV_UPDATE_ORIGIN: &str = "STH_POLLEN_UPDATE_ORIGIN";
pub const ENV_TIMEOUT_SECS: &str = "STH_POLLEN_TIMEOUT_SECS";
pub const ENV_STH_PREFIX: &str = "STH_POLLEN_STH_PREFIX";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: unknown package format {value:?} (expected \"legacy\" or \"current\")")]
    UnknownFormat { var: &'static str, value: String },

    #[error("{var}: invalid timeout {value:?}")]
    InvalidTimeout { var: &'static str, value: String },

    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub app_id: String,
    pub format: UrlVariant,
    /// Overrides the public update service when set
    pub update_origin: Option<String>,
    pub timeout: Duration,
    pub sth_source: SthSource,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_id: STH_SET_APP_ID.to_string(),
            format: UrlVariant::Legacy,
            update_origin: None,
            timeout: DEFAULT_TIMEOUT,
            sth_source: SthSource::default(),
        }
    }
}

impl Config {
    /// Defaults overlaid with any `STH_POLLEN_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with values from `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(app_id) = lookup(ENV_APP_ID) {
            config.app_id = non_empty(ENV_APP_ID, app_id)?;
        }
        if let Some(format) = lookup(ENV_FORMAT) {
            config.format = parse_format(&format)?;
        }
        if let Some(origin) = lookup(ENV_UPDATE_ORIGIN) {
            config.update_origin = Some(non_empty(ENV_UPDATE_ORIGIN, origin)?);
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            let secs = timeout
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout {
                    var: ENV_TIMEOUT_SECS,
                    value: timeout,
                })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(prefix) = lookup(ENV_STH_PREFIX) {
            config.sth_source.prefix = non_empty(ENV_STH_PREFIX, prefix)?;
        }

        Ok(config)
    }

    /// Build a fetcher honouring the format, origin and timeout settings
    pub fn fetcher(&self) -> Result<CrxFetcher<ReqwestClient>, CrxError> {
        let client = ReqwestClient::with_timeout(self.timeout)?;
        let fetcher = CrxFetcher::new(client, self.format);
        Ok(match &self.update_origin {
            Some(origin) => fetcher.with_origin(origin.clone()),
            None => fetcher,
        })
    }
}

fn parse_format(value: &str) -> Result<UrlVariant, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "legacy" | "crx2" => Ok(UrlVariant::Legacy),
        "current" | "crx3" => Ok(UrlVariant::Current),
        _ => Err(ConfigError::UnknownFormat {
            var: ENV_FORMAT,
            value: value.to_string(),
        }),
    }
}

fn non_empty(var: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Empty { var });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.app_id, STH_SET_APP_ID);
        assert_eq!(config.format, UrlVariant::Legacy);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.sth_source.prefix, "_platform_specific/all/sths/");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (ENV_APP_ID, "aaaabbbbccccddddeeeeffffgggghhhh"),
            (ENV_FORMAT, "Current"),
            (ENV_UPDATE_ORIGIN, "http://127.0.0.1:8080"),
            (ENV_TIMEOUT_SECS, "5"),
            (ENV_STH_PREFIX, "sths/"),
        ]))
        .unwrap();

        assert_eq!(config.app_id, "aaaabbbbccccddddeeeeffffgggghhhh");
        assert_eq!(config.format, UrlVariant::Current);
        assert_eq!(config.update_origin.as_deref(), Some("http://127.0.0.1:8080"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.sth_source.prefix, "sths/");
        assert_eq!(config.sth_source.suffix, ".sth");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_lookup(lookup(&[(ENV_FORMAT, "crx4")])),
            Err(ConfigError::UnknownFormat { .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "soon")])),
            Err(ConfigError::InvalidTimeout { .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "0")])),
            Err(ConfigError::InvalidTimeout { .. })
        ));
        assert_eq!(
            Config::from_lookup(lookup(&[(ENV_APP_ID, "  ")])),
            Err(ConfigError::Empty { var: ENV_APP_ID })
        );
    }

    #[test]
    fn test_fetcher_uses_origin() {
        let config = Config {
            update_origin: Some("http://localhost:1".to_string()),
            ..Config::default()
        };
        let fetcher = config.fetcher().unwrap();
        assert!(fetcher
            .url_for("abc")
            .starts_with("http://localhost:1/service/update2/crx?"));
    }
}
