//! Signed tree heads carried inside the STH-set CRX
//!
//! The STH set is an ordinary extension package whose archive holds one
//! JSON file per Certificate Transparency log, named after the log id:
//!
//! ```text
//! _platform_specific/all/sths/<hex log id>.sth
//! ```
//!
//! Records are relayed as found. Their signatures are not checked against
//! the logs' public keys.

use crate::crx::{CrxArchive, CrxError};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use thiserror::Error;
use tracing::debug;

/// Archive directory holding the STH files
pub const DEFAULT_STH_PREFIX: &str = "_platform_specific/all/sths/";

/// File extension of an STH file
pub const STH_SUFFIX: &str = ".sth";

/// Errors for individual STH entries
#[derive(Debug, Error)]
pub enum SthError {
    #[error("bad STH filename: {0}")]
    BadFileName(#[from] hex::FromHexError),

    #[error(transparent)]
    Archive(#[from] CrxError),

    #[error("failed to parse STH: {0}")]
    Json(#[from] serde_json::Error),
}

/// Standard base64 for byte fields, as in the STH JSON encoding
///
/// A missing or `null` field stays `None` and is written back as `null`.
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_str(&BASE64.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| BASE64.decode(encoded).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// A signed tree head of one log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignedTreeHead {
    pub sth_version: i64,
    pub tree_size: u64,
    pub timestamp: u64,
    #[serde(with = "base64_bytes")]
    pub sha256_root_hash: Option<Vec<u8>>,
    #[serde(with = "base64_bytes")]
    pub tree_head_signature: Option<Vec<u8>>,
    #[serde(with = "base64_bytes")]
    pub log_id: Option<Vec<u8>>,
}

/// STH file body
///
/// Numeric fields that are missing or `null` keep their defaults. An
/// explicit `"log_id": null` clears the id taken from the file name.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SthFile {
    sth_version: Option<i64>,
    tree_size: Option<u64>,
    timestamp: Option<u64>,
    #[serde(with = "base64_bytes")]
    sha256_root_hash: Option<Vec<u8>>,
    #[serde(with = "base64_bytes")]
    tree_head_signature: Option<Vec<u8>>,
    #[serde(deserialize_with = "present_bytes")]
    log_id: Option<Option<Vec<u8>>>,
}

fn present_bytes<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Option<Vec<u8>>>, D::Error> {
    base64_bytes::deserialize(deserializer).map(Some)
}

impl SignedTreeHead {
    /// Decode an STH file body
    ///
    /// `version` and `log_id` apply unless the body carries its own.
    pub fn from_json(version: i64, log_id: Vec<u8>, body: &[u8]) -> Result<Self, SthError> {
        let file: SthFile = serde_json::from_slice(body)?;
        Ok(Self {
            sth_version: file.sth_version.unwrap_or(version),
            tree_size: file.tree_size.unwrap_or_default(),
            timestamp: file.timestamp.unwrap_or_default(),
            sha256_root_hash: file.sha256_root_hash,
            tree_head_signature: file.tree_head_signature,
            log_id: file.log_id.unwrap_or(Some(log_id)),
        })
    }
}

/// The aggregated output document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SthPollen {
    pub sths: Vec<SignedTreeHead>,
}

impl SthPollen {
    /// Serialize as a single JSON line
    pub fn write_json<W: Write>(&self, mut writer: W) -> io::Result<()> {
        serde_json::to_writer(&mut writer, self)?;
        writer.write_all(b"\n")
    }
}

/// Where STH files live inside the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SthSource {
    pub prefix: String,
    pub suffix: String,
}

impl Default for SthSource {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_STH_PREFIX.to_string(),
            suffix: STH_SUFFIX.to_string(),
        }
    }
}

impl SthSource {
    /// Hex log id part of `name`, if it is an STH file
    pub fn log_id_hex<'n>(&self, name: &'n str) -> Option<&'n str> {
        name.strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())
    }
}

/// An STH file that was left out of the result
#[derive(Debug)]
pub struct SkippedEntry {
    pub name: String,
    pub reason: SthError,
}

/// Result of scanning an archive
#[derive(Debug, Default)]
pub struct SthScan {
    pub pollen: SthPollen,
    pub skipped: Vec<SkippedEntry>,
}

/// Collect every STH file in `archive`
///
/// Bad entries are skipped and reported; they never abort the scan.
/// Fails only if the archive directory itself cannot be listed.
pub fn collect_sths(archive: &mut CrxArchive, source: &SthSource) -> Result<SthScan, CrxError> {
    let mut scan = SthScan::default();

    for entry in archive.entries()? {
        let Some(log_id_hex) = source.log_id_hex(&entry.name) else {
            continue;
        };
        match read_sth(archive, entry.index, log_id_hex) {
            Ok(sth) => {
                debug!(name = %entry.name, tree_size = sth.tree_size, "collected STH");
                scan.pollen.sths.push(sth);
            }
            Err(reason) => scan.skipped.push(SkippedEntry {
                name: entry.name,
                reason,
            }),
        }
    }

    Ok(scan)
}

fn read_sth(
    archive: &mut CrxArchive,
    index: usize,
    log_id_hex: &str,
) -> Result<SignedTreeHead, SthError> {
    let log_id = hex::decode(log_id_hex)?;
    let body = archive.read_by_index(index)?;
    SignedTreeHead::from_json(0, log_id, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_id_hex() {
        let source = SthSource::default();
        assert_eq!(
            source.log_id_hex("_platform_specific/all/sths/a1b2.sth"),
            Some("a1b2")
        );
        assert_eq!(source.log_id_hex("_platform_specific/all/sths/a1b2.json"), None);
        assert_eq!(source.log_id_hex("other/a1b2.sth"), None);
        assert_eq!(source.log_id_hex("_platform_specific/all/sths/"), None);
    }

    #[test]
    fn test_sth_defaults_from_file_name() {
        let body = br#"{
            "tree_size": 1234,
            "timestamp": 1500000000000,
            "sha256_root_hash": "AAEC",
            "tree_head_signature": "BAMEAA=="
        }"#;
        let sth = SignedTreeHead::from_json(0, vec![0xab, 0xcd], body).unwrap();
        assert_eq!(sth.sth_version, 0);
        assert_eq!(sth.tree_size, 1234);
        assert_eq!(sth.sha256_root_hash, Some(vec![0, 1, 2]));
        assert_eq!(sth.tree_head_signature, Some(vec![4, 3, 4, 0]));
        assert_eq!(sth.log_id, Some(vec![0xab, 0xcd]));
    }

    #[test]
    fn test_sth_body_overrides_defaults() {
        let body = br#"{"sth_version": 1, "log_id": "/w=="}"#;
        let sth = SignedTreeHead::from_json(0, vec![0xab], body).unwrap();
        assert_eq!(sth.sth_version, 1);
        assert_eq!(sth.log_id, Some(vec![0xff]));
        assert_eq!(sth.tree_size, 0);
    }

    #[test]
    fn test_missing_and_null_fields() {
        let body = br#"{"tree_size": null, "tree_head_signature": null, "log_id": null}"#;
        let sth = SignedTreeHead::from_json(0, vec![0xab], body).unwrap();
        assert_eq!(sth.tree_size, 0);
        assert_eq!(sth.sha256_root_hash, None);
        assert_eq!(sth.tree_head_signature, None);
        assert_eq!(sth.log_id, None);

        let sth = SignedTreeHead::from_json(0, vec![], br#"{"sha256_root_hash": ""}"#).unwrap();
        assert_eq!(sth.sha256_root_hash, Some(vec![]));
        assert_eq!(sth.log_id, Some(vec![]));
    }

    #[test]
    fn test_absent_bytes_written_as_null() {
        let sth = SignedTreeHead::from_json(0, vec![0x01], br#"{"tree_size": 3}"#).unwrap();
        let pollen = SthPollen { sths: vec![sth] };
        let mut out = Vec::new();
        pollen.write_json(&mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert!(value["sths"][0]["sha256_root_hash"].is_null());
        assert!(value["sths"][0]["tree_head_signature"].is_null());
        assert_eq!(value["sths"][0]["log_id"], "AQ==");

        let back: SthPollen = serde_json::from_slice(&out).unwrap();
        assert_eq!(back, pollen);
    }

    #[test]
    fn test_sth_bad_json() {
        assert!(matches!(
            SignedTreeHead::from_json(0, vec![], b"not json"),
            Err(SthError::Json(_))
        ));
        assert!(matches!(
            SignedTreeHead::from_json(0, vec![], br#"{"sha256_root_hash": "!!"}"#),
            Err(SthError::Json(_))
        ));
    }

    #[test]
    fn test_pollen_json_shape() {
        let pollen = SthPollen {
            sths: vec![SignedTreeHead {
                sth_version: 0,
                tree_size: 2,
                timestamp: 3,
                sha256_root_hash: Some(vec![0xff]),
                tree_head_signature: Some(vec![]),
                log_id: Some(vec![0x01, 0x02]),
            }],
        };
        let mut out = Vec::new();
        pollen.write_json(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["sths"][0]["sha256_root_hash"], "/w==");
        assert_eq!(value["sths"][0]["tree_head_signature"], "");
        assert_eq!(value["sths"][0]["log_id"], "AQI=");
        assert_eq!(value["sths"][0]["tree_size"], 2);
    }

    #[test]
    fn test_empty_pollen() {
        let mut out = Vec::new();
        SthPollen::default().write_json(&mut out).unwrap();
        assert_eq!(out, b"{\"sths\":[]}\n");
    }
}
