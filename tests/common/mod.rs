//! Common test utilities for sth-pollen integration tests
//!
//! Builds signed and unsigned packages in memory so tests can feed them
//! through the pipeline directly or serve them from a mock update service.

#![allow(dead_code)]

use rand::rngs::OsRng;
use rsa::pkcs8::EncodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use std::io::{Cursor, Write};
use std::sync::OnceLock;
use sth_pollen::binary::BinaryWrite;
use sth_pollen::crx::{app_id_from_public_key, CrxHeader, CurrentHeader, LegacyHeader};
use zip::write::FileOptions;
use zip::ZipWriter;

/// Directory of STH files inside the STH-set archive
pub const STH_DIR: &str = "_platform_specific/all/sths/";

/// A log id as it appears in STH file names
pub const LOG_ID_HEX: &str = "a4b90990b418581487bb13a2cc67700a3c359804f91bdfb5e3ab5d8c2ef3da45";

/// RSA key shared by all tests in a binary; generation is slow
pub fn test_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 1024).expect("RSA key generation"))
}

/// SubjectPublicKeyInfo DER of `key`
pub fn public_key_der(key: &RsaPrivateKey) -> Vec<u8> {
    RsaPublicKey::from(key)
        .to_public_key_der()
        .expect("encode public key")
        .as_bytes()
        .to_vec()
}

/// Application id that `key` signs for
pub fn app_id_for(key: &RsaPrivateKey) -> String {
    app_id_from_public_key(&public_key_der(key))
}

/// SubjectPublicKeyInfo DER of a valid P-256 public key (the curve's base point)
pub fn ec_public_key_der() -> Vec<u8> {
    let mut der = vec![
        0x30, 0x59, 0x30, 0x13, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x08,
        0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07, 0x03, 0x42, 0x00, 0x04,
    ];
    der.extend_from_slice(&P256_BASE_POINT);
    der
}

/// Uncompressed coordinates of the P-256 generator
const P256_BASE_POINT: [u8; 64] = [
    0x6b, 0x17, 0xd1, 0xf2, 0xe1, 0x2c, 0x42, 0x47, 0xf8, 0xbc, 0xe6, 0xe5, 0x63, 0xa4, 0x40, 0xf2,
    0x77, 0x03, 0x7d, 0x81, 0x2d, 0xeb, 0x33, 0xa0, 0xf4, 0xa1, 0x39, 0x45, 0xd8, 0x98, 0xc2, 0x96,
    0x4f, 0xe3, 0x42, 0xe2, 0xfe, 0x1a, 0x7f, 0x9b, 0x8e, 0xe7, 0xeb, 0x4a, 0x7c, 0x0f, 0x9e, 0x16,
    0x2b, 0xce, 0x33, 0x57, 0x6b, 0x31, 0x5e, 0xce, 0xcb, 0xb6, 0x40, 0x68, 0x37, 0xbf, 0x51, 0xf5,
];

/// ZIP archive holding `entries`, deflate-compressed
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file::<_, ()>(
                *name,
                FileOptions::default().compression_method(zip::CompressionMethod::Deflated),
            )
            .expect("start zip entry");
        writer.write_all(contents).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// PKCS#1 v1.5 signature over the SHA-1 digest of `payload`
pub fn sign_payload(key: &RsaPrivateKey, payload: &[u8]) -> Vec<u8> {
    key.sign(Pkcs1v15Sign::new::<Sha1>(), &Sha1::digest(payload))
        .expect("sign payload")
}

/// Legacy package with arbitrary key and signature blocks
pub fn legacy_crx_with(public_key: &[u8], signature: &[u8], payload: &[u8]) -> Vec<u8> {
    let header = CrxHeader::Legacy(LegacyHeader {
        public_key,
        signature,
    });
    let mut buf = Vec::with_capacity(header.serialized_size() + payload.len());
    header.write_to(&mut buf).expect("write header");
    buf.extend_from_slice(payload);
    buf
}

/// Legacy package correctly signed by `key`
pub fn legacy_crx(key: &RsaPrivateKey, payload: &[u8]) -> Vec<u8> {
    legacy_crx_with(&public_key_der(key), &sign_payload(key, payload), payload)
}

/// Current package with an opaque header block
pub fn current_crx(header_block: &[u8], payload: &[u8]) -> Vec<u8> {
    let header = CrxHeader::Current(CurrentHeader { header_block });
    let mut buf = Vec::new();
    header.write_to(&mut buf).expect("write header");
    buf.extend_from_slice(payload);
    buf
}

/// An STH file body as shipped in the STH set
pub fn sth_json(tree_size: u64) -> String {
    serde_json::json!({
        "tree_size": tree_size,
        "timestamp": 1_500_000_000_000u64,
        "sha256_root_hash": "3q2+7w==",
        "tree_head_signature": "BAMARjBEAiA="
    })
    .to_string()
}

/// Name of the STH file for `log_id_hex`
pub fn sth_name(log_id_hex: &str) -> String {
    format!("{}{}.sth", STH_DIR, log_id_hex)
}
