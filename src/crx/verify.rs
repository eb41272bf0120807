//! Legacy CRX authenticity checks
//!
//! A legacy package proves where it came from in two steps:
//!
//! 1. The application id is derived from the embedded public key: SHA-256
//!    over the raw DER bytes, first 16 bytes, hex-encoded and shifted into
//!    the `a`..`p` alphabet. It must equal the id that was requested.
//! 2. The ZIP payload must carry an RSA PKCS#1 v1.5 signature over its
//!    SHA-1 digest made with the matching private key.
//!
//! SHA-1 is cryptographically weak but it is what the legacy signing scheme
//! uses; there is no way to verify these packages with anything else.

use super::CrxError;
use rsa::pkcs1::ALGORITHM_OID as RSA_ENCRYPTION_OID;
use rsa::pkcs8::SubjectPublicKeyInfoRef;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Bytes of the key digest that make up an application id
const APP_ID_DIGEST_LEN: usize = 16;

/// Outcome of applying a header's verification policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Key matched the requested id and the payload signature verified
    Verified {
        app_id: String,
        /// Lowercase hex of the truncated SHA-256 key digest
        key_digest: String,
    },
    /// No cryptographic check applies to this package variant
    Skipped,
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified { .. })
    }
}

/// Map a digest onto the application-id alphabet
///
/// Each hex digit `0`-`9` becomes `a`-`j` and `a`-`f` becomes `k`-`p`.
pub fn app_id_from_digest(digest: &[u8]) -> String {
    hex::encode(digest)
        .bytes()
        .map(|c| char::from(if c < b'a' { c + 49 } else { c + 10 }))
        .collect()
}

/// Derive the application id a DER-encoded public key signs for
pub fn app_id_from_public_key(public_key_der: &[u8]) -> String {
    let digest = Sha256::digest(public_key_der);
    app_id_from_digest(&digest[..APP_ID_DIGEST_LEN])
}

/// Authenticate a legacy package
///
/// The identity check runs before the signature check, so a package signed
/// by the wrong key never reaches RSA verification.
pub fn verify_legacy(
    app_id: &str,
    public_key_der: &[u8],
    signature: &[u8],
    payload: &[u8],
) -> Result<Verification, CrxError> {
    let spki = SubjectPublicKeyInfoRef::try_from(public_key_der)
        .map_err(|e| CrxError::InvalidPublicKey(e.to_string()))?;

    if spki.algorithm.oid != RSA_ENCRYPTION_OID {
        return Err(CrxError::UnsupportedKeyType {
            algorithm: spki.algorithm.oid.to_string(),
        });
    }

    let public_key =
        RsaPublicKey::try_from(spki).map_err(|e| CrxError::InvalidPublicKey(e.to_string()))?;

    let key_digest = Sha256::digest(public_key_der);
    let key_digest = &key_digest[..APP_ID_DIGEST_LEN];
    let derived = app_id_from_digest(key_digest);
    if derived != app_id {
        return Err(CrxError::IdentifierMismatch {
            expected: app_id.to_string(),
            actual: derived,
        });
    }

    let payload_digest = Sha1::digest(payload);
    public_key
        .verify(Pkcs1v15Sign::new::<Sha1>(), &payload_digest, signature)
        .map_err(CrxError::SignatureInvalid)?;

    Ok(Verification::Verified {
        app_id: derived,
        key_digest: hex::encode(key_digest),
    })
}
