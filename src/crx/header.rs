//! CRX header structures
//!
//! ```text
//! legacy  (v2): "Cr24" | version u32 | key_len u32 | sig_len u32 | key | sig | zip
//! current (v3): "Cr24" | version u32 | header_len u32 | header block | zip
//! ```
//!
//! All integers are little-endian. Parsing never copies: every block is a
//! sub-slice of the downloaded buffer.

use super::verify::{verify_legacy, Verification};
use super::CrxError;
use crate::binary::{read_u32_le, write_bytes, write_u32_le, BinaryWrite, SliceReader};
use std::io::{self, Write};

/// Magic bytes at the start of every CRX
pub const CRX_MAGIC: [u8; 4] = *b"Cr24";

/// Format version of packages carrying an embedded key and signature
pub const LEGACY_VERSION: u32 = 2;

/// Format version of packages carrying an opaque header block
pub const CURRENT_VERSION: u32 = 3;

/// Which on-disk layout a package uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrxVariant {
    Legacy,
    Current,
}

impl CrxVariant {
    pub fn format_version(self) -> u32 {
        match self {
            CrxVariant::Legacy => LEGACY_VERSION,
            CrxVariant::Current => CURRENT_VERSION,
        }
    }
}

/// Legacy header blocks: DER public key and PKCS#1 v1.5 signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyHeader<'a> {
    pub public_key: &'a [u8],
    pub signature: &'a [u8],
}

/// Current header block, not interpreted here
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentHeader<'a> {
    pub header_block: &'a [u8],
}

/// Decoded CRX header, keyed by format version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrxHeader<'a> {
    Legacy(LegacyHeader<'a>),
    Current(CurrentHeader<'a>),
}

/// A parsed package: header plus the ZIP payload that follows it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCrx<'a> {
    pub header: CrxHeader<'a>,
    pub payload: &'a [u8],
}

impl<'a> CrxHeader<'a> {
    pub fn variant(&self) -> CrxVariant {
        match self {
            CrxHeader::Legacy(_) => CrxVariant::Legacy,
            CrxHeader::Current(_) => CrxVariant::Current,
        }
    }

    pub fn format_version(&self) -> u32 {
        self.variant().format_version()
    }

    /// Apply the verification policy of this variant to `payload`
    ///
    /// Legacy headers are authenticated against `app_id`; current headers
    /// are skipped and the payload stays unauthenticated.
    pub fn verify(&self, app_id: &str, payload: &[u8]) -> Result<Verification, CrxError> {
        match self {
            CrxHeader::Legacy(legacy) => {
                verify_legacy(app_id, legacy.public_key, legacy.signature, payload)
            }
            CrxHeader::Current(_) => Ok(Verification::Skipped),
        }
    }
}

/// Parse the header of a downloaded package
///
/// Magic is checked before anything else, so a buffer with the wrong
/// magic is always [`CrxError::NotAPackage`] regardless of what follows.
pub fn parse_crx(data: &[u8]) -> Result<ParsedCrx<'_>, CrxError> {
    let mut reader = SliceReader::new(data);

    let magic: [u8; 4] = reader.read_array().map_err(malformed("magic"))?;
    if magic != CRX_MAGIC {
        return Err(CrxError::NotAPackage { found: magic });
    }

    let version = read_u32_le(&mut reader).map_err(malformed("format version"))?;
    let header = match version {
        LEGACY_VERSION => {
            let key_len = read_length(&mut reader, "public key length")?;
            let sig_len = read_length(&mut reader, "signature length")?;
            let public_key = reader.take(key_len).map_err(malformed("public key"))?;
            let signature = reader.take(sig_len).map_err(malformed("signature"))?;
            CrxHeader::Legacy(LegacyHeader {
                public_key,
                signature,
            })
        }
        CURRENT_VERSION => {
            let header_len = read_length(&mut reader, "header length")?;
            let header_block = reader.take(header_len).map_err(malformed("header block"))?;
            CrxHeader::Current(CurrentHeader { header_block })
        }
        other => return Err(CrxError::UnsupportedVersion(other)),
    };

    Ok(ParsedCrx {
        header,
        payload: reader.rest(),
    })
}

/// Read a declared block length, rejecting values with the sign bit set
fn read_length(reader: &mut SliceReader<'_>, field: &str) -> Result<usize, CrxError> {
    let raw = read_u32_le(reader).map_err(malformed(field))?;
    if (raw as i32) < 0 {
        return Err(CrxError::MalformedHeader(format!(
            "{} {:#010x} is negative",
            field, raw
        )));
    }
    Ok(raw as usize)
}

fn malformed(field: &str) -> impl FnOnce(io::Error) -> CrxError + '_ {
    move |e| CrxError::MalformedHeader(format!("{}: {}", field, e))
}

fn block_len(block: &[u8]) -> io::Result<u32> {
    u32::try_from(block.len())
        .ok()
        .filter(|len| (*len as i32) >= 0)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "block too large for CRX"))
}

impl BinaryWrite for CrxHeader<'_> {
    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_bytes(writer, &CRX_MAGIC)?;
        write_u32_le(writer, self.format_version())?;
        match self {
            CrxHeader::Legacy(legacy) => {
                write_u32_le(writer, block_len(legacy.public_key)?)?;
                write_u32_le(writer, block_len(legacy.signature)?)?;
                write_bytes(writer, legacy.public_key)?;
                write_bytes(writer, legacy.signature)
            }
            CrxHeader::Current(current) => {
                write_u32_le(writer, block_len(current.header_block)?)?;
                write_bytes(writer, current.header_block)
            }
        }
    }

    fn serialized_size(&self) -> usize {
        match self {
            CrxHeader::Legacy(legacy) => 16 + legacy.public_key.len() + legacy.signature.len(),
            CrxHeader::Current(current) => 12 + current.header_block.len(),
        }
    }
}
