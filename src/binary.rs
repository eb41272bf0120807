//! Binary field helpers for the CRX header
//!
//! All multi-byte integers in a CRX header are little-endian. Reads are
//! performed over a borrowed [`SliceReader`] so that variable-length blocks
//! come back as sub-slices of the downloaded buffer rather than copies.

use std::io::{self, Write};

/// Cursor over a borrowed byte slice that hands out sub-slices
#[derive(Debug, Clone)]
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Take exactly `n` bytes without copying
    pub fn take(&mut self, n: usize) -> io::Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "need {} bytes at offset {}, only {} available",
                    n,
                    self.pos,
                    self.remaining()
                ),
            ));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Read a fixed-size array
    pub fn read_array<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    /// Everything after the current position
    pub fn rest(self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

/// Read a u32 (little-endian)
pub fn read_u32_le(reader: &mut SliceReader<'_>) -> io::Result<u32> {
    Ok(u32::from_le_bytes(reader.read_array()?))
}

/// Write a u32 (little-endian) to a writer
pub fn write_u32_le<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Write bytes to a writer
pub fn write_bytes<W: Write>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    writer.write_all(bytes)
}

/// Trait for types that can be written in CRX wire format
pub trait BinaryWrite {
    /// Write this type to a binary writer
    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()>;

    /// Get the size in bytes when serialized
    fn serialized_size(&self) -> usize;
}
