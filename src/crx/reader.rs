//! Random-access reader over a downloaded package
//!
//! The ZIP reader needs to seek, so the whole download is kept in memory
//! and the payload is addressed in place, starting at the offset where the
//! CRX header ends. Nothing is copied or written to disk.

use std::io::{self, Read, Seek, SeekFrom};

/// Read-only view of the payload part of a downloaded buffer
#[derive(Debug, Clone)]
pub struct PayloadReader {
    buf: Vec<u8>,
    start: usize,
    pos: u64,
}

impl PayloadReader {
    /// Wrap `buf`, exposing only the bytes from `start` onwards
    ///
    /// A `start` past the end yields an empty payload.
    pub fn new(buf: Vec<u8>, start: usize) -> Self {
        let start = start.min(buf.len());
        Self { buf, start, pos: 0 }
    }

    /// The payload bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[self.start..]
    }

    /// Payload length in bytes
    pub fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Copy bytes starting at `pos` into `out`, returning how many were copied
    ///
    /// A negative position reads nothing; so does a position at or past the
    /// end. This never fails.
    pub fn read_at(&self, pos: i64, out: &mut [u8]) -> usize {
        let Ok(pos) = usize::try_from(pos) else {
            return 0;
        };
        let data = self.as_slice();
        if pos >= data.len() {
            return 0;
        }
        let n = out.len().min(data.len() - pos);
        out[..n].copy_from_slice(&data[pos..pos + n]);
        n
    }
}

impl Read for PayloadReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let pos = i64::try_from(self.pos).unwrap_or(i64::MAX);
        let n = self.read_at(pos, out);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for PayloadReader {
    fn seek(&mut self, style: SeekFrom) -> io::Result<u64> {
        let (base, offset) = match style {
            SeekFrom::Start(n) => {
                self.pos = n;
                return Ok(n);
            }
            SeekFrom::End(n) => (self.len(), n),
            SeekFrom::Current(n) => (self.pos, n),
        };
        match base.checked_add_signed(offset) {
            Some(n) => {
                self.pos = n;
                Ok(n)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}
