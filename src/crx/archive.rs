use super::reader::PayloadReader;
use super::verify::Verification;
use super::CrxError;
use std::io::Read;
use zip::ZipArchive;

/// Upper bound on buffer space reserved from a declared entry size
///
/// Entry sizes come from the archive itself and are untrusted for
/// unauthenticated packages; larger entries grow the buffer as they read.
const MAX_PREALLOCATION: u64 = 1 << 20;

fn entry_buffer(declared_size: u64) -> Vec<u8> {
    Vec::with_capacity(declared_size.min(MAX_PREALLOCATION) as usize)
}

/// Metadata of one archive entry, read without decompressing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub index: usize,
    pub name: String,
    pub compressed_size: u64,
    pub size: u64,
    pub is_dir: bool,
}

/// ZIP payload of a CRX, addressed in memory
#[derive(Debug)]
pub struct CrxArchive {
    zip_archive: ZipArchive<PayloadReader>,
    verification: Verification,
}

impl CrxArchive {
    /// Open the payload as a ZIP archive
    pub fn new(payload: PayloadReader, verification: Verification) -> Result<Self, CrxError> {
        let zip_archive = ZipArchive::new(payload).map_err(CrxError::ArchiveParseFailed)?;
        Ok(Self {
            zip_archive,
            verification,
        })
    }

    /// Returns the number of entries in the archive
    pub fn len(&self) -> usize {
        self.zip_archive.len()
    }

    /// Returns whether the archive is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How the package carrying this archive was checked
    pub fn verification(&self) -> &Verification {
        &self.verification
    }

    /// True only for legacy packages whose key and signature verified
    pub fn is_authenticated(&self) -> bool {
        self.verification.is_verified()
    }

    /// Lists all entries in archive order
    pub fn entries(&mut self) -> Result<Vec<ArchiveEntry>, CrxError> {
        (0..self.zip_archive.len())
            .map(|index| {
                let file = self.zip_archive.by_index_raw(index).map_err(|e| {
                    CrxError::EntryOpenFailed {
                        name: format!("#{}", index),
                        source: e,
                    }
                })?;
                Ok(ArchiveEntry {
                    index,
                    name: file.name().to_string(),
                    compressed_size: file.compressed_size(),
                    size: file.size(),
                    is_dir: file.is_dir(),
                })
            })
            .collect()
    }

    /// Decompresses one entry by name
    pub fn read_by_name(&mut self, name: &str) -> Result<Vec<u8>, CrxError> {
        let mut file = self
            .zip_archive
            .by_name(name)
            .map_err(|e| CrxError::EntryOpenFailed {
                name: name.to_string(),
                source: e,
            })?;
        let mut contents = entry_buffer(file.size());
        file.read_to_end(&mut contents)
            .map_err(|e| CrxError::EntryReadFailed {
                name: name.to_string(),
                source: e,
            })?;
        Ok(contents)
    }

    /// Decompresses one entry by index
    pub fn read_by_index(&mut self, index: usize) -> Result<Vec<u8>, CrxError> {
        let mut file = self
            .zip_archive
            .by_index(index)
            .map_err(|e| CrxError::EntryOpenFailed {
                name: format!("#{}", index),
                source: e,
            })?;
        let name = file.name().to_string();
        let mut contents = entry_buffer(file.size());
        file.read_to_end(&mut contents)
            .map_err(|e| CrxError::EntryReadFailed { name, source: e })?;
        Ok(contents)
    }
}
