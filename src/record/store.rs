//! Reading and writing skin record files.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

#[cfg(feature = "mmap")]
use memmap2::Mmap;

use super::compression;
use super::format::*;
use super::reader::{decode_body, parse_header, record_from_fields};
use super::schema::SkinRecord;
use super::value::FieldTable;
use super::writer::{encode_body, encode_header, record_fields};
use crate::config::Config;
use crate::util::{Error, Result};

/// Serializes [`SkinRecord`]s to bytes and files.
///
/// `load(save(r)) == r` for every valid record.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(not(feature = "mmap"), allow(dead_code))]
pub struct RecordStore {
    compression_level: u32,
    use_mmap: bool,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self { compression_level: 6, use_mmap: true }
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            compression_level: config.compression_level,
            use_mmap: config.use_mmap,
        }
    }

    /// Set the zlib level (0 disables body compression).
    pub fn with_compression(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }

    /// Read files through a memory map when the `mmap` feature is on.
    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    /// Encode a record to file bytes.
    pub fn save(&self, record: &SkinRecord) -> Result<Vec<u8>> {
        let body = encode_body(&record_fields(record))?;
        let (flags, body) = match compression::compress(&body, self.compression_level)? {
            Some(compressed) => (FLAG_COMPRESSED, compressed),
            None => (0, body),
        };

        let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
        out.extend_from_slice(&encode_header(flags));
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Decode the raw legend-keyed fields of a record file.
    pub fn load_fields(&self, data: &[u8]) -> Result<FieldTable> {
        let header = parse_header(data)?;
        let body = &data[HEADER_SIZE..];
        if header.is_compressed() {
            decode_body(&compression::decompress(body)?)
        } else {
            decode_body(body)
        }
    }

    /// Decode file bytes into a validated record.
    pub fn load(&self, data: &[u8]) -> Result<SkinRecord> {
        record_from_fields(&self.load_fields(data)?)
    }

    /// Write a record to `path`, replacing any existing file.
    pub fn write(&self, path: impl AsRef<Path>, record: &SkinRecord) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.save(record)?;
        let file = File::create(path).map_err(|e| Error::from_io(e, path))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&bytes)?;
        writer.flush()?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "record written");
        Ok(())
    }

    /// Read and decode the record at `path`.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<SkinRecord> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| Error::from_io(e, path))?;
        let size = file.metadata()?.len();
        if size < HEADER_SIZE as u64 {
            return Err(Error::UnexpectedEof(size));
        }

        #[cfg(feature = "mmap")]
        if self.use_mmap {
            // Safety: the file is opened read-only and only read while mapped.
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
            return self.load(&mmap);
        }

        let mut data = Vec::with_capacity(size as usize);
        file.read_to_end(&mut data)?;
        self.load(&data)
    }
}
