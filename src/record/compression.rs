//! zlib compression of record bodies.
//!
//! Compressed layout: `[uncompressed_size: u64 LE][zlib stream]`.

use std::io::{Read, Write};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::util::{Error, Result};

/// Compress a record body.
///
/// # Arguments
/// * `data` - Body bytes
/// * `level` - Compression level (0-9, where 0 disables compression)
///
/// Returns `None` when compression is disabled or would not save space.
pub fn compress(data: &[u8], level: u32) -> Result<Option<Vec<u8>>> {
    if level == 0 || data.is_empty() {
        return Ok(None);
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level.min(9)));
    encoder.write_all(data)?;
    let compressed = encoder.finish()?;

    if compressed.len() + 8 >= data.len() {
        return Ok(None);
    }

    let mut result = Vec::with_capacity(8 + compressed.len());
    result.extend_from_slice(&(data.len() as u64).to_le_bytes());
    result.extend_from_slice(&compressed);
    Ok(Some(result))
}

/// Decompress a body produced by [`compress`].
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 8 {
        return Err(Error::UnexpectedEof(data.len() as u64));
    }

    let mut size_bytes = [0u8; 8];
    size_bytes.copy_from_slice(&data[..8]);
    let uncompressed_size = u64::from_le_bytes(size_bytes);

    // Guard the preallocation against corrupt headers.
    let capacity = uncompressed_size.min(1024 * 1024 * 1024) as usize;
    // One byte past the declared size is enough to detect an oversized stream.
    let mut decoder = ZlibDecoder::new(&data[8..]).take(uncompressed_size.saturating_add(1));
    let mut decompressed = Vec::with_capacity(capacity);
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| Error::malformed(format!("corrupt compressed body: {e}")))?;

    if decompressed.len() as u64 != uncompressed_size {
        return Err(Error::malformed(format!(
            "decompressed body is {} bytes, header says {}",
            decompressed.len(),
            uncompressed_size
        )));
    }
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_decompress() {
        let original = b"Hello, World! This is a test of compression. ".repeat(100);
        let compressed = compress(&original, 6).unwrap().expect("should compress");
        assert!(compressed.len() < original.len());
        assert_eq!(decompress(&compressed).unwrap(), original);
    }

    #[test]
    fn test_level_zero_and_incompressible() {
        assert!(compress(b"abc", 0).unwrap().is_none());
        assert!(compress(b"abc", 9).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_body() {
        assert!(matches!(decompress(&[1, 2]), Err(Error::UnexpectedEof(2))));
        let mut bad = 10u64.to_le_bytes().to_vec();
        bad.extend_from_slice(b"not zlib");
        assert!(matches!(decompress(&bad), Err(Error::MalformedRecord(_))));
    }

    #[test]
    fn test_stream_larger_than_declared() {
        let original = vec![0u8; 1 << 20];
        let mut compressed = compress(&original, 9).unwrap().expect("should compress");
        compressed[..8].copy_from_slice(&16u64.to_le_bytes());
        let err = decompress(&compressed).unwrap_err();
        assert!(err.to_string().contains("17 bytes"), "{err}");
    }
}
