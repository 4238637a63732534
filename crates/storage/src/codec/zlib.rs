//! Zlib codec.
//!
//! Used for records whose `compression` column is `"zlib"`, which is how the
//! game writes overmap blobs.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::traits::{CodecError, StorageCodec};

/// `compression` column value for zlib payloads
pub const ZLIB_COLUMN: &str = "zlib";

/// Zlib codec at the default compression level.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZlibCodec;

impl StorageCodec for ZlibCodec {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
        encoder
            .write_all(data)
            .map_err(|e| CodecError::EncodeError(format!("zlib compression failed: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| CodecError::EncodeError(format!("zlib compression failed: {}", e)))
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut decoder = ZlibDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| CodecError::DecodeError(format!("zlib decompression failed: {}", e)))?;
        Ok(decompressed)
    }

    fn column_value(&self) -> Option<&'static str> {
        Some(ZLIB_COLUMN)
    }
}
