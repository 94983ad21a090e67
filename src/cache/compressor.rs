//! Compression adapter for large values.
//!
//! Values are serialized to JSON and handed to a pluggable [`Compressor`].
//! Compression is best-effort: the cache falls back to storing the raw value
//! whenever a codec fails or does not shrink the payload.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Codec failed: {0}")]
    Codec(#[from] std::io::Error),

    #[error("Value (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Compressed payload is empty")]
    Empty,
}

/// A byte-level compression strategy.
pub trait Compressor: Send + Sync {
    /// Short codec name for logs.
    fn name(&self) -> &'static str;

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError>;

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError>;
}

/// zstd at a fixed level.
#[derive(Debug, Clone)]
pub struct ZstdCompressor {
    level: i32,
}

impl ZstdCompressor {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Compressor for ZstdCompressor {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let compressed = zstd::encode_all(data, self.level)?;
        Ok(compressed)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        if data.is_empty() {
            return Err(CompressionError::Empty);
        }
        let decompressed = zstd::decode_all(data)?;
        Ok(decompressed)
    }
}

/// Identity codec. Never shrinks anything, so values stay raw.
#[derive(Debug, Clone, Default)]
pub struct PassthroughCompressor;

impl Compressor for PassthroughCompressor {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        Ok(data.to_vec())
    }
}

/// Serialize a value into the byte form used for sizing and compression.
pub fn encode_value<V: Serialize>(value: &V) -> Result<Vec<u8>, CompressionError> {
    Ok(serde_json::to_vec(value)?)
}

/// Reverse of compress-after-[`encode_value`].
pub fn decode_value<V: DeserializeOwned>(
    compressor: &dyn Compressor,
    data: &[u8],
) -> Result<V, CompressionError> {
    let raw = compressor.decompress(data)?;
    Ok(serde_json::from_slice(&raw)?)
}
