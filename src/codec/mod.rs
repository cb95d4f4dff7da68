//! Compression codec support for container blocks
//!
//! A container file names its codec in the `avro.codec` metadata entry.
//! Every block payload is compressed independently with that codec.

use crate::error::CodecError;

#[cfg(feature = "deflate")]
use flate2::read::DeflateDecoder;
#[cfg(feature = "deflate")]
use flate2::write::DeflateEncoder;
#[cfg(feature = "deflate")]
use flate2::Compression;
#[cfg(feature = "deflate")]
use std::io::{Read, Write};

/// Compression codec used within container blocks
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    /// Payload stored as is
    #[default]
    Null,
    /// Raw deflate (RFC 1951, no zlib header)
    Deflate,
}

impl Codec {
    /// Parse a codec from its name as found in file metadata.
    ///
    /// # Examples
    /// ```
    /// use avrokit::codec::Codec;
    ///
    /// assert_eq!(Codec::from_name("deflate").unwrap(), Codec::Deflate);
    ///
    /// let err = Codec::from_name("snappy").unwrap_err();
    /// assert!(err.to_string().contains("snappy"));
    /// ```
    pub fn from_name(name: &str) -> Result<Self, CodecError> {
        match name {
            "null" => Ok(Codec::Null),
            "deflate" => Ok(Codec::Deflate),
            other => Err(CodecError::UnsupportedCodec(format!(
                "'{}' (expected 'null' or 'deflate')",
                other
            ))),
        }
    }

    /// The name written to file metadata.
    pub fn name(&self) -> &'static str {
        match self {
            Codec::Null => "null",
            Codec::Deflate => "deflate",
        }
    }

    /// Compress one block payload.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        match self {
            Codec::Null => Ok(data.to_vec()),
            #[cfg(feature = "deflate")]
            Codec::Deflate => compress_deflate(data),
            #[cfg(not(feature = "deflate"))]
            Codec::Deflate => Err(deflate_disabled()),
        }
    }

    /// Decompress one block payload.
    ///
    /// For the null codec this is a copy of the input.
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        match self {
            Codec::Null => Ok(data.to_vec()),
            #[cfg(feature = "deflate")]
            Codec::Deflate => decompress_deflate(data),
            #[cfg(not(feature = "deflate"))]
            Codec::Deflate => Err(deflate_disabled()),
        }
    }
}

#[cfg(not(feature = "deflate"))]
fn deflate_disabled() -> CodecError {
    CodecError::UnsupportedCodec("deflate (built without the 'deflate' feature)".to_string())
}

#[cfg(feature = "deflate")]
fn compress_deflate(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = DeflateEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    let failed = |e: std::io::Error| {
        CodecError::CompressionError(format!("Deflate compression failed: {}", e))
    };
    encoder.write_all(data).map_err(failed)?;
    encoder.finish().map_err(failed)
}

#[cfg(feature = "deflate")]
fn decompress_deflate(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(data.len().saturating_mul(2));
    if !data.is_empty() {
        DeflateDecoder::new(data)
            .read_to_end(&mut out)
            .map_err(|e| CodecError::DecompressionError(format!("Invalid deflate block: {}", e)))?;
    }
    Ok(out)
}
