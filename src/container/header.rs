//! Container file header
//!
//! The header is the first section of a container file:
//! - Magic bytes (`Obj\x01`)
//! - Metadata map (`map<bytes>`), including the writer schema and codec
//! - 16-byte sync marker repeated after every block

use std::io::Read;

use tracing::trace;

use super::io::{read_bytes, read_exact, read_long_required, read_string};
use crate::binary::Encoder;
use crate::codec::Codec;
use crate::error::ContainerError;
use crate::schema::{parse_schema, to_json, AvroSchema, RenderMode};

/// The magic bytes that identify a container file: "Obj" and version 1.
pub const MAGIC: [u8; 4] = [b'O', b'b', b'j', 0x01];

/// Length of the sync marker.
pub const SYNC_SIZE: usize = 16;

/// Metadata key holding the writer schema text.
pub const SCHEMA_KEY: &str = "avro.schema";

/// Metadata key holding the codec name.
pub const CODEC_KEY: &str = "avro.codec";

/// Prefix reserved for format-defined metadata keys.
pub const RESERVED_PREFIX: &str = "avro.";

pub type SyncMarker = [u8; SYNC_SIZE];

/// Parsed container file header.
#[derive(Debug, Clone)]
pub struct Header {
    schema: AvroSchema,
    codec: Codec,
    /// All metadata entries in file order, reserved keys included.
    metadata: Vec<(String, Vec<u8>)>,
    sync_marker: SyncMarker,
    /// Encoded length of the header; blocks start at this offset.
    size: u64,
}

impl Header {
    /// Build the header for a new file.
    ///
    /// User metadata keys must not use the reserved `avro.` prefix; the
    /// writer configuration enforces this before calling here.
    pub(crate) fn new(
        schema: &AvroSchema,
        codec: Codec,
        user_metadata: &[(String, Vec<u8>)],
        sync_marker: SyncMarker,
    ) -> Self {
        let mut metadata = Vec::with_capacity(user_metadata.len() + 2);
        // Full rendering keeps logical types, defaults and aliases for readers
        // of this file. Compatibility checks compare canonical forms instead.
        metadata.push((
            SCHEMA_KEY.to_string(),
            to_json(schema, RenderMode::Full).into_bytes(),
        ));
        metadata.push((CODEC_KEY.to_string(), codec.name().as_bytes().to_vec()));
        metadata.extend(user_metadata.iter().cloned());

        let mut header = Self {
            schema: schema.clone(),
            codec,
            metadata,
            sync_marker,
            size: 0,
        };
        header.size = header.to_bytes().len() as u64;
        header
    }

    /// Read and validate a header from the start of a stream.
    ///
    /// # Errors
    /// - `ContainerError::InvalidMagic` if the magic bytes don't match
    /// - `ContainerError::Parse` if the metadata or sync marker is truncated
    /// - `ContainerError::Metadata` if the schema entry is missing or not UTF-8
    /// - `ContainerError::Schema` if the schema text is invalid
    /// - `ContainerError::Codec` if the codec is unknown
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, ContainerError> {
        let mut offset = 0u64;

        let mut magic = [0u8; 4];
        read_exact(reader, &mut magic, &mut offset)?;
        if magic != MAGIC {
            return Err(ContainerError::InvalidMagic(magic));
        }

        let mut metadata = Vec::new();
        loop {
            let count = read_long_required(reader, &mut offset)?;
            if count == 0 {
                break;
            }
            if count < 0 {
                let _block_size = read_long_required(reader, &mut offset)?;
            }
            for _ in 0..count.unsigned_abs() {
                let key = read_string(reader, &mut offset)?;
                let value = read_bytes(reader, &mut offset)?;
                trace!(key = %key, len = value.len(), "Header metadata entry");
                metadata.push((key, value));
            }
        }

        let mut sync_marker = [0u8; SYNC_SIZE];
        read_exact(reader, &mut sync_marker, &mut offset)?;

        let schema = Self::extract_schema(&metadata)?;
        let codec = match lookup(&metadata, CODEC_KEY) {
            Some(name) => {
                let name = std::str::from_utf8(name).map_err(|e| {
                    ContainerError::Metadata(format!("Codec name is not valid UTF-8: {}", e))
                })?;
                Codec::from_name(name)?
            }
            None => Codec::Null,
        };

        Ok(Self {
            schema,
            codec,
            metadata,
            sync_marker,
            size: offset,
        })
    }

    fn extract_schema(metadata: &[(String, Vec<u8>)]) -> Result<AvroSchema, ContainerError> {
        let bytes = lookup(metadata, SCHEMA_KEY)
            .ok_or_else(|| ContainerError::Metadata(format!("Missing '{}'", SCHEMA_KEY)))?;
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ContainerError::Metadata(format!("Schema is not valid UTF-8: {}", e)))?;
        Ok(parse_schema(text)?)
    }

    /// Encode the header.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut encoder = Encoder::new();
        encoder.write_fixed(&MAGIC);
        encoder.write_block_count(self.metadata.len());
        for (key, value) in &self.metadata {
            encoder.write_string(key);
            encoder.write_bytes(value);
        }
        encoder.write_block_end();
        encoder.write_fixed(&self.sync_marker);
        encoder.as_bytes().to_vec()
    }

    /// The writer schema recorded in the file.
    pub fn schema(&self) -> &AvroSchema {
        &self.schema
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn sync_marker(&self) -> &SyncMarker {
        &self.sync_marker
    }

    /// Offset of the first block.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Raw metadata value by key, reserved keys included.
    pub fn metadata(&self, key: &str) -> Option<&[u8]> {
        lookup(&self.metadata, key)
    }

    /// Metadata value as UTF-8 text.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata(key).and_then(|v| std::str::from_utf8(v).ok())
    }

    /// Metadata entries outside the reserved `avro.` namespace.
    pub fn user_metadata(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.metadata
            .iter()
            .filter(|(k, _)| !k.starts_with(RESERVED_PREFIX))
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

fn lookup<'a>(metadata: &'a [(String, Vec<u8>)], key: &str) -> Option<&'a [u8]> {
    metadata
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_slice())
}
