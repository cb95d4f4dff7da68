//! Container data blocks
//!
//! Each block holds a batch of records encoded and compressed together:
//! - Record count (long)
//! - Compressed payload size (long)
//! - Compressed payload
//! - 16-byte sync marker, equal to the header's

use std::io::{Read, Write};

use bytes::Bytes;
use tracing::{trace, warn};

use super::header::{SyncMarker, SYNC_SIZE};
use super::io::{read_exact, read_long, read_long_required, read_vec};
use crate::binary::{Decoder, Encoder};
use crate::codec::Codec;
use crate::datum::DatumReader;
use crate::error::ContainerError;
use crate::value::AvroValue;

/// A single decompressed data block.
///
/// Blocks are the unit of random access in a container file: a reader can
/// hand whole blocks to other workers without decoding them first.
#[derive(Debug, Clone)]
pub struct Block {
    index: usize,
    offset: u64,
    count: usize,
    data: Bytes,
}

impl Block {
    /// Sequential block number (0-indexed).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Byte offset of the block's record count in the file.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of records in the block.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Decompressed record payload.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Decode every record in the block.
    ///
    /// # Errors
    /// Returns `ContainerError::Decode` carrying the block and record index
    /// of the first record that fails.
    pub fn decode(&self, reader: &DatumReader) -> Result<Vec<AvroValue>, ContainerError> {
        let mut decoder = Decoder::new(&self.data);
        let mut values = Vec::with_capacity(self.count.min(self.data.len()));
        for record_index in 0..self.count {
            let value = reader
                .read(&mut decoder)
                .map_err(|source| ContainerError::Decode {
                    block_index: self.index,
                    record_index,
                    source,
                })?;
            values.push(value);
        }
        Ok(values)
    }

    /// Read the next block from `reader`, positioned at a block boundary.
    ///
    /// Returns `Ok(None)` at a clean end of file.
    ///
    /// # Arguments
    /// * `reader` - Stream positioned at the block's record count
    /// * `codec` - Codec named in the file header
    /// * `sync_marker` - Sync marker from the file header
    /// * `index` - Sequential number for this block
    /// * `offset` - Current stream offset, advanced past the block
    ///
    /// # Errors
    /// - `ContainerError::Parse` if the framing is malformed or truncated
    /// - `ContainerError::Codec` if decompression fails
    /// - `ContainerError::InvalidSyncMarker` if the trailing marker differs
    pub(crate) fn read_from<R: Read>(
        reader: &mut R,
        codec: Codec,
        sync_marker: &SyncMarker,
        index: usize,
        offset: &mut u64,
    ) -> Result<Option<Self>, ContainerError> {
        let block_offset = *offset;
        let Some(count) = read_long(reader, offset)? else {
            return Ok(None);
        };
        let count = usize::try_from(count).map_err(|_| ContainerError::Parse {
            offset: block_offset,
            message: format!("negative record count {} in block {}", count, index),
        })?;

        let size_offset = *offset;
        let size = read_long_required(reader, offset)?;
        let size = usize::try_from(size).map_err(|_| ContainerError::Parse {
            offset: size_offset,
            message: format!("negative block size {} in block {}", size, index),
        })?;

        let compressed = read_vec(reader, size, offset)?;

        let sync_offset = *offset;
        let mut sync = [0u8; SYNC_SIZE];
        read_exact(reader, &mut sync, offset)?;
        if &sync != sync_marker {
            warn!(
                block_index = index,
                offset = sync_offset,
                "Sync marker mismatch, file is corrupt"
            );
            return Err(ContainerError::InvalidSyncMarker {
                block_index: index,
                offset: sync_offset,
            });
        }

        let data = codec.decompress(&compressed)?;
        trace!(
            block_index = index,
            records = count,
            compressed = size,
            decompressed = data.len(),
            "Read block"
        );

        Ok(Some(Self {
            index,
            offset: block_offset,
            count,
            data: Bytes::from(data),
        }))
    }
}

/// Compress and write one block with a single `write_all`.
///
/// Returns the number of bytes written.
pub(crate) fn write_block<W: Write>(
    writer: &mut W,
    codec: Codec,
    count: usize,
    payload: &[u8],
    sync_marker: &SyncMarker,
) -> Result<usize, ContainerError> {
    let compressed = codec.compress(payload)?;

    let mut frame = Encoder::with_capacity(compressed.len() + 2 * 10 + SYNC_SIZE);
    frame.write_long(count as i64);
    frame.write_long(compressed.len() as i64);
    frame.write_fixed(&compressed);
    frame.write_fixed(sync_marker);

    writer.write_all(frame.as_bytes())?;
    Ok(frame.len())
}
