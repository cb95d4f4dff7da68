//! Forward-only container file reader
//!
//! `ContainerReader` reads the header once, then yields records block by
//! block. Records are decoded lazily from the current block; only one
//! decompressed block is held in memory at a time.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use super::block::Block;
use super::header::{Header, SYNC_SIZE};
use crate::binary::{Decoder, DEFAULT_MAX_COLLECTION_ITEMS};
use crate::datum::DatumReader;
use crate::error::ContainerError;
use crate::schema::AvroSchema;
use crate::value::AvroValue;

const SCAN_CHUNK_SIZE: usize = 8 * 1024;

/// Configuration for a [`ContainerReader`].
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Optional reader schema for schema evolution (default: None, read
    /// with the writer schema).
    pub reader_schema: Option<AvroSchema>,
    /// Most items a single array or map may declare
    /// (default: [`DEFAULT_MAX_COLLECTION_ITEMS`]).
    pub max_collection_items: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            reader_schema: None,
            max_collection_items: DEFAULT_MAX_COLLECTION_ITEMS,
        }
    }
}

impl ReaderConfig {
    /// Create a new ReaderConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reader schema for schema evolution.
    pub fn with_reader_schema(mut self, schema: AvroSchema) -> Self {
        self.reader_schema = Some(schema);
        self
    }

    pub fn with_max_collection_items(mut self, limit: usize) -> Self {
        self.max_collection_items = limit;
        self
    }
}

#[derive(Debug)]
struct CurrentBlock {
    block: Block,
    position: usize,
    next_record: usize,
}

/// Reads records from a container file.
///
/// Iterating yields `Result<AvroValue, ContainerError>`. After the first
/// error the reader is poisoned: iteration ends and explicit calls return
/// `ContainerError::Poisoned`.
///
/// # Example
/// ```ignore
/// let reader = ContainerReader::open("events.avro")?;
/// for record in reader {
///     println!("{}", record?.to_json());
/// }
/// ```
#[derive(Debug)]
pub struct ContainerReader<R> {
    inner: R,
    header: Header,
    datum: DatumReader,
    offset: u64,
    blocks_read: usize,
    current: Option<CurrentBlock>,
    max_collection_items: usize,
    poisoned: bool,
}

impl ContainerReader<BufReader<File>> {
    /// Open a container file on the local filesystem.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ContainerError> {
        Self::open_with_config(path, ReaderConfig::default())
    }

    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: ReaderConfig,
    ) -> Result<Self, ContainerError> {
        let file = File::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "Opening container file");
        Self::with_config(BufReader::new(file), config)
    }
}

impl<R: Read> ContainerReader<R> {
    /// Read the header and prepare to read records with the writer schema.
    pub fn new(inner: R) -> Result<Self, ContainerError> {
        Self::with_config(inner, ReaderConfig::default())
    }

    /// Read the header and prepare to read records.
    ///
    /// # Errors
    /// - Header errors from [`Header::read_from`]
    /// - `ContainerError::Resolve` if the reader schema cannot read the
    ///   writer schema recorded in the file
    pub fn with_config(mut inner: R, config: ReaderConfig) -> Result<Self, ContainerError> {
        let header = Header::read_from(&mut inner)?;
        let reader_schema = config
            .reader_schema
            .unwrap_or_else(|| header.schema().clone());
        let datum = DatumReader::with_schemas(&reader_schema, header.schema())?;

        debug!(
            codec = header.codec().name(),
            fingerprint = %format!("{:016x}", header.schema().fingerprint()),
            header_size = header.size(),
            "Opened container"
        );

        Ok(Self {
            inner,
            offset: header.size(),
            header,
            datum,
            blocks_read: 0,
            current: None,
            max_collection_items: config.max_collection_items,
            poisoned: false,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Schema the records were written with.
    pub fn writer_schema(&self) -> &AvroSchema {
        self.header.schema()
    }

    /// Schema the records are materialized as.
    pub fn reader_schema(&self) -> &AvroSchema {
        self.datum.reader_schema()
    }

    /// Metadata value by key.
    pub fn metadata(&self, key: &str) -> Option<&[u8]> {
        self.header.metadata(key)
    }

    /// The compiled reader used for records, for decoding blocks elsewhere.
    pub fn datum_reader(&self) -> &DatumReader {
        &self.datum
    }

    /// Number of blocks read so far.
    pub fn blocks_read(&self) -> usize {
        self.blocks_read
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read the next whole block without decoding it.
    ///
    /// Records of a partially iterated block that were not yet returned
    /// are discarded.
    pub fn next_block(&mut self) -> Result<Option<Block>, ContainerError> {
        if self.poisoned {
            return Err(ContainerError::Poisoned);
        }
        self.current = None;
        self.read_block().inspect_err(|_| self.poisoned = true)
    }

    /// Read the next record.
    pub fn read_record(&mut self) -> Result<Option<AvroValue>, ContainerError> {
        if self.poisoned {
            return Err(ContainerError::Poisoned);
        }
        self.next_record().inspect_err(|_| self.poisoned = true)
    }

    fn read_block(&mut self) -> Result<Option<Block>, ContainerError> {
        let block = Block::read_from(
            &mut self.inner,
            self.header.codec(),
            self.header.sync_marker(),
            self.blocks_read,
            &mut self.offset,
        )?;
        if let Some(block) = &block {
            debug!(
                block_index = block.index(),
                records = block.count(),
                offset = block.offset(),
                "Read block"
            );
            self.blocks_read += 1;
        }
        Ok(block)
    }

    fn next_record(&mut self) -> Result<Option<AvroValue>, ContainerError> {
        loop {
            if let Some(current) = self.current.as_mut() {
                if current.next_record < current.block.count() {
                    let data = &current.block.data()[current.position..];
                    let mut decoder =
                        Decoder::new(data).with_max_collection_items(self.max_collection_items);
                    let value =
                        self.datum
                            .read(&mut decoder)
                            .map_err(|source| ContainerError::Decode {
                                block_index: current.block.index(),
                                record_index: current.next_record,
                                source,
                            })?;
                    current.position += decoder.position();
                    current.next_record += 1;
                    return Ok(Some(value));
                }
            }

            match self.read_block()? {
                Some(block) => {
                    self.current = Some(CurrentBlock {
                        block,
                        position: 0,
                        next_record: 0,
                    })
                }
                None => {
                    self.current = None;
                    return Ok(None);
                }
            }
        }
    }
}

impl<R: Read + Seek> ContainerReader<R> {
    /// Position the reader at the first block boundary after `offset`.
    ///
    /// An offset inside the header moves to the first block. Otherwise the
    /// stream is scanned forward from `offset` for the sync marker and
    /// reading resumes with the block that follows it. Returns `false`
    /// when no further marker exists; the reader is then at end of file.
    ///
    /// Block indices keep counting blocks read by this reader, so after a
    /// seek they no longer match positions in the file.
    pub fn seek_to_sync(&mut self, offset: u64) -> Result<bool, ContainerError> {
        if self.poisoned {
            return Err(ContainerError::Poisoned);
        }
        self.current = None;
        self.seek_inner(offset).inspect_err(|_| self.poisoned = true)
    }

    fn seek_inner(&mut self, offset: u64) -> Result<bool, ContainerError> {
        if offset <= self.header.size() {
            self.offset = self.inner.seek(SeekFrom::Start(self.header.size()))?;
            return Ok(true);
        }

        let sync = *self.header.sync_marker();
        let mut base = self.inner.seek(SeekFrom::Start(offset))?;
        let mut window: Vec<u8> = Vec::with_capacity(SCAN_CHUNK_SIZE + SYNC_SIZE);
        let mut chunk = vec![0u8; SCAN_CHUNK_SIZE];

        loop {
            let n = self.inner.read(&mut chunk)?;
            if n == 0 {
                self.offset = base + window.len() as u64;
                return Ok(false);
            }
            window.extend_from_slice(&chunk[..n]);

            if let Some(pos) = window.windows(SYNC_SIZE).position(|w| w == sync) {
                let next = base + (pos + SYNC_SIZE) as u64;
                self.offset = self.inner.seek(SeekFrom::Start(next))?;
                debug!(from = offset, to = next, "Seeked to block boundary");
                return Ok(true);
            }

            // Keep a tail so a marker split across reads is still found.
            let keep = window.len().min(SYNC_SIZE - 1);
            let drop = window.len() - keep;
            window.drain(..drop);
            base += drop as u64;
        }
    }
}

impl<R: Read> Iterator for ContainerReader<R> {
    type Item = Result<AvroValue, ContainerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.poisoned {
            return None;
        }
        self.read_record().transpose()
    }
}
