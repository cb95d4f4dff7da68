//! Container file writer
//!
//! Records are encoded into an in-memory block and written out as a whole
//! block once a record or byte limit is reached, or on `flush`/`close`.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use super::block::write_block;
use super::header::{Header, SyncMarker, RESERVED_PREFIX};
use crate::binary::Encoder;
use crate::codec::Codec;
use crate::datum::DatumWriter;
use crate::error::ContainerError;
use crate::schema::AvroSchema;
use crate::value::AvroValue;

const INITIAL_BUFFER_SIZE: usize = 64 * 1024;

/// Configuration for a [`ContainerWriter`].
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Block compression codec (default: null).
    pub codec: Codec,
    /// Flush once a block holds this many records (default: 4000).
    pub max_block_records: usize,
    /// Flush once a block's encoded size reaches this many bytes (default: 64 KiB).
    pub max_block_bytes: usize,
    /// User metadata written to the header. Keys must not start with `avro.`.
    pub metadata: Vec<(String, Vec<u8>)>,
    /// Sync marker to use (default: None, random).
    pub sync_marker: Option<SyncMarker>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            codec: Codec::Null,
            max_block_records: 4000,
            max_block_bytes: 64 * 1024,
            metadata: Vec::new(),
            sync_marker: None,
        }
    }
}

impl WriterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Set the record limit per block. Zero is treated as one.
    pub fn with_max_block_records(mut self, records: usize) -> Self {
        self.max_block_records = records.max(1);
        self
    }

    pub fn with_max_block_bytes(mut self, bytes: usize) -> Self {
        self.max_block_bytes = bytes;
        self
    }

    /// Add a user metadata entry, replacing any earlier value for `key`.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        let key = key.into();
        self.metadata.retain(|(k, _)| *k != key);
        self.metadata.push((key, value.into()));
        self
    }

    pub fn with_sync_marker(mut self, sync_marker: SyncMarker) -> Self {
        self.sync_marker = Some(sync_marker);
        self
    }

    fn validate(&self) -> Result<(), ContainerError> {
        if let Some((key, _)) = self
            .metadata
            .iter()
            .find(|(k, _)| k.starts_with(RESERVED_PREFIX))
        {
            return Err(ContainerError::Metadata(format!(
                "Key '{}' uses the reserved '{}' prefix",
                key, RESERVED_PREFIX
            )));
        }
        Ok(())
    }
}

/// Writes records to a container file.
///
/// Call [`ContainerWriter::close`] when done; buffered records are not
/// written on drop.
#[derive(Debug)]
pub struct ContainerWriter<W: Write> {
    inner: W,
    header: Header,
    datum: DatumWriter,
    buffer: Encoder,
    pending: usize,
    max_block_records: usize,
    max_block_bytes: usize,
    records_written: u64,
    blocks_written: usize,
}

impl ContainerWriter<BufWriter<File>> {
    /// Create (or truncate) a file and write its header.
    pub fn create(
        path: impl AsRef<Path>,
        schema: &AvroSchema,
        config: WriterConfig,
    ) -> Result<Self, ContainerError> {
        let file = File::create(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "Creating container file");
        Self::with_config(BufWriter::new(file), schema, config)
    }
}

impl ContainerWriter<File> {
    /// Open an existing file for appending. See [`ContainerWriter::append_to`].
    pub fn open_append(
        path: impl AsRef<Path>,
        schema: &AvroSchema,
        config: WriterConfig,
    ) -> Result<Self, ContainerError> {
        let file = OpenOptions::new().read(true).write(true).open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "Appending to container file");
        Self::append_to(file, schema, config)
    }
}

impl<W: Write> ContainerWriter<W> {
    /// Write a header for `schema` with default settings.
    pub fn new(inner: W, schema: &AvroSchema) -> Result<Self, ContainerError> {
        Self::with_config(inner, schema, WriterConfig::default())
    }

    /// Write a header for `schema` and prepare to append records.
    ///
    /// # Errors
    /// - `ContainerError::Metadata` if a user metadata key is reserved
    /// - `ContainerError::Resolve` if the schema cannot be compiled
    /// - `ContainerError::Io` if the header cannot be written
    pub fn with_config(
        mut inner: W,
        schema: &AvroSchema,
        config: WriterConfig,
    ) -> Result<Self, ContainerError> {
        config.validate()?;
        let datum = DatumWriter::new(schema)?;
        let sync_marker = config.sync_marker.unwrap_or_else(rand::random);
        let header = Header::new(schema, config.codec, &config.metadata, sync_marker);
        inner.write_all(&header.to_bytes())?;

        debug!(
            codec = config.codec.name(),
            fingerprint = %format!("{:016x}", schema.fingerprint()),
            "Wrote container header"
        );

        Ok(Self::from_parts(inner, header, datum, &config))
    }

    fn from_parts(inner: W, header: Header, datum: DatumWriter, config: &WriterConfig) -> Self {
        Self {
            inner,
            header,
            datum,
            buffer: Encoder::with_capacity(config.max_block_bytes.min(INITIAL_BUFFER_SIZE)),
            pending: 0,
            max_block_records: config.max_block_records.max(1),
            max_block_bytes: config.max_block_bytes,
            records_written: 0,
            blocks_written: 0,
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn schema(&self) -> &AvroSchema {
        self.datum.schema()
    }

    pub fn sync_marker(&self) -> &SyncMarker {
        self.header.sync_marker()
    }

    /// Records written out in completed blocks.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Records buffered for the next block.
    pub fn pending_records(&self) -> usize {
        self.pending
    }

    pub fn blocks_written(&self) -> usize {
        self.blocks_written
    }

    /// Encode one record into the current block.
    ///
    /// A record that fails to encode leaves the block unchanged.
    pub fn append(&mut self, value: &AvroValue) -> Result<(), ContainerError> {
        let mark = self.buffer.len();
        if let Err(e) = self.datum.write(&mut self.buffer, value) {
            self.buffer.truncate(mark);
            return Err(e.into());
        }
        self.pending += 1;

        if self.pending >= self.max_block_records || self.buffer.len() >= self.max_block_bytes {
            self.flush_block()?;
        }
        Ok(())
    }

    /// Append every value from an iterator.
    pub fn extend<'a>(
        &mut self,
        values: impl IntoIterator<Item = &'a AvroValue>,
    ) -> Result<(), ContainerError> {
        for value in values {
            self.append(value)?;
        }
        Ok(())
    }

    /// Write buffered records as one block. Does nothing if none are buffered.
    pub fn flush_block(&mut self) -> Result<(), ContainerError> {
        if self.pending == 0 {
            return Ok(());
        }
        let written = write_block(
            &mut self.inner,
            self.header.codec(),
            self.pending,
            self.buffer.as_bytes(),
            self.header.sync_marker(),
        )?;

        debug!(
            block_index = self.blocks_written,
            records = self.pending,
            bytes = self.buffer.len(),
            written,
            "Flushed block"
        );

        self.records_written += self.pending as u64;
        self.blocks_written += 1;
        self.pending = 0;
        self.buffer.clear();
        Ok(())
    }

    /// Write buffered records and flush the underlying stream.
    pub fn flush(&mut self) -> Result<(), ContainerError> {
        self.flush_block()?;
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and return the underlying stream.
    pub fn close(mut self) -> Result<W, ContainerError> {
        self.flush()?;
        Ok(self.inner)
    }
}

impl<W: Read + Write + Seek> ContainerWriter<W> {
    /// Continue writing to an existing container.
    ///
    /// The file's codec and sync marker are reused; those settings in
    /// `config` are ignored.
    ///
    /// # Errors
    /// - Header errors from [`Header::read_from`]
    /// - `ContainerError::IncompatibleSchema` if the canonical form of the
    ///   file's schema differs from `schema`
    pub fn append_to(
        mut inner: W,
        schema: &AvroSchema,
        config: WriterConfig,
    ) -> Result<Self, ContainerError> {
        inner.seek(SeekFrom::Start(0))?;
        let header = Header::read_from(&mut inner)?;

        let file = header.schema().canonical_form();
        let writer = schema.canonical_form();
        if file != writer {
            return Err(ContainerError::IncompatibleSchema { file, writer });
        }

        let datum = DatumWriter::new(schema)?;
        let end = inner.seek(SeekFrom::End(0))?;
        debug!(
            codec = header.codec().name(),
            offset = end,
            "Reopened container for append"
        );

        Ok(Self::from_parts(inner, header, datum, &config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerReader;
    use crate::container::SYNC_SIZE;
    use crate::schema::parse_schema;
    use std::io::Cursor;

    #[test]
    fn test_config_defaults() {
        let config = WriterConfig::default();
        assert_eq!(config.codec, Codec::Null);
        assert_eq!(config.max_block_records, 4000);
        assert_eq!(config.max_block_bytes, 64 * 1024);
        assert!(config.sync_marker.is_none());
    }

    #[test]
    fn test_reserved_metadata_rejected() {
        let config = WriterConfig::new().with_metadata("avro.custom", "x");
        assert!(matches!(
            ContainerWriter::with_config(Vec::new(), &AvroSchema::Int, config),
            Err(ContainerError::Metadata(_))
        ));
    }

    #[test]
    fn test_user_metadata_written() {
        let config = WriterConfig::new()
            .with_metadata("owner", "a")
            .with_metadata("owner", "b");
        let writer = ContainerWriter::with_config(Vec::new(), &AvroSchema::Int, config).unwrap();
        let file = writer.close().unwrap();
        let reader = ContainerReader::new(file.as_slice()).unwrap();
        assert_eq!(reader.header().metadata_str("owner"), Some("b"));
        assert_eq!(reader.header().metadata_str("avro.codec"), Some("null"));
    }

    #[test]
    fn test_byte_limit_flushes() {
        let config = WriterConfig::new().with_max_block_bytes(8);
        let mut writer =
            ContainerWriter::with_config(Vec::new(), &AvroSchema::String, config).unwrap();
        writer.append(&AvroValue::String("0123456789".into())).unwrap();
        assert_eq!(writer.blocks_written(), 1);
        assert_eq!(writer.pending_records(), 0);
        writer.append(&AvroValue::String("x".into())).unwrap();
        assert_eq!(writer.pending_records(), 1);
    }

    #[test]
    fn test_failed_append_leaves_block_unchanged() {
        let schema = parse_schema(
            r#"{"type": "record", "name": "P", "fields": [
                {"name": "a", "type": "int"}, {"name": "b", "type": "string"}]}"#,
        )
        .unwrap();
        let mut writer = ContainerWriter::new(Vec::new(), &schema).unwrap();
        let bad = AvroValue::Int(1);
        assert!(writer.append(&bad).is_err());
        assert_eq!(writer.pending_records(), 0);
        let file = writer.close().unwrap();
        assert_eq!(ContainerReader::new(file.as_slice()).unwrap().count(), 0);
    }

    #[test]
    fn test_append_to_existing() {
        let sync = [9u8; SYNC_SIZE];
        let config = WriterConfig::new().with_sync_marker(sync);
        let mut writer = ContainerWriter::with_config(Vec::new(), &AvroSchema::Long, config).unwrap();
        writer.append(&AvroValue::Long(1)).unwrap();
        let file = writer.close().unwrap();

        let mut writer =
            ContainerWriter::append_to(Cursor::new(file), &AvroSchema::Long, WriterConfig::new())
                .unwrap();
        assert_eq!(writer.sync_marker(), &sync);
        writer.append(&AvroValue::Long(2)).unwrap();
        let file = writer.close().unwrap().into_inner();

        let values: Vec<AvroValue> = ContainerReader::new(file.as_slice())
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(values, vec![AvroValue::Long(1), AvroValue::Long(2)]);
    }

    #[test]
    fn test_append_incompatible_schema() {
        let file = ContainerWriter::new(Vec::new(), &AvroSchema::Long)
            .unwrap()
            .close()
            .unwrap();
        assert!(matches!(
            ContainerWriter::append_to(Cursor::new(file), &AvroSchema::Int, WriterConfig::new()),
            Err(ContainerError::IncompatibleSchema { .. })
        ));
    }
}
