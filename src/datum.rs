//! Single-value readers and writers.
//!
//! ```ignore
//! let schema = parse_schema(r#"{"type": "array", "items": "long"}"#)?;
//! let writer = DatumWriter::new(&schema)?;
//! let mut encoder = Encoder::new();
//! writer.write(&mut encoder, &AvroValue::Array(vec![AvroValue::Long(1)]))?;
//!
//! let reader = DatumReader::new(&schema)?;
//! let value = reader.read(&mut Decoder::new(encoder.as_bytes()))?;
//! ```

use std::sync::Arc;

use crate::binary::{Decoder, Encoder};
use crate::error::{DecodeError, EncodeError, ResolveError};
use crate::resolve::{ResolvedReader, ResolvedWriter, Resolver};
use crate::schema::AvroSchema;
use crate::value::AvroValue;

/// Reads values written with a writer schema as values of a reader schema.
#[derive(Debug, Clone)]
pub struct DatumReader {
    resolved: Arc<ResolvedReader>,
}

impl DatumReader {
    /// Reader for data written with `schema` itself.
    pub fn new(schema: &AvroSchema) -> Result<Self, ResolveError> {
        Self::with_schemas(schema, schema)
    }

    /// Reader for data written with `writer` and read as `reader`.
    ///
    /// Fails here, before any data is touched, if the schemas do not resolve.
    pub fn with_schemas(reader: &AvroSchema, writer: &AvroSchema) -> Result<Self, ResolveError> {
        Ok(Self {
            resolved: Arc::new(ResolvedReader::new(reader, writer)?),
        })
    }

    /// Like [`DatumReader::with_schemas`], reusing `resolver`'s cache.
    pub fn with_resolver(
        resolver: &mut Resolver,
        reader: &AvroSchema,
        writer: &AvroSchema,
    ) -> Result<Self, ResolveError> {
        Ok(Self {
            resolved: resolver.resolve(reader, writer)?,
        })
    }

    pub fn reader_schema(&self) -> &AvroSchema {
        self.resolved.reader_schema()
    }

    pub fn writer_schema(&self) -> &AvroSchema {
        self.resolved.writer_schema()
    }

    pub fn read(&self, decoder: &mut Decoder<'_>) -> Result<AvroValue, DecodeError> {
        self.resolved.decode(decoder)
    }

    pub fn skip(&self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
        self.resolved.skip(decoder)
    }
}

/// Writes values of a writer schema.
#[derive(Debug, Clone)]
pub struct DatumWriter {
    resolved: Arc<ResolvedWriter>,
}

impl DatumWriter {
    pub fn new(schema: &AvroSchema) -> Result<Self, ResolveError> {
        Ok(Self {
            resolved: Arc::new(ResolvedWriter::new(schema)?),
        })
    }

    pub fn with_resolver(resolver: &mut Resolver, schema: &AvroSchema) -> Result<Self, ResolveError> {
        Ok(Self {
            resolved: resolver.resolve_writer(schema)?,
        })
    }

    pub fn schema(&self) -> &AvroSchema {
        self.resolved.schema()
    }

    pub fn write(&self, encoder: &mut Encoder, value: &AvroValue) -> Result<(), EncodeError> {
        self.resolved.encode(encoder, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_schema;

    #[test]
    fn test_write_then_read_and_skip() {
        let schema = parse_schema(r#"{"type": "map", "values": ["null", "double"]}"#).unwrap();
        let writer = DatumWriter::new(&schema).unwrap();
        let reader = DatumReader::new(&schema).unwrap();

        let value = AvroValue::Map(vec![
            ("a".to_string(), AvroValue::Double(1.0)),
            ("b".to_string(), AvroValue::Null),
        ]);
        let mut encoder = Encoder::new();
        writer.write(&mut encoder, &value).unwrap();
        writer.write(&mut encoder, &value).unwrap();

        let mut decoder = Decoder::new(encoder.as_bytes());
        reader.skip(&mut decoder).unwrap();
        let AvroValue::Map(entries) = reader.read(&mut decoder).unwrap() else {
            panic!("expected map");
        };
        assert!(decoder.is_empty());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].1.unwrap_union(), &AvroValue::Double(1.0));
        assert_eq!(entries[1].1.unwrap_union(), &AvroValue::Null);
    }

    #[test]
    fn test_unresolvable_pair_fails_at_construction() {
        let reader = parse_schema(r#""int""#).unwrap();
        let writer = parse_schema(r#""double""#).unwrap();
        assert!(DatumReader::with_schemas(&reader, &writer).is_err());
    }

    #[test]
    fn test_readers_share_resolver_cache() {
        let schema = parse_schema(r#""string""#).unwrap();
        let mut resolver = Resolver::new();
        let _a = DatumReader::with_resolver(&mut resolver, &schema, &schema).unwrap();
        let _b = DatumReader::with_resolver(&mut resolver, &schema, &schema).unwrap();
        let _w = DatumWriter::with_resolver(&mut resolver, &schema).unwrap();
        assert_eq!(resolver.len(), 2);
    }
}
