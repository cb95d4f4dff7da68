//! Schema-driven Avro binary encoding, schema resolution and object
//! container files.
//!
//! Schemas are parsed once and compiled into closure trees by the
//! [`Resolver`]; [`DatumReader`] and [`DatumWriter`] drive those trees over
//! a [`Decoder`] or [`Encoder`]. [`ContainerReader`] and [`ContainerWriter`]
//! read and write whole files.
//!
//! ```
//! use avrokit::{parse_schema, AvroValue, DatumReader, DatumWriter, Decoder, Encoder};
//!
//! let writer_schema = parse_schema(r#""int""#).unwrap();
//! let reader_schema = parse_schema(r#""long""#).unwrap();
//!
//! let mut encoder = Encoder::new();
//! DatumWriter::new(&writer_schema)
//!     .unwrap()
//!     .write(&mut encoder, &AvroValue::Int(123))
//!     .unwrap();
//!
//! let reader = DatumReader::with_schemas(&reader_schema, &writer_schema).unwrap();
//! let value = reader.read(&mut Decoder::new(encoder.as_bytes())).unwrap();
//! assert_eq!(value, AvroValue::Long(123));
//! ```

pub mod binary;
pub mod codec;
pub mod container;
pub mod datum;
pub mod error;
pub mod resolve;
pub mod schema;
pub mod value;

// Re-export main types
pub use binary::{Decoder, Encoder};
pub use codec::Codec;
pub use container::{Block, ContainerReader, ContainerWriter, Header, ReaderConfig, WriterConfig};
pub use datum::{DatumReader, DatumWriter};
pub use error::{
    CodecError, ContainerError, DecodeError, EncodeError, ResolveError, SchemaError, ValueError,
};
pub use resolve::{ResolvedReader, ResolvedWriter, Resolver, TypePromotion};
pub use schema::{
    parse_schema, to_json, AvroSchema, EnumSchema, FieldSchema, FixedSchema, LogicalType,
    LogicalTypeName, Name, NamedTypes, Properties, RecordSchema, RenderMode, SchemaParser,
    UnionSchema,
};
pub use value::{
    AvroValue, Decimal, Duration, EnumValue, FixedValue, FromAvroValue, GenericRecord,
    RecordLayout, UnionValue,
};
