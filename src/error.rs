//! Error types for schema construction, resolution, binary coding and container files

use std::io;
use thiserror::Error;

/// Errors raised while constructing or parsing a schema
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Invalid schema definition
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    /// Name or namespace does not follow the identifier grammar
    #[error("Invalid name: {0}")]
    InvalidName(String),
    /// Duplicate field, symbol or named type
    #[error("Duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },
    /// Union membership rules violated
    #[error("Invalid union: {0}")]
    InvalidUnion(String),
    /// Logical type parameters or underlying type are invalid
    #[error("Invalid logical type '{logical_type}': {message}")]
    InvalidLogicalType {
        logical_type: &'static str,
        message: String,
    },
    /// Attempt to set a reserved property key
    #[error("Property key '{0}' is reserved")]
    ReservedProperty(String),
    /// Unsupported type name
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),
    /// Schema text could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Errors raised while reconciling a reader schema against a writer schema
///
/// Resolution errors are always reported when a reader or writer is built,
/// never while a value is being decoded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// No promotion path between the two schemas
    #[error("Unresolvable schema at '{path}': reader {reader} cannot read writer {writer}")]
    TypeMismatch {
        path: String,
        reader: String,
        writer: String,
    },
    /// Reader field is absent from the writer and declares no default
    #[error("Unmapped field without default: '{field}' in record '{record}'")]
    UnmappedField { record: String, field: String },
    /// No reader union branch accepts the writer schema
    #[error("No matching union branch at '{path}' for writer {writer}")]
    NoMatchingBranch { path: String, writer: String },
    /// Named schemas with different names
    #[error("Name mismatch at '{path}': reader '{reader}', writer '{writer}'")]
    NameMismatch {
        path: String,
        reader: String,
        writer: String,
    },
    /// Fixed schemas with different sizes
    #[error("Fixed size mismatch at '{path}': reader {reader}, writer {writer}")]
    FixedSizeMismatch {
        path: String,
        reader: usize,
        writer: usize,
    },
    /// Default value does not conform to its field schema
    #[error("Invalid default for field '{field}': {message}")]
    InvalidDefault { field: String, message: String },
    /// Named reference that was never defined
    #[error("Unknown named type reference '{0}'")]
    UnknownReference(String),
    /// Schema tree is itself invalid (e.g. conflicting named definitions)
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// Errors that can occur during decoding
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Invalid Avro data
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// Unexpected end of data
    #[error("Unexpected end of data")]
    UnexpectedEof,
    /// Invalid varint encoding
    #[error("Invalid varint encoding")]
    InvalidVarint,
    /// String is not valid UTF-8
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    /// Union branch index outside the declared range
    #[error("Union branch index {index} out of range (0..{branches})")]
    UnionIndexOutOfRange { index: i64, branches: usize },
    /// Writer union branch with no counterpart in the reader schema
    #[error("Writer union branch {index} has no matching reader branch")]
    UnresolvedBranch { index: usize },
    /// Writer enum symbol unknown to the reader and no default symbol
    #[error("Unknown enum symbol '{symbol}' for enum '{name}'")]
    UnknownEnumSymbol { name: String, symbol: String },
    /// Value violates its logical type
    #[error("Invalid logical value: {0}")]
    InvalidLogical(String),
    /// Recursive schema slot was used before resolution completed
    #[error("Recursive reference '{0}' is not resolved")]
    UnresolvedRecursion(String),
    /// Array or map declares more items than the decoder allows
    #[error("Collection declares {items} items, limit is {limit}")]
    CollectionTooLarge { items: usize, limit: usize },
}

/// Errors raised while encoding a value against a writer schema
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Value shape does not match the schema
    #[error("Type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },
    /// Value is structurally valid but violates a schema constraint
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// Recursive schema slot was used before resolution completed
    #[error("Recursive reference '{0}' is not resolved")]
    UnresolvedRecursion(String),
}

/// Errors raised while constructing or accessing values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    /// Enum ordinal outside the symbol table
    #[error("Enum ordinal {ordinal} out of range for '{name}' with {symbols} symbols")]
    OrdinalOutOfRange {
        name: String,
        ordinal: usize,
        symbols: usize,
    },
    /// Symbol not declared by the enum
    #[error("Unknown symbol '{symbol}' for enum '{name}'")]
    UnknownSymbol { name: String, symbol: String },
    /// Fixed buffer length differs from the schema size
    #[error("Fixed '{name}' requires {expected} bytes, got {actual}")]
    FixedSizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    /// Union branch index outside the declared range
    #[error("Union branch {index} out of range (0..{branches})")]
    BranchOutOfRange { index: usize, branches: usize },
    /// Accessor requested a different branch type than the one held
    #[error("Wrong union branch: requested {requested}, holding {actual}")]
    WrongBranch {
        requested: &'static str,
        actual: String,
    },
    /// Record has no field with the given name
    #[error("Record '{record}' has no field '{field}'")]
    UnknownField { record: String, field: String },
    /// Record field index outside the field list
    #[error("Field index {index} out of range for record '{record}' with {fields} fields")]
    FieldIndexOutOfRange {
        record: String,
        index: usize,
        fields: usize,
    },
    /// Decimal text or bytes could not be interpreted
    #[error("Invalid decimal: {0}")]
    InvalidDecimal(String),
}

/// Errors that can occur during codec operations
#[derive(Debug, Error)]
pub enum CodecError {
    /// Unsupported codec
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),
    /// Compression error
    #[error("Compression error: {0}")]
    CompressionError(String),
    /// Decompression error
    #[error("Decompression error: {0}")]
    DecompressionError(String),
}

/// Top-level container file error type
#[derive(Debug, Error)]
pub enum ContainerError {
    /// IO error on the underlying stream
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Invalid magic bytes
    #[error("Invalid magic bytes: expected 'Obj\\x01', found {0:?}")]
    InvalidMagic([u8; 4]),

    /// Header or block structure could not be parsed
    #[error("Parse error at offset {offset}: {message}")]
    Parse { offset: u64, message: String },

    /// Sync marker does not match the header; the file is corrupt from here on
    #[error("Invalid sync marker at block {block_index}, offset {offset}")]
    InvalidSyncMarker { block_index: usize, offset: u64 },

    /// Existing file schema differs from the writer schema
    #[error("Incompatible schema: file has {file}, writer has {writer}")]
    IncompatibleSchema { file: String, writer: String },

    /// Metadata key misuse
    #[error("Invalid metadata: {0}")]
    Metadata(String),

    /// Schema error
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Resolution error
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// Codec error
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Decode error in block/record
    #[error("Decode error in block {block_index}, record {record_index}: {source}")]
    Decode {
        block_index: usize,
        record_index: usize,
        #[source]
        source: DecodeError,
    },

    /// Encode error
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Reader was used after a fatal error
    #[error("Reader is poisoned by an earlier error")]
    Poisoned,
}

impl From<DecodeError> for ContainerError {
    fn from(err: DecodeError) -> Self {
        ContainerError::Decode {
            block_index: 0,
            record_index: 0,
            source: err,
        }
    }
}
