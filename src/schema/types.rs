//! The schema model.
//!
//! Primitives, named types, containers, unions and logical annotations.
//! Constructors validate their invariants, so a schema value that exists is
//! a valid schema.

use std::collections::HashSet;

use serde_json::Value;

use super::name::{validate_identifier, Name};
use super::properties::Properties;
use crate::error::SchemaError;

/// Represents an Avro schema.
///
/// Named schemas (records, errors, enums, fixed) compare by full name only;
/// all other schemas compare structurally.
#[derive(Debug, Clone)]
pub enum AvroSchema {
    // Primitive types
    /// Null type - no value.
    Null,
    /// Boolean type.
    Boolean,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// Single-precision float.
    Float,
    /// Double-precision float.
    Double,
    /// Sequence of bytes.
    Bytes,
    /// Unicode string.
    String,

    // Complex types
    /// Record (or error) type with named fields.
    Record(RecordSchema),
    /// Enumeration type.
    Enum(EnumSchema),
    /// Homogeneous array.
    Array(Box<AvroSchema>),
    /// String-keyed map with homogeneous values.
    Map(Box<AvroSchema>),
    /// Union of multiple schemas.
    Union(UnionSchema),
    /// Fixed-size byte array.
    Fixed(FixedSchema),

    /// Reference to a named type by full name, defined elsewhere in the tree.
    Named(String),

    /// Logical type wrapper.
    Logical(LogicalType),
}

/// Whether a record schema was declared as `record` or `error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordKind {
    #[default]
    Record,
    Error,
}

/// Schema for a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    name: Name,
    fields: Vec<FieldSchema>,
    kind: RecordKind,
    doc: Option<String>,
    aliases: Vec<String>,
    properties: Properties,
}

impl RecordSchema {
    /// Create a new record schema, rejecting duplicate field names.
    pub fn new(name: Name, fields: Vec<FieldSchema>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::Duplicate {
                    kind: "field",
                    name: format!("{}.{}", name, field.name),
                });
            }
        }

        Ok(Self {
            name,
            fields,
            kind: RecordKind::Record,
            doc: None,
            aliases: Vec::new(),
            properties: Properties::new(),
        })
    }

    /// Create a new error schema. Errors are records with a different tag.
    pub fn error(name: Name, fields: Vec<FieldSchema>) -> Result<Self, SchemaError> {
        let mut record = Self::new(name, fields)?;
        record.kind = RecordKind::Error;
        Ok(record)
    }

    /// Set the documentation.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Set the aliases. Each alias must be a valid (possibly qualified) name.
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Result<Self, SchemaError> {
        validate_aliases(&aliases)?;
        self.aliases = aliases;
        Ok(self)
    }

    /// Attach custom properties.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Namespace-qualified name.
    pub fn fullname(&self) -> String {
        self.name.fullname()
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn is_error(&self) -> bool {
        self.kind == RecordKind::Error
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Position of a field by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Full names under which a writer schema may match this record.
    pub(crate) fn alias_fullnames(&self) -> Vec<String> {
        qualify_aliases(&self.aliases, self.name.namespace())
    }
}

/// Sort order declared on a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldOrder {
    #[default]
    Ascending,
    Descending,
    Ignore,
}

impl FieldOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldOrder::Ascending => "ascending",
            FieldOrder::Descending => "descending",
            FieldOrder::Ignore => "ignore",
        }
    }
}

/// One record field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    name: String,
    schema: AvroSchema,
    default: Option<Value>,
    doc: Option<String>,
    order: FieldOrder,
    aliases: Vec<String>,
    properties: Properties,
}

impl FieldSchema {
    /// Create a new field with the given name and schema.
    pub fn new(name: impl Into<String>, schema: AvroSchema) -> Result<Self, SchemaError> {
        let name = name.into();
        validate_identifier(&name, "Field name")?;
        Ok(Self {
            name,
            schema,
            default: None,
            doc: None,
            order: FieldOrder::Ascending,
            aliases: Vec::new(),
            properties: Properties::new(),
        })
    }

    /// Set the default value.
    ///
    /// The default is checked against the field schema when a reader that
    /// needs it is resolved.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Set the documentation.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Set the sort order.
    pub fn with_order(mut self, order: FieldOrder) -> Self {
        self.order = order;
        self
    }

    /// Set the aliases.
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Result<Self, SchemaError> {
        for alias in &aliases {
            validate_identifier(alias, "Field alias")?;
        }
        self.aliases = aliases;
        Ok(self)
    }

    /// Attach custom properties.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &AvroSchema {
        &self.schema
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn order(&self) -> FieldOrder {
        self.order
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

/// Enumeration of symbols.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    name: Name,
    symbols: Vec<String>,
    default: Option<String>,
    doc: Option<String>,
    aliases: Vec<String>,
    properties: Properties,
}

impl EnumSchema {
    /// Create a new enum. Symbols must be unique identifiers.
    pub fn new(name: Name, symbols: Vec<String>) -> Result<Self, SchemaError> {
        if symbols.is_empty() {
            return Err(SchemaError::InvalidSchema(format!(
                "Enum '{}' must have at least one symbol",
                name
            )));
        }

        let mut seen = HashSet::with_capacity(symbols.len());
        for symbol in &symbols {
            validate_identifier(symbol, "Enum symbol")?;
            if !seen.insert(symbol.as_str()) {
                return Err(SchemaError::Duplicate {
                    kind: "enum symbol",
                    name: format!("{}.{}", name, symbol),
                });
            }
        }

        Ok(Self {
            name,
            symbols,
            default: None,
            doc: None,
            aliases: Vec::new(),
            properties: Properties::new(),
        })
    }

    /// Set the default symbol used for writer symbols unknown to the reader.
    pub fn with_default(mut self, symbol: impl Into<String>) -> Result<Self, SchemaError> {
        let symbol = symbol.into();
        if self.symbol_index(&symbol).is_none() {
            return Err(SchemaError::InvalidSchema(format!(
                "Enum '{}' default '{}' is not one of its symbols",
                self.name, symbol
            )));
        }
        self.default = Some(symbol);
        Ok(self)
    }

    /// Set the documentation.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Set the aliases.
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Result<Self, SchemaError> {
        validate_aliases(&aliases)?;
        self.aliases = aliases;
        Ok(self)
    }

    /// Attach custom properties.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Namespace-qualified name.
    pub fn fullname(&self) -> String {
        self.name.fullname()
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn default(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Get the index of a symbol.
    pub fn symbol_index(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    pub(crate) fn alias_fullnames(&self) -> Vec<String> {
        qualify_aliases(&self.aliases, self.name.namespace())
    }
}

/// Fixed-length byte sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSchema {
    name: Name,
    size: usize,
    doc: Option<String>,
    aliases: Vec<String>,
    properties: Properties,
}

impl FixedSchema {
    /// Create a new fixed schema with the given name and size.
    pub fn new(name: Name, size: usize) -> Self {
        Self {
            name,
            size,
            doc: None,
            aliases: Vec::new(),
            properties: Properties::new(),
        }
    }

    /// Set the documentation.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Set the aliases.
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Result<Self, SchemaError> {
        validate_aliases(&aliases)?;
        self.aliases = aliases;
        Ok(self)
    }

    /// Attach custom properties.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Namespace-qualified name.
    pub fn fullname(&self) -> String {
        self.name.fullname()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub(crate) fn alias_fullnames(&self) -> Vec<String> {
        qualify_aliases(&self.aliases, self.name.namespace())
    }
}

/// Schema for a union.
///
/// A union never directly contains another union, and holds at most one
/// array, one map, one branch per named type and one branch per unnamed type.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionSchema {
    branches: Vec<AvroSchema>,
}

impl UnionSchema {
    /// Create a union, validating its membership rules.
    pub fn new(branches: Vec<AvroSchema>) -> Result<Self, SchemaError> {
        if branches.is_empty() {
            return Err(SchemaError::InvalidUnion(
                "union must have at least one branch".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(branches.len());
        for (i, branch) in branches.iter().enumerate() {
            if matches!(branch, AvroSchema::Union(_)) {
                return Err(SchemaError::InvalidUnion(format!(
                    "branch {} is a nested union",
                    i
                )));
            }
            let key = branch.union_key();
            if !seen.insert(key.clone()) {
                return Err(SchemaError::InvalidUnion(format!(
                    "duplicate branch '{}' at position {}",
                    key, i
                )));
            }
        }

        Ok(Self { branches })
    }

    pub fn branches(&self) -> &[AvroSchema] {
        &self.branches
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Index of the null branch, if present.
    pub fn null_index(&self) -> Option<usize> {
        self.branches
            .iter()
            .position(|b| matches!(b, AvroSchema::Null))
    }

    /// For the two-branch nullable shape `{X, null}` (either order), return
    /// `(null_index, value_index)`.
    pub fn nullable_indices(&self) -> Option<(usize, usize)> {
        if self.branches.len() != 2 {
            return None;
        }
        let null_index = self.null_index()?;
        Some((null_index, 1 - null_index))
    }
}

/// An annotated underlying schema.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalType {
    base: Box<AvroSchema>,
    logical_type: LogicalTypeName,
    properties: Properties,
}

impl LogicalType {
    /// Create a logical type, validating its parameters and underlying schema.
    pub fn new(base: AvroSchema, logical_type: LogicalTypeName) -> Result<Self, SchemaError> {
        let invalid = |message: String| SchemaError::InvalidLogicalType {
            logical_type: logical_type.name(),
            message,
        };

        match &logical_type {
            LogicalTypeName::Decimal { precision, scale } => {
                if *precision == 0 {
                    return Err(invalid("precision must be at least 1".to_string()));
                }
                if scale > precision {
                    return Err(invalid(format!(
                        "scale {} exceeds precision {}",
                        scale, precision
                    )));
                }
                match &base {
                    AvroSchema::Bytes => {}
                    AvroSchema::Fixed(fixed) => {
                        let max = max_decimal_precision(fixed.size());
                        if (*precision as usize) > max {
                            return Err(invalid(format!(
                                "precision {} does not fit in fixed '{}' of {} bytes (max {})",
                                precision,
                                fixed.name(),
                                fixed.size(),
                                max
                            )));
                        }
                    }
                    other => {
                        return Err(invalid(format!(
                            "underlying type must be bytes or fixed, found {}",
                            other.type_name()
                        )))
                    }
                }
            }
            LogicalTypeName::Duration => match &base {
                AvroSchema::Fixed(fixed) if fixed.size() == 12 => {}
                other => {
                    return Err(invalid(format!(
                        "underlying type must be fixed of size 12, found {}",
                        other.type_name()
                    )))
                }
            },
            LogicalTypeName::Uuid => {
                if !matches!(base, AvroSchema::String) {
                    return Err(invalid(format!(
                        "underlying type must be string, found {}",
                        base.type_name()
                    )));
                }
            }
            LogicalTypeName::Date | LogicalTypeName::TimeMillis => {
                if !matches!(base, AvroSchema::Int) {
                    return Err(invalid(format!(
                        "underlying type must be int, found {}",
                        base.type_name()
                    )));
                }
            }
            LogicalTypeName::TimeMicros
            | LogicalTypeName::TimeNanos
            | LogicalTypeName::TimestampMillis
            | LogicalTypeName::TimestampMicros
            | LogicalTypeName::TimestampNanos
            | LogicalTypeName::LocalTimestampMillis
            | LogicalTypeName::LocalTimestampMicros
            | LogicalTypeName::LocalTimestampNanos => {
                if !matches!(base, AvroSchema::Long) {
                    return Err(invalid(format!(
                        "underlying type must be long, found {}",
                        base.type_name()
                    )));
                }
            }
        }

        Ok(Self {
            base: Box::new(base),
            logical_type,
            properties: Properties::new(),
        })
    }

    /// Attach custom properties.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn base(&self) -> &AvroSchema {
        &self.base
    }

    pub fn logical_type(&self) -> &LogicalTypeName {
        &self.logical_type
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

/// Largest decimal precision representable in a two's-complement fixed of `size` bytes.
pub fn max_decimal_precision(size: usize) -> usize {
    if size == 0 {
        return 0;
    }
    let bits = (8 * size - 1) as f64;
    (bits * std::f64::consts::LOG10_2).floor() as usize
}

/// Logical type tag plus any parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalTypeName {
    /// Arbitrary-precision decimal, on `bytes` or `fixed`.
    Decimal { precision: u32, scale: u32 },
    /// UUID stored as its canonical string form.
    Uuid,
    /// Days since 1970-01-01, on `int`.
    Date,
    /// Time of day in milliseconds.
    TimeMillis,
    /// Time of day in microseconds.
    TimeMicros,
    /// Time of day in nanoseconds.
    TimeNanos,
    /// UTC instant in milliseconds, on `long`.
    TimestampMillis,
    /// UTC instant in microseconds, on `long`.
    TimestampMicros,
    /// Timestamp in nanoseconds since Unix epoch.
    TimestampNanos,
    /// Wall-clock milliseconds, on `long`.
    LocalTimestampMillis,
    /// Wall-clock microseconds, on `long`.
    LocalTimestampMicros,
    /// Local timestamp in nanoseconds (no timezone).
    LocalTimestampNanos,
    /// Months, days and milliseconds, on a 12-byte `fixed`.
    Duration,
}

impl LogicalTypeName {
    /// The `logicalType` attribute value.
    pub fn name(&self) -> &'static str {
        match self {
            LogicalTypeName::Decimal { .. } => "decimal",
            LogicalTypeName::Uuid => "uuid",
            LogicalTypeName::Date => "date",
            LogicalTypeName::TimeMillis => "time-millis",
            LogicalTypeName::TimeMicros => "time-micros",
            LogicalTypeName::TimeNanos => "time-nanos",
            LogicalTypeName::TimestampMillis => "timestamp-millis",
            LogicalTypeName::TimestampMicros => "timestamp-micros",
            LogicalTypeName::TimestampNanos => "timestamp-nanos",
            LogicalTypeName::LocalTimestampMillis => "local-timestamp-millis",
            LogicalTypeName::LocalTimestampMicros => "local-timestamp-micros",
            LogicalTypeName::LocalTimestampNanos => "local-timestamp-nanos",
            LogicalTypeName::Duration => "duration",
        }
    }

    /// Look up a parameterless logical type by name. Decimal needs its
    /// parameters and is handled by the caller.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "uuid" => LogicalTypeName::Uuid,
            "date" => LogicalTypeName::Date,
            "time-millis" => LogicalTypeName::TimeMillis,
            "time-micros" => LogicalTypeName::TimeMicros,
            "time-nanos" => LogicalTypeName::TimeNanos,
            "timestamp-millis" => LogicalTypeName::TimestampMillis,
            "timestamp-micros" => LogicalTypeName::TimestampMicros,
            "timestamp-nanos" => LogicalTypeName::TimestampNanos,
            "local-timestamp-millis" => LogicalTypeName::LocalTimestampMillis,
            "local-timestamp-micros" => LogicalTypeName::LocalTimestampMicros,
            "local-timestamp-nanos" => LogicalTypeName::LocalTimestampNanos,
            "duration" => LogicalTypeName::Duration,
            _ => return None,
        })
    }
}

impl AvroSchema {
    /// Build a union schema, validating membership.
    pub fn union(branches: Vec<AvroSchema>) -> Result<Self, SchemaError> {
        UnionSchema::new(branches).map(AvroSchema::Union)
    }

    /// Build an array schema.
    pub fn array(items: AvroSchema) -> Self {
        AvroSchema::Array(Box::new(items))
    }

    /// Build a map schema.
    pub fn map(values: AvroSchema) -> Self {
        AvroSchema::Map(Box::new(values))
    }

    /// Build a logical schema, validating the underlying type.
    pub fn logical(base: AvroSchema, logical_type: LogicalTypeName) -> Result<Self, SchemaError> {
        LogicalType::new(base, logical_type).map(AvroSchema::Logical)
    }

    /// True for the eight primitive types.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            AvroSchema::Null
                | AvroSchema::Boolean
                | AvroSchema::Int
                | AvroSchema::Long
                | AvroSchema::Float
                | AvroSchema::Double
                | AvroSchema::Bytes
                | AvroSchema::String
        )
    }

    /// Check if this schema is a named type (record, error, enum, fixed or a reference).
    pub fn is_named(&self) -> bool {
        matches!(
            self,
            AvroSchema::Record(_) | AvroSchema::Enum(_) | AvroSchema::Fixed(_) | AvroSchema::Named(_)
        )
    }

    /// Full name for records, enums, fixed types and references.
    pub fn fullname(&self) -> Option<String> {
        match self {
            AvroSchema::Record(r) => Some(r.fullname()),
            AvroSchema::Enum(e) => Some(e.fullname()),
            AvroSchema::Fixed(f) => Some(f.fullname()),
            AvroSchema::Named(n) => Some(n.clone()),
            _ => None,
        }
    }

    /// True for a two-branch union with `null` as one branch.
    pub fn is_nullable(&self) -> bool {
        match self {
            AvroSchema::Union(u) => u.null_index().is_some(),
            _ => false,
        }
    }

    /// For a two-branch nullable union, get the non-null schema.
    pub fn nullable_inner(&self) -> Option<&AvroSchema> {
        match self {
            AvroSchema::Union(u) => u.nullable_indices().map(|(_, v)| &u.branches()[v]),
            _ => None,
        }
    }

    /// Short human-readable description used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            AvroSchema::Null => "null".to_string(),
            AvroSchema::Boolean => "boolean".to_string(),
            AvroSchema::Int => "int".to_string(),
            AvroSchema::Long => "long".to_string(),
            AvroSchema::Float => "float".to_string(),
            AvroSchema::Double => "double".to_string(),
            AvroSchema::Bytes => "bytes".to_string(),
            AvroSchema::String => "string".to_string(),
            AvroSchema::Record(r) if r.is_error() => format!("error '{}'", r.fullname()),
            AvroSchema::Record(r) => format!("record '{}'", r.fullname()),
            AvroSchema::Enum(e) => format!("enum '{}'", e.fullname()),
            AvroSchema::Array(items) => format!("array<{}>", items.type_name()),
            AvroSchema::Map(values) => format!("map<{}>", values.type_name()),
            AvroSchema::Union(u) => format!(
                "union[{}]",
                u.branches()
                    .iter()
                    .map(|b| b.type_name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            AvroSchema::Fixed(f) => format!("fixed '{}'({})", f.fullname(), f.size()),
            AvroSchema::Named(n) => format!("'{}'", n),
            AvroSchema::Logical(l) => match l.logical_type() {
                LogicalTypeName::Decimal { precision, scale } => {
                    format!("decimal({}, {}) over {}", precision, scale, l.base().type_name())
                }
                other => other.name().to_string(),
            },
        }
    }

    /// Key that identifies which union slot a branch occupies.
    ///
    /// A logical branch occupies the slot of its underlying type, so
    /// `long` and `timestamp-millis` cannot share a union.
    fn union_key(&self) -> String {
        match self {
            AvroSchema::Array(_) => "array".to_string(),
            AvroSchema::Map(_) => "map".to_string(),
            AvroSchema::Union(_) => "union".to_string(),
            AvroSchema::Logical(l) => l.base().union_key(),
            named if named.is_named() => named.fullname().unwrap_or_default(),
            primitive => primitive.type_name(),
        }
    }

    /// Serialize the schema to its default JSON rendering.
    pub fn to_json(&self) -> String {
        super::writer::to_json(self, super::writer::RenderMode::Default)
    }

    /// The canonical form used for fingerprints and compatibility checks.
    pub fn canonical_form(&self) -> String {
        super::writer::to_json(self, super::writer::RenderMode::Canonical)
    }

    /// 64-bit Rabin fingerprint of the canonical form.
    pub fn fingerprint(&self) -> u64 {
        super::fingerprint::rabin(self.canonical_form().as_bytes())
    }
}

impl PartialEq for AvroSchema {
    fn eq(&self, other: &Self) -> bool {
        use AvroSchema::*;
        match (self, other) {
            (Null, Null)
            | (Boolean, Boolean)
            | (Int, Int)
            | (Long, Long)
            | (Float, Float)
            | (Double, Double)
            | (Bytes, Bytes)
            | (String, String) => true,
            (Array(a), Array(b)) => a == b,
            (Map(a), Map(b)) => a == b,
            (Union(a), Union(b)) => a.branches() == b.branches(),
            (Logical(a), Logical(b)) => a.logical_type() == b.logical_type() && a.base() == b.base(),
            (Fixed(a), Fixed(b)) => a.fullname() == b.fullname() && a.size() == b.size(),
            (a, b) if a.is_named() && b.is_named() => a.fullname() == b.fullname(),
            _ => false,
        }
    }
}

fn validate_aliases(aliases: &[String]) -> Result<(), SchemaError> {
    for alias in aliases {
        Name::new(alias)?;
    }
    Ok(())
}

fn qualify_aliases(aliases: &[String], namespace: Option<&str>) -> Vec<String> {
    aliases
        .iter()
        .map(|alias| match namespace {
            Some(ns) if !alias.contains('.') => format!("{}.{}", ns, alias),
            _ => alias.clone(),
        })
        .collect()
}
