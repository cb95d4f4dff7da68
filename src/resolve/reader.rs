//! Compilation of a reader/writer schema pair into decode and skip closures.
//!
//! The schema trees are walked exactly once, here. Everything the hot path
//! needs (field mappings, enum symbol tables, union dispatch tables,
//! materialized defaults) is captured by the closures, so decoding a value
//! never looks at a schema again.
//!
//! Recursive named types are compiled through slots: the first visit of a
//! `(reader, writer)` record pair registers an empty slot, nested visits of
//! the same pair get a closure that reads the slot through a weak pointer,
//! and the slot is filled once the outer record is complete. The slots
//! themselves are owned by the `ResolvedReader`, which keeps the closure
//! tree free of reference cycles.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::trace;

use super::promotion::TypePromotion;
use crate::binary::Decoder;
use crate::error::{DecodeError, ResolveError};
use crate::schema::{
    AvroSchema, EnumSchema, FixedSchema, LogicalType, LogicalTypeName, NamedTypes, RecordSchema,
    UnionSchema,
};
use crate::value::{
    AvroValue, Decimal, Duration, EnumValue, FixedValue, GenericRecord, RecordLayout, UnionValue,
};

pub(crate) type DecodeFn =
    Arc<dyn Fn(&mut Decoder<'_>) -> Result<AvroValue, DecodeError> + Send + Sync>;
pub(crate) type SkipFn = Arc<dyn Fn(&mut Decoder<'_>) -> Result<(), DecodeError> + Send + Sync>;

type Slot<T> = Arc<OnceLock<T>>;

fn decode_fn<F>(f: F) -> DecodeFn
where
    F: Fn(&mut Decoder<'_>) -> Result<AvroValue, DecodeError> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn skip_fn<F>(f: F) -> SkipFn
where
    F: Fn(&mut Decoder<'_>) -> Result<(), DecodeError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Decoder for values written with one schema and read as another.
///
/// Immutable once built and safe to share between threads; each thread
/// drives its own `Decoder`.
pub struct ResolvedReader {
    reader: AvroSchema,
    writer: AvroSchema,
    decode: DecodeFn,
    skip: SkipFn,
    _decode_slots: Vec<Slot<DecodeFn>>,
    _skip_slots: Vec<Slot<SkipFn>>,
}

impl ResolvedReader {
    /// Compile `writer` data into `reader` values.
    ///
    /// Fails if any part of the writer schema cannot be read as the
    /// corresponding part of the reader schema.
    pub fn new(reader: &AvroSchema, writer: &AvroSchema) -> Result<Self, ResolveError> {
        let reader_types = NamedTypes::build_from_schema(reader)?;
        let writer_types = NamedTypes::build_from_schema(writer)?;

        let mut skips = SkipCompiler::new(&writer_types);
        let skip = skips.compile(writer)?;

        let mut compiler = ReaderCompiler {
            reader_types: &reader_types,
            writer_types: &writer_types,
            skips,
            memo: HashMap::new(),
            log: Vec::new(),
            slots: Vec::new(),
        };
        let decode = compiler.compile(reader, writer, &root_path(reader))?;

        Ok(Self {
            reader: reader.clone(),
            writer: writer.clone(),
            decode,
            skip,
            _decode_slots: compiler.slots,
            _skip_slots: compiler.skips.slots,
        })
    }

    pub fn reader_schema(&self) -> &AvroSchema {
        &self.reader
    }

    pub fn writer_schema(&self) -> &AvroSchema {
        &self.writer
    }

    /// Decode one value.
    #[inline]
    pub fn decode(&self, decoder: &mut Decoder<'_>) -> Result<AvroValue, DecodeError> {
        (self.decode)(decoder)
    }

    /// Advance past one value without materializing it.
    #[inline]
    pub fn skip(&self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
        (self.skip)(decoder)
    }
}

impl fmt::Debug for ResolvedReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedReader")
            .field("reader", &self.reader.type_name())
            .field("writer", &self.writer.type_name())
            .finish()
    }
}

pub(crate) fn root_path(schema: &AvroSchema) -> String {
    schema.fullname().unwrap_or_else(|| schema.type_name())
}

pub(crate) fn child_path(path: &str, segment: &str) -> String {
    format!("{}.{}", path, segment)
}

fn lookup<'s>(types: &'s NamedTypes, schema: &'s AvroSchema) -> Result<&'s AvroSchema, ResolveError> {
    match schema {
        AvroSchema::Named(name) => types
            .get(name)
            .ok_or_else(|| ResolveError::UnknownReference(name.clone())),
        other => Ok(other),
    }
}

/// Full names a reader named type answers to: its own and its aliases.
fn answers_to(reader: &AvroSchema, writer_fullname: &str) -> bool {
    let aliases = match reader {
        AvroSchema::Record(r) => r.alias_fullnames(),
        AvroSchema::Enum(e) => e.alias_fullnames(),
        AvroSchema::Fixed(f) => f.alias_fullnames(),
        _ => return false,
    };
    reader.fullname().as_deref() == Some(writer_fullname)
        || aliases.iter().any(|a| a == writer_fullname)
}

fn names_match(reader: &AvroSchema, writer: &AvroSchema) -> bool {
    let same_kind = matches!(
        (reader, writer),
        (AvroSchema::Record(_), AvroSchema::Record(_))
            | (AvroSchema::Enum(_), AvroSchema::Enum(_))
            | (AvroSchema::Fixed(_), AvroSchema::Fixed(_))
    );
    same_kind
        && writer
            .fullname()
            .is_some_and(|writer_name| answers_to(reader, &writer_name))
}

struct ReaderCompiler<'s> {
    reader_types: &'s NamedTypes,
    writer_types: &'s NamedTypes,
    skips: SkipCompiler<'s>,
    /// In-progress and finished record pairs.
    memo: HashMap<(String, String), Slot<DecodeFn>>,
    /// Memo keys in insertion order, for rollback.
    log: Vec<(String, String)>,
    slots: Vec<Slot<DecodeFn>>,
}

impl<'s> ReaderCompiler<'s> {
    fn compile(
        &mut self,
        reader: &'s AvroSchema,
        writer: &'s AvroSchema,
        path: &str,
    ) -> Result<DecodeFn, ResolveError> {
        let reader = lookup(self.reader_types, reader)?;
        let writer = lookup(self.writer_types, writer)?;

        match (reader, writer) {
            (AvroSchema::Union(r), AvroSchema::Union(w)) => self.union_to_union(r, w, writer, path),
            (AvroSchema::Union(r), _) => self.into_union(r, writer, path),
            (_, AvroSchema::Union(w)) => self.from_union(reader, w, writer, path),
            _ => self.compile_value(reader, writer, path),
        }
    }

    /// Run a speculative compilation, forgetting any memo entries it added
    /// if it fails.
    fn attempt<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ResolveError>,
    ) -> Result<T, ResolveError> {
        let mark = self.log.len();
        let result = f(self);
        if result.is_err() {
            for key in self.log.drain(mark..) {
                self.memo.remove(&key);
            }
        }
        result
    }

    fn union_to_union(
        &mut self,
        reader: &'s UnionSchema,
        writer: &'s UnionSchema,
        writer_schema: &'s AvroSchema,
        path: &str,
    ) -> Result<DecodeFn, ResolveError> {
        if let (Some((reader_null, reader_value)), Some((writer_null, writer_value))) =
            (reader.nullable_indices(), writer.nullable_indices())
        {
            let inner = self.compile(
                &reader.branches()[reader_value],
                &writer.branches()[writer_value],
                path,
            )?;
            return Ok(decode_fn(move |d| {
                if d.read_union_index(2)? == writer_null {
                    Ok(AvroValue::Union(UnionValue::from_parts(reader_null, AvroValue::Null)))
                } else {
                    Ok(AvroValue::Union(UnionValue::from_parts(reader_value, inner(d)?)))
                }
            }));
        }

        let mut table: Vec<Option<(usize, DecodeFn)>> = Vec::with_capacity(writer.len());
        for (i, branch) in writer.branches().iter().enumerate() {
            let branch_path = child_path(path, &i.to_string());
            let entry = match self.match_branch(reader, branch) {
                Some(index) => self
                    .attempt(|c| c.compile(&reader.branches()[index], branch, &branch_path))
                    .map(|decode| (index, decode))
                    .map_err(|err| trace!(path = %branch_path, error = %err, "writer branch unreadable"))
                    .ok(),
                None => None,
            };
            table.push(entry);
        }

        if table.iter().all(Option::is_none) {
            return Err(ResolveError::NoMatchingBranch {
                path: path.to_string(),
                writer: writer_schema.type_name(),
            });
        }

        let branches = table.len();
        Ok(decode_fn(move |d| {
            let index = d.read_union_index(branches)?;
            match &table[index] {
                Some((reader_index, decode)) => Ok(AvroValue::Union(UnionValue::from_parts(
                    *reader_index,
                    decode(d)?,
                ))),
                None => Err(DecodeError::UnresolvedBranch { index }),
            }
        }))
    }

    fn into_union(
        &mut self,
        reader: &'s UnionSchema,
        writer: &'s AvroSchema,
        path: &str,
    ) -> Result<DecodeFn, ResolveError> {
        let index = self
            .match_branch(reader, writer)
            .ok_or_else(|| ResolveError::NoMatchingBranch {
                path: path.to_string(),
                writer: writer.type_name(),
            })?;
        let inner = self.compile(&reader.branches()[index], writer, path)?;
        Ok(decode_fn(move |d| {
            Ok(AvroValue::Union(UnionValue::from_parts(index, inner(d)?)))
        }))
    }

    fn from_union(
        &mut self,
        reader: &'s AvroSchema,
        writer: &'s UnionSchema,
        writer_schema: &'s AvroSchema,
        path: &str,
    ) -> Result<DecodeFn, ResolveError> {
        let mut table: Vec<Option<DecodeFn>> = Vec::with_capacity(writer.len());
        for (i, branch) in writer.branches().iter().enumerate() {
            let branch_path = child_path(path, &i.to_string());
            let entry = self
                .attempt(|c| c.compile(reader, branch, &branch_path))
                .map_err(|err| trace!(path = %branch_path, error = %err, "writer branch unreadable"))
                .ok();
            table.push(entry);
        }

        if table.iter().all(Option::is_none) {
            return Err(ResolveError::TypeMismatch {
                path: path.to_string(),
                reader: reader.type_name(),
                writer: writer_schema.type_name(),
            });
        }

        let branches = table.len();
        Ok(decode_fn(move |d| {
            let index = d.read_union_index(branches)?;
            match &table[index] {
                Some(decode) => decode(d),
                None => Err(DecodeError::UnresolvedBranch { index }),
            }
        }))
    }

    /// Pick the reader branch for a writer schema: an exact match by kind
    /// or name first, then the first branch the writer promotes to.
    fn match_branch(&self, reader: &'s UnionSchema, writer: &'s AvroSchema) -> Option<usize> {
        let writer = lookup(self.writer_types, writer).ok()?;
        let branches: Vec<Option<&AvroSchema>> = reader
            .branches()
            .iter()
            .map(|b| lookup(self.reader_types, b).ok())
            .collect();

        let exact = |branch: &AvroSchema| match (branch, writer) {
            (AvroSchema::Array(_), AvroSchema::Array(_)) | (AvroSchema::Map(_), AvroSchema::Map(_)) => {
                true
            }
            (AvroSchema::Logical(_), AvroSchema::Logical(_)) => branch == writer,
            (b, w) if b.is_primitive() && w.is_primitive() => b == w,
            (b, w) => names_match(b, w),
        };

        branches
            .iter()
            .position(|b| b.is_some_and(|branch| exact(branch)))
            .or_else(|| {
                branches.iter().position(|b| {
                    b.is_some_and(|branch| TypePromotion::between(writer, branch).is_some())
                })
            })
    }

    fn compile_value(
        &mut self,
        reader: &'s AvroSchema,
        writer: &'s AvroSchema,
        path: &str,
    ) -> Result<DecodeFn, ResolveError> {
        let mismatch = || ResolveError::TypeMismatch {
            path: path.to_string(),
            reader: reader.type_name(),
            writer: writer.type_name(),
        };

        match (reader, writer) {
            (AvroSchema::Logical(r), AvroSchema::Logical(_)) => {
                if reader == writer {
                    Ok(logical_decoder(r))
                } else {
                    match TypePromotion::between(writer, reader) {
                        Some(TypePromotion::TimeUnit { factor }) => {
                            let AvroSchema::Logical(w) = writer else {
                                return Err(mismatch());
                            };
                            time_promotion(w, r, factor).ok_or_else(mismatch)
                        }
                        _ => Err(mismatch()),
                    }
                }
            }
            (AvroSchema::Logical(_), _) | (_, AvroSchema::Logical(_)) => Err(mismatch()),
            (AvroSchema::Record(r), AvroSchema::Record(w)) => {
                if !names_match(reader, writer) {
                    return Err(name_mismatch(path, reader, writer));
                }
                self.record(r, w)
            }
            (AvroSchema::Enum(r), AvroSchema::Enum(w)) => {
                if !names_match(reader, writer) {
                    return Err(name_mismatch(path, reader, writer));
                }
                Ok(enum_decoder(r, w))
            }
            (AvroSchema::Fixed(r), AvroSchema::Fixed(w)) => {
                if !names_match(reader, writer) {
                    return Err(name_mismatch(path, reader, writer));
                }
                if r.size() != w.size() {
                    return Err(ResolveError::FixedSizeMismatch {
                        path: path.to_string(),
                        reader: r.size(),
                        writer: w.size(),
                    });
                }
                Ok(fixed_decoder(r))
            }
            (AvroSchema::Array(r), AvroSchema::Array(w)) => {
                let item = self.compile(r, w, &child_path(path, "items"))?;
                Ok(decode_fn(move |d| {
                    let mut items = Vec::new();
                    while let Some(count) = d.read_block_count()? {
                        d.check_collection_items(items.len(), count)?;
                        items.reserve(count.min(d.remaining().len()));
                        for _ in 0..count {
                            items.push(item(d)?);
                        }
                    }
                    Ok(AvroValue::Array(items))
                }))
            }
            (AvroSchema::Map(r), AvroSchema::Map(w)) => {
                let value = self.compile(r, w, &child_path(path, "values"))?;
                Ok(decode_fn(move |d| {
                    let mut entries = Vec::new();
                    while let Some(count) = d.read_block_count()? {
                        d.check_collection_items(entries.len(), count)?;
                        entries.reserve(count.min(d.remaining().len()));
                        for _ in 0..count {
                            let key = d.read_string()?;
                            entries.push((key, value(d)?));
                        }
                    }
                    Ok(AvroValue::Map(entries))
                }))
            }
            (r, w) if r.is_primitive() && r == w => Ok(primitive_decoder(r)),
            (r, w) => match TypePromotion::between(w, r) {
                Some(promotion) => Ok(promotion_decoder(promotion)),
                None => Err(mismatch()),
            },
        }
    }

    fn record(
        &mut self,
        reader: &'s RecordSchema,
        writer: &'s RecordSchema,
    ) -> Result<DecodeFn, ResolveError> {
        let key = (reader.fullname(), writer.fullname());
        if let Some(slot) = self.memo.get(&key) {
            return Ok(match slot.get() {
                Some(decode) => decode.clone(),
                None => deferred(key.0, slot),
            });
        }

        let slot: Slot<DecodeFn> = Arc::new(OnceLock::new());
        self.memo.insert(key.clone(), slot.clone());
        self.log.push(key);
        self.slots.push(slot.clone());

        let decode = self.record_body(reader, writer)?;
        let _ = slot.set(decode.clone());
        Ok(decode)
    }

    fn record_body(
        &mut self,
        reader: &'s RecordSchema,
        writer: &'s RecordSchema,
    ) -> Result<DecodeFn, ResolveError> {
        enum Step {
            Read(usize, DecodeFn),
            Skip(SkipFn),
        }

        let path = reader.fullname();
        let layout = RecordLayout::build(reader, self.reader_types)?;
        let mut mapped = vec![false; reader.fields().len()];
        let mut steps = Vec::with_capacity(writer.fields().len());

        for writer_field in writer.fields() {
            let position = reader.field_index(writer_field.name()).or_else(|| {
                reader
                    .fields()
                    .iter()
                    .position(|f| f.aliases().iter().any(|a| a == writer_field.name()))
            });
            match position {
                Some(index) if !mapped[index] => {
                    let reader_field = &reader.fields()[index];
                    let decode = self.compile(
                        reader_field.schema(),
                        writer_field.schema(),
                        &child_path(&path, reader_field.name()),
                    )?;
                    mapped[index] = true;
                    steps.push(Step::Read(index, decode));
                }
                _ => steps.push(Step::Skip(self.skips.compile(writer_field.schema())?)),
            }
        }

        for (index, field) in reader.fields().iter().enumerate() {
            if !mapped[index] && layout.default_at(index).is_none() {
                return Err(ResolveError::UnmappedField {
                    record: reader.fullname(),
                    field: field.name().to_string(),
                });
            }
        }

        Ok(decode_fn(move |d| {
            let mut record = GenericRecord::new(layout.clone());
            for step in &steps {
                match step {
                    Step::Read(index, decode) => record.set_unchecked(*index, decode(d)?),
                    Step::Skip(skip) => skip(d)?,
                }
            }
            Ok(AvroValue::Record(record))
        }))
    }
}

fn name_mismatch(path: &str, reader: &AvroSchema, writer: &AvroSchema) -> ResolveError {
    ResolveError::NameMismatch {
        path: path.to_string(),
        reader: reader.fullname().unwrap_or_default(),
        writer: writer.fullname().unwrap_or_default(),
    }
}

fn deferred(name: String, slot: &Slot<DecodeFn>) -> DecodeFn {
    let slot = Arc::downgrade(slot);
    decode_fn(move |d| {
        let slot = slot
            .upgrade()
            .ok_or_else(|| DecodeError::UnresolvedRecursion(name.clone()))?;
        let decode = slot
            .get()
            .ok_or_else(|| DecodeError::UnresolvedRecursion(name.clone()))?;
        decode(d)
    })
}

fn primitive_decoder(schema: &AvroSchema) -> DecodeFn {
    match schema {
        AvroSchema::Boolean => decode_fn(|d| d.read_boolean().map(AvroValue::Boolean)),
        AvroSchema::Int => decode_fn(|d| d.read_int().map(AvroValue::Int)),
        AvroSchema::Long => decode_fn(|d| d.read_long().map(AvroValue::Long)),
        AvroSchema::Float => decode_fn(|d| d.read_float().map(AvroValue::Float)),
        AvroSchema::Double => decode_fn(|d| d.read_double().map(AvroValue::Double)),
        AvroSchema::Bytes => decode_fn(|d| d.read_bytes().map(AvroValue::Bytes)),
        AvroSchema::String => decode_fn(|d| d.read_string().map(AvroValue::String)),
        _ => decode_fn(|_| Ok(AvroValue::Null)),
    }
}

fn promotion_decoder(promotion: TypePromotion) -> DecodeFn {
    match promotion {
        TypePromotion::IntToLong => decode_fn(|d| Ok(AvroValue::Long(d.read_int()? as i64))),
        TypePromotion::IntToFloat => decode_fn(|d| Ok(AvroValue::Float(d.read_int()? as f32))),
        TypePromotion::IntToDouble => decode_fn(|d| Ok(AvroValue::Double(d.read_int()? as f64))),
        TypePromotion::LongToFloat => decode_fn(|d| Ok(AvroValue::Float(d.read_long()? as f32))),
        TypePromotion::LongToDouble => {
            decode_fn(|d| Ok(AvroValue::Double(d.read_long()? as f64)))
        }
        TypePromotion::FloatToDouble => {
            decode_fn(|d| Ok(AvroValue::Double(d.read_float()? as f64)))
        }
        TypePromotion::StringToBytes => decode_fn(|d| d.read_bytes().map(AvroValue::Bytes)),
        TypePromotion::BytesToString => decode_fn(|d| d.read_string().map(AvroValue::String)),
        // Only reachable between logical types, handled by `time_promotion`.
        TypePromotion::TimeUnit { .. } => decode_fn(|d| d.read_long().map(AvroValue::Long)),
    }
}

/// Constructor of the value variant for an integral time logical type.
fn time_value(logical: &LogicalTypeName) -> Option<fn(i64) -> AvroValue> {
    Some(match logical {
        LogicalTypeName::TimeMicros => AvroValue::TimeMicros,
        LogicalTypeName::TimeNanos => AvroValue::TimeNanos,
        LogicalTypeName::TimestampMillis => AvroValue::TimestampMillis,
        LogicalTypeName::TimestampMicros => AvroValue::TimestampMicros,
        LogicalTypeName::TimestampNanos => AvroValue::TimestampNanos,
        LogicalTypeName::LocalTimestampMillis => AvroValue::LocalTimestampMillis,
        LogicalTypeName::LocalTimestampMicros => AvroValue::LocalTimestampMicros,
        LogicalTypeName::LocalTimestampNanos => AvroValue::LocalTimestampNanos,
        _ => return None,
    })
}

fn time_promotion(writer: &LogicalType, reader: &LogicalType, factor: i64) -> Option<DecodeFn> {
    let wrap = time_value(reader.logical_type())?;
    let int_writer = matches!(writer.base(), AvroSchema::Int);
    Some(decode_fn(move |d| {
        let raw = if int_writer {
            d.read_int()? as i64
        } else {
            d.read_long()?
        };
        raw.checked_mul(factor)
            .map(wrap)
            .ok_or_else(|| DecodeError::InvalidLogical(format!("time value {} overflows", raw)))
    }))
}

fn logical_decoder(logical: &LogicalType) -> DecodeFn {
    match (logical.logical_type(), logical.base()) {
        (LogicalTypeName::Decimal { scale, .. }, AvroSchema::Fixed(fixed)) => {
            let (scale, size) = (*scale, fixed.size());
            decode_fn(move |d| {
                Ok(AvroValue::Decimal(Decimal::from_be_bytes(d.read_fixed(size)?, scale)))
            })
        }
        (LogicalTypeName::Decimal { scale, .. }, _) => {
            let scale = *scale;
            decode_fn(move |d| {
                Ok(AvroValue::Decimal(Decimal::from_be_bytes(d.read_bytes_ref()?, scale)))
            })
        }
        (LogicalTypeName::Uuid, _) => decode_fn(|d| {
            let text = d.read_str()?;
            uuid::Uuid::parse_str(text)
                .map(AvroValue::Uuid)
                .map_err(|e| DecodeError::InvalidLogical(format!("uuid '{}': {}", text, e)))
        }),
        (LogicalTypeName::Date, _) => decode_fn(|d| d.read_int().map(AvroValue::Date)),
        (LogicalTypeName::TimeMillis, _) => decode_fn(|d| d.read_int().map(AvroValue::TimeMillis)),
        (LogicalTypeName::Duration, _) => decode_fn(|d| {
            let bytes: [u8; 12] = d
                .read_fixed(12)?
                .try_into()
                .map_err(|_| DecodeError::InvalidLogical("duration must be 12 bytes".into()))?;
            Ok(AvroValue::Duration(Duration::from_bytes(bytes)))
        }),
        (other, _) => match time_value(other) {
            Some(wrap) => decode_fn(move |d| d.read_long().map(wrap)),
            None => decode_fn(|d| d.read_long().map(AvroValue::Long)),
        },
    }
}

fn enum_decoder(reader: &EnumSchema, writer: &EnumSchema) -> DecodeFn {
    let fallback = reader.default().and_then(|s| reader.symbol_index(s));
    let mapping: Vec<Option<usize>> = writer
        .symbols()
        .iter()
        .map(|symbol| reader.symbol_index(symbol).or(fallback))
        .collect();
    let writer_symbols = writer.symbols().to_vec();
    let schema = Arc::new(reader.clone());

    decode_fn(move |d| {
        let index = d.read_enum_index()?;
        match mapping.get(index) {
            Some(Some(ordinal)) => EnumValue::new(schema.clone(), *ordinal)
                .map(AvroValue::Enum)
                .map_err(|e| DecodeError::InvalidData(e.to_string())),
            Some(None) => Err(DecodeError::UnknownEnumSymbol {
                name: schema.fullname(),
                symbol: writer_symbols[index].clone(),
            }),
            None => Err(DecodeError::InvalidData(format!(
                "Enum index {} out of range for {} symbols",
                index,
                mapping.len()
            ))),
        }
    })
}

fn fixed_decoder(reader: &FixedSchema) -> DecodeFn {
    let schema = Arc::new(reader.clone());
    let size = reader.size();
    decode_fn(move |d| {
        let bytes = d.read_fixed(size)?.to_vec();
        FixedValue::new(schema.clone(), bytes)
            .map(AvroValue::Fixed)
            .map_err(|e| DecodeError::InvalidData(e.to_string()))
    })
}

/// Builds skip closures from a writer schema alone.
pub(crate) struct SkipCompiler<'s> {
    types: &'s NamedTypes,
    memo: HashMap<String, Slot<SkipFn>>,
    pub(crate) slots: Vec<Slot<SkipFn>>,
}

impl<'s> SkipCompiler<'s> {
    pub(crate) fn new(types: &'s NamedTypes) -> Self {
        Self {
            types,
            memo: HashMap::new(),
            slots: Vec::new(),
        }
    }

    pub(crate) fn compile(&mut self, schema: &'s AvroSchema) -> Result<SkipFn, ResolveError> {
        Ok(match lookup(self.types, schema)? {
            AvroSchema::Null => skip_fn(|_| Ok(())),
            AvroSchema::Boolean => skip_fn(|d| d.skip_boolean()),
            AvroSchema::Int | AvroSchema::Long | AvroSchema::Enum(_) => {
                skip_fn(|d| d.skip_varint())
            }
            AvroSchema::Float => skip_fn(|d| d.skip_float()),
            AvroSchema::Double => skip_fn(|d| d.skip_double()),
            AvroSchema::Bytes | AvroSchema::String => skip_fn(|d| d.skip_bytes()),
            AvroSchema::Fixed(fixed) => {
                let size = fixed.size();
                skip_fn(move |d| d.skip_fixed(size))
            }
            AvroSchema::Array(items) => {
                let item = self.compile(items)?;
                skip_fn(move |d| d.skip_blocks(|d| item(d)))
            }
            AvroSchema::Map(values) => {
                let value = self.compile(values)?;
                skip_fn(move |d| {
                    d.skip_blocks(|d| {
                        d.skip_bytes()?;
                        value(d)
                    })
                })
            }
            AvroSchema::Union(union) => {
                let branches = union
                    .branches()
                    .iter()
                    .map(|b| self.compile(b))
                    .collect::<Result<Vec<_>, _>>()?;
                skip_fn(move |d| {
                    let index = d.read_union_index(branches.len())?;
                    branches[index](d)
                })
            }
            AvroSchema::Record(record) => self.record(record)?,
            AvroSchema::Logical(logical) => self.compile(logical.base())?,
            AvroSchema::Named(name) => return Err(ResolveError::UnknownReference(name.clone())),
        })
    }

    fn record(&mut self, record: &'s RecordSchema) -> Result<SkipFn, ResolveError> {
        let name = record.fullname();
        if let Some(slot) = self.memo.get(&name) {
            return Ok(match slot.get() {
                Some(skip) => skip.clone(),
                None => {
                    let weak = Arc::downgrade(slot);
                    skip_fn(move |d| {
                        let slot = weak
                            .upgrade()
                            .ok_or_else(|| DecodeError::UnresolvedRecursion(name.clone()))?;
                        let skip = slot
                            .get()
                            .ok_or_else(|| DecodeError::UnresolvedRecursion(name.clone()))?;
                        skip(d)
                    })
                }
            });
        }

        let slot: Slot<SkipFn> = Arc::new(OnceLock::new());
        self.memo.insert(name, slot.clone());
        self.slots.push(slot.clone());

        let fields = record
            .fields()
            .iter()
            .map(|f| self.compile(f.schema()))
            .collect::<Result<Vec<_>, _>>()?;
        let skip = skip_fn(move |d| {
            for field in &fields {
                field(d)?;
            }
            Ok(())
        });
        let _ = slot.set(skip.clone());
        Ok(skip)
    }
}
