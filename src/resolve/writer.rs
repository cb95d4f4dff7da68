//! Compilation of a writer schema into an encode closure.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use super::reader::{child_path, root_path};
use crate::binary::Encoder;
use crate::error::{EncodeError, ResolveError};
use crate::schema::{AvroSchema, LogicalType, LogicalTypeName, NamedTypes, RecordSchema};
use crate::value::{AvroValue, RecordLayout};

pub(crate) type EncodeFn =
    Arc<dyn Fn(&mut Encoder, &AvroValue) -> Result<(), EncodeError> + Send + Sync>;

type Slot = Arc<OnceLock<EncodeFn>>;

fn encode_fn<F>(f: F) -> EncodeFn
where
    F: Fn(&mut Encoder, &AvroValue) -> Result<(), EncodeError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Encoder for values of one writer schema.
pub struct ResolvedWriter {
    schema: AvroSchema,
    encode: EncodeFn,
    _slots: Vec<Slot>,
}

impl ResolvedWriter {
    pub fn new(schema: &AvroSchema) -> Result<Self, ResolveError> {
        let types = NamedTypes::build_from_schema(schema)?;
        let mut compiler = WriterCompiler {
            types: &types,
            memo: HashMap::new(),
            slots: Vec::new(),
        };
        let encode = compiler.compile(schema, &root_path(schema))?;
        Ok(Self {
            schema: schema.clone(),
            encode,
            _slots: compiler.slots,
        })
    }

    pub fn schema(&self) -> &AvroSchema {
        &self.schema
    }

    /// Append the encoding of `value` to `encoder`.
    ///
    /// On error the encoder may hold a partial value; callers discard it.
    #[inline]
    pub fn encode(&self, encoder: &mut Encoder, value: &AvroValue) -> Result<(), EncodeError> {
        (self.encode)(encoder, value)
    }
}

impl fmt::Debug for ResolvedWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedWriter")
            .field("schema", &self.schema.type_name())
            .finish()
    }
}

fn mismatch(path: &str, expected: &str, found: &AvroValue) -> EncodeError {
    EncodeError::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        found: found.kind_name().to_string(),
    }
}

/// What a union branch accepts, used to pick a branch for untagged values.
struct BranchShape {
    kind: &'static str,
    fullname: Option<String>,
}

impl BranchShape {
    fn of(schema: &AvroSchema) -> Self {
        let kind = match schema {
            AvroSchema::Null => "null",
            AvroSchema::Boolean => "boolean",
            AvroSchema::Int => "int",
            AvroSchema::Long => "long",
            AvroSchema::Float => "float",
            AvroSchema::Double => "double",
            AvroSchema::Bytes => "bytes",
            AvroSchema::String => "string",
            AvroSchema::Record(_) => "record",
            AvroSchema::Enum(_) => "enum",
            AvroSchema::Fixed(_) => "fixed",
            AvroSchema::Array(_) => "array",
            AvroSchema::Map(_) => "map",
            AvroSchema::Logical(l) => l.logical_type().name(),
            AvroSchema::Union(_) | AvroSchema::Named(_) => "",
        };
        Self {
            kind,
            fullname: schema.fullname(),
        }
    }

    /// Same kind of value, and same full name for named types.
    fn exact(&self, value: &AvroValue) -> bool {
        if value.kind_name() != self.kind {
            return false;
        }
        match (&self.fullname, value_fullname(value)) {
            (Some(expected), Some(actual)) => *expected == actual,
            _ => true,
        }
    }

    /// Kinds the branch encoder converts from.
    fn compatible(&self, value: &AvroValue) -> bool {
        let found = value.kind_name();
        found == self.kind
            || matches!(
                (found, self.kind),
                ("int", "long" | "float" | "double")
                    | ("long", "float" | "double")
                    | ("float", "double")
                    | ("string", "bytes" | "enum" | "uuid")
                    | ("bytes", "string" | "fixed")
            )
    }
}

fn value_fullname(value: &AvroValue) -> Option<String> {
    match value {
        AvroValue::Record(r) => Some(r.fullname().to_string()),
        AvroValue::Enum(e) => Some(e.schema().fullname()),
        AvroValue::Fixed(f) => Some(f.schema().fullname()),
        _ => None,
    }
}

struct WriterCompiler<'s> {
    types: &'s NamedTypes,
    memo: HashMap<String, Slot>,
    slots: Vec<Slot>,
}

impl<'s> WriterCompiler<'s> {
    fn compile(&mut self, schema: &'s AvroSchema, path: &str) -> Result<EncodeFn, ResolveError> {
        let schema = match schema {
            AvroSchema::Named(name) => self
                .types
                .get(name)
                .ok_or_else(|| ResolveError::UnknownReference(name.clone()))?,
            other => other,
        };
        let path = path.to_string();

        Ok(match schema {
            AvroSchema::Null => encode_fn(move |_, value| match value.unwrap_union() {
                AvroValue::Null => Ok(()),
                other => Err(mismatch(&path, "null", other)),
            }),
            AvroSchema::Boolean => encode_fn(move |e, value| match value.unwrap_union() {
                AvroValue::Boolean(b) => {
                    e.write_boolean(*b);
                    Ok(())
                }
                other => Err(mismatch(&path, "boolean", other)),
            }),
            AvroSchema::Int => encode_fn(move |e, value| match value.unwrap_union() {
                AvroValue::Int(i) => {
                    e.write_int(*i);
                    Ok(())
                }
                other => Err(mismatch(&path, "int", other)),
            }),
            AvroSchema::Long => encode_fn(move |e, value| match value.unwrap_union() {
                AvroValue::Long(l) => {
                    e.write_long(*l);
                    Ok(())
                }
                AvroValue::Int(i) => {
                    e.write_long(*i as i64);
                    Ok(())
                }
                other => Err(mismatch(&path, "long", other)),
            }),
            AvroSchema::Float => encode_fn(move |e, value| match value.unwrap_union() {
                AvroValue::Float(f) => {
                    e.write_float(*f);
                    Ok(())
                }
                AvroValue::Int(i) => {
                    e.write_float(*i as f32);
                    Ok(())
                }
                AvroValue::Long(l) => {
                    e.write_float(*l as f32);
                    Ok(())
                }
                other => Err(mismatch(&path, "float", other)),
            }),
            AvroSchema::Double => encode_fn(move |e, value| match value.unwrap_union() {
                AvroValue::Double(d) => {
                    e.write_double(*d);
                    Ok(())
                }
                AvroValue::Float(f) => {
                    e.write_double(*f as f64);
                    Ok(())
                }
                AvroValue::Int(i) => {
                    e.write_double(*i as f64);
                    Ok(())
                }
                AvroValue::Long(l) => {
                    e.write_double(*l as f64);
                    Ok(())
                }
                other => Err(mismatch(&path, "double", other)),
            }),
            AvroSchema::Bytes => encode_fn(move |e, value| match value.unwrap_union() {
                AvroValue::Bytes(b) => {
                    e.write_bytes(b);
                    Ok(())
                }
                AvroValue::String(s) => {
                    e.write_bytes(s.as_bytes());
                    Ok(())
                }
                other => Err(mismatch(&path, "bytes", other)),
            }),
            AvroSchema::String => encode_fn(move |e, value| match value.unwrap_union() {
                AvroValue::String(s) => {
                    e.write_string(s);
                    Ok(())
                }
                AvroValue::Bytes(b) => {
                    let s = std::str::from_utf8(b).map_err(|err| {
                        EncodeError::InvalidValue(format!("{}: bytes are not UTF-8: {}", path, err))
                    })?;
                    e.write_string(s);
                    Ok(())
                }
                other => Err(mismatch(&path, "string", other)),
            }),
            AvroSchema::Enum(schema) => {
                let schema = schema.clone();
                encode_fn(move |e, value| {
                    let symbol = match value.unwrap_union() {
                        AvroValue::Enum(v) => v.symbol(),
                        AvroValue::String(s) => s.as_str(),
                        other => return Err(mismatch(&path, "enum", other)),
                    };
                    let ordinal = schema.symbol_index(symbol).ok_or_else(|| {
                        EncodeError::InvalidValue(format!(
                            "{}: '{}' is not a symbol of enum '{}'",
                            path,
                            symbol,
                            schema.fullname()
                        ))
                    })?;
                    e.write_enum_index(ordinal);
                    Ok(())
                })
            }
            AvroSchema::Fixed(schema) => {
                let (size, name) = (schema.size(), schema.fullname());
                encode_fn(move |e, value| {
                    let bytes = match value.unwrap_union() {
                        AvroValue::Fixed(f) => f.bytes(),
                        AvroValue::Bytes(b) => b.as_slice(),
                        other => return Err(mismatch(&path, "fixed", other)),
                    };
                    if bytes.len() != size {
                        return Err(EncodeError::InvalidValue(format!(
                            "{}: fixed '{}' requires {} bytes, got {}",
                            path,
                            name,
                            size,
                            bytes.len()
                        )));
                    }
                    e.write_fixed(bytes);
                    Ok(())
                })
            }
            AvroSchema::Array(items) => {
                let item = self.compile(items, &child_path(&path, "items"))?;
                encode_fn(move |e, value| match value.unwrap_union() {
                    AvroValue::Array(values) => {
                        e.write_block_count(values.len());
                        for v in values {
                            item(e, v)?;
                        }
                        e.write_block_end();
                        Ok(())
                    }
                    other => Err(mismatch(&path, "array", other)),
                })
            }
            AvroSchema::Map(values) => {
                let encode_value = self.compile(values, &child_path(&path, "values"))?;
                encode_fn(move |e, value| match value.unwrap_union() {
                    AvroValue::Map(entries) => {
                        e.write_block_count(entries.len());
                        for (key, v) in entries {
                            e.write_string(key);
                            encode_value(e, v)?;
                        }
                        e.write_block_end();
                        Ok(())
                    }
                    other => Err(mismatch(&path, "map", other)),
                })
            }
            AvroSchema::Union(union) => {
                let mut branches = Vec::with_capacity(union.len());
                for (i, branch) in union.branches().iter().enumerate() {
                    let target = match branch {
                        AvroSchema::Named(name) => self
                            .types
                            .get(name)
                            .ok_or_else(|| ResolveError::UnknownReference(name.clone()))?,
                        other => other,
                    };
                    let encode = self.compile(branch, &child_path(&path, &i.to_string()))?;
                    branches.push((BranchShape::of(target), encode));
                }
                encode_fn(move |e, value| {
                    let (index, payload) = select_branch(&branches, value)
                        .ok_or_else(|| mismatch(&path, "union branch", value.unwrap_union()))?;
                    e.write_union_index(index);
                    (branches[index].1)(e, payload)
                })
            }
            AvroSchema::Record(record) => self.record(record, &path)?,
            AvroSchema::Logical(logical) => logical_encoder(logical, path),
            AvroSchema::Named(name) => return Err(ResolveError::UnknownReference(name.clone())),
        })
    }

    fn record(&mut self, record: &'s RecordSchema, path: &str) -> Result<EncodeFn, ResolveError> {
        let name = record.fullname();
        if let Some(slot) = self.memo.get(&name) {
            if let Some(encode) = slot.get() {
                return Ok(encode.clone());
            }
            let slot = Arc::downgrade(slot);
            return Ok(encode_fn(move |e, value| {
                let slot = slot
                    .upgrade()
                    .ok_or_else(|| EncodeError::UnresolvedRecursion(name.clone()))?;
                let encode = slot
                    .get()
                    .ok_or_else(|| EncodeError::UnresolvedRecursion(name.clone()))?;
                encode(e, value)
            }));
        }

        let slot: Slot = Arc::new(OnceLock::new());
        self.memo.insert(name.clone(), slot.clone());
        self.slots.push(slot.clone());

        let layout = RecordLayout::build(record, self.types)?;
        let mut fields = Vec::with_capacity(record.fields().len());
        for field in record.fields() {
            let encode = self.compile(field.schema(), &child_path(&name, field.name()))?;
            fields.push((field.name().to_string(), encode));
        }

        let path = path.to_string();
        let encode = encode_fn(move |e, value| {
            let record = match value.unwrap_union() {
                AvroValue::Record(r) => r,
                other => return Err(mismatch(&path, "record", other)),
            };
            if record.layout().same_fields(&layout) {
                for ((_, encode), v) in fields.iter().zip(record.values()) {
                    encode(e, v)?;
                }
                return Ok(());
            }
            for (i, (field, encode)) in fields.iter().enumerate() {
                let v = record
                    .get(field)
                    .or_else(|| layout.default_at(i))
                    .ok_or_else(|| {
                        EncodeError::InvalidValue(format!(
                            "{}: record '{}' has no value for field '{}'",
                            path,
                            record.fullname(),
                            field
                        ))
                    })?;
                encode(e, v)?;
            }
            Ok(())
        });
        let _ = slot.set(encode.clone());
        Ok(encode)
    }
}

/// Choose the branch for a value: a tagged value keeps its tag when the
/// branch accepts the payload, anything else goes to the first exact match
/// and then to the first branch that converts it.
fn select_branch<'v>(
    branches: &[(BranchShape, EncodeFn)],
    value: &'v AvroValue,
) -> Option<(usize, &'v AvroValue)> {
    let payload = value.unwrap_union();
    if let AvroValue::Union(tagged) = value {
        if let Some((shape, _)) = branches.get(tagged.branch()) {
            if shape.compatible(payload) {
                return Some((tagged.branch(), payload));
            }
        }
    }
    branches
        .iter()
        .position(|(shape, _)| shape.exact(payload))
        .or_else(|| branches.iter().position(|(shape, _)| shape.compatible(payload)))
        .map(|index| (index, payload))
}

fn logical_encoder(logical: &LogicalType, path: String) -> EncodeFn {
    let expected = logical.logical_type().name();
    match (*logical.logical_type(), logical.base()) {
        (LogicalTypeName::Decimal { precision, scale }, base) => {
            let fixed_size = match base {
                AvroSchema::Fixed(f) => Some(f.size()),
                _ => None,
            };
            encode_fn(move |e, value| {
                let decimal = match value.unwrap_union() {
                    AvroValue::Decimal(d) => d,
                    other => return Err(mismatch(&path, expected, other)),
                };
                if decimal.scale() != scale {
                    return Err(EncodeError::InvalidValue(format!(
                        "{}: decimal scale {} does not match schema scale {}",
                        path,
                        decimal.scale(),
                        scale
                    )));
                }
                if decimal.digits() > precision as usize {
                    return Err(EncodeError::InvalidValue(format!(
                        "{}: decimal {} exceeds precision {}",
                        path, decimal, precision
                    )));
                }
                match fixed_size {
                    Some(size) => {
                        let bytes = decimal
                            .to_fixed_bytes(size)
                            .map_err(|err| EncodeError::InvalidValue(format!("{}: {}", path, err)))?;
                        e.write_fixed(&bytes);
                    }
                    None => e.write_bytes(decimal.unscaled_bytes()),
                }
                Ok(())
            })
        }
        (LogicalTypeName::Uuid, _) => encode_fn(move |e, value| match value.unwrap_union() {
            AvroValue::Uuid(u) => {
                e.write_string(&u.hyphenated().to_string());
                Ok(())
            }
            AvroValue::String(s) => {
                let u = uuid::Uuid::parse_str(s).map_err(|err| {
                    EncodeError::InvalidValue(format!("{}: invalid uuid '{}': {}", path, s, err))
                })?;
                e.write_string(&u.hyphenated().to_string());
                Ok(())
            }
            other => Err(mismatch(&path, expected, other)),
        }),
        (LogicalTypeName::Date, _) => encode_fn(move |e, value| match value.unwrap_union() {
            AvroValue::Date(v) | AvroValue::Int(v) => {
                e.write_int(*v);
                Ok(())
            }
            other => Err(mismatch(&path, expected, other)),
        }),
        (LogicalTypeName::TimeMillis, _) => encode_fn(move |e, value| match value.unwrap_union() {
            AvroValue::TimeMillis(v) | AvroValue::Int(v) => {
                e.write_int(*v);
                Ok(())
            }
            other => Err(mismatch(&path, expected, other)),
        }),
        (LogicalTypeName::Duration, _) => encode_fn(move |e, value| match value.unwrap_union() {
            AvroValue::Duration(d) => {
                e.write_fixed(&d.to_bytes());
                Ok(())
            }
            AvroValue::Fixed(f) if f.bytes().len() == 12 => {
                e.write_fixed(f.bytes());
                Ok(())
            }
            other => Err(mismatch(&path, expected, other)),
        }),
        (_, _) => encode_fn(move |e, value| {
            let payload = value.unwrap_union();
            match payload {
                AvroValue::Long(v)
                | AvroValue::TimeMicros(v)
                | AvroValue::TimeNanos(v)
                | AvroValue::TimestampMillis(v)
                | AvroValue::TimestampMicros(v)
                | AvroValue::TimestampNanos(v)
                | AvroValue::LocalTimestampMillis(v)
                | AvroValue::LocalTimestampMicros(v)
                | AvroValue::LocalTimestampNanos(v)
                    if matches!(payload, AvroValue::Long(_)) || payload.kind_name() == expected =>
                {
                    e.write_long(*v);
                    Ok(())
                }
                other => Err(mismatch(&path, expected, other)),
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_schema;
    use crate::value::{Decimal, Duration, GenericRecord, UnionValue};

    fn writer(schema: &str) -> ResolvedWriter {
        ResolvedWriter::new(&parse_schema(schema).unwrap()).unwrap()
    }

    fn encode(schema: &str, value: &AvroValue) -> Result<Vec<u8>, EncodeError> {
        let mut encoder = Encoder::new();
        writer(schema).encode(&mut encoder, value)?;
        Ok(encoder.as_bytes().to_vec())
    }

    #[test]
    fn test_int_widened_for_long_schema() {
        assert_eq!(encode(r#""long""#, &AvroValue::Int(64)).unwrap(), vec![0x80, 0x01]);
        assert!(matches!(
            encode(r#""int""#, &AvroValue::Long(1)),
            Err(EncodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_union_branch_inferred_from_value() {
        let schema = r#"["null", "string", "long"]"#;
        assert_eq!(encode(schema, &AvroValue::Null).unwrap(), vec![0x00]);
        assert_eq!(
            encode(schema, &AvroValue::String("a".into())).unwrap(),
            vec![0x02, 0x02, b'a']
        );
        // An int is not exact for any branch; it widens into the long branch.
        assert_eq!(encode(schema, &AvroValue::Int(1)).unwrap(), vec![0x04, 0x02]);
    }

    #[test]
    fn test_union_tag_respected() {
        let schema = r#"["float", "double"]"#;
        let tagged = AvroValue::Union(UnionValue::from_parts(1, AvroValue::Float(1.5)));
        let bytes = encode(schema, &tagged).unwrap();
        assert_eq!(bytes[0], 0x02);
        assert_eq!(&bytes[1..], &1.5f64.to_le_bytes());
    }

    #[test]
    fn test_record_fields_by_name_or_default() {
        let schema = r#"{"type": "record", "name": "P", "fields": [
            {"name": "a", "type": "int"},
            {"name": "b", "type": "string", "default": "x"}
        ]}"#;
        let other = parse_schema(
            r#"{"type": "record", "name": "P", "fields": [{"name": "a", "type": "int"}]}"#,
        )
        .unwrap();
        let record = GenericRecord::from_schema(&other).unwrap().with("a", 3).unwrap();
        assert_eq!(
            encode(schema, &AvroValue::Record(record)).unwrap(),
            vec![0x06, 0x02, b'x']
        );
    }

    #[test]
    fn test_record_built_by_caller_matches_by_position() {
        let schema = r#"{"type": "record", "name": "P", "fields": [
            {"name": "a", "type": "int"},
            {"name": "b", "type": "string"}
        ]}"#;
        let own = parse_schema(schema).unwrap();
        let record = GenericRecord::from_schema(&own)
            .unwrap()
            .with("a", 3)
            .unwrap()
            .with("b", "y")
            .unwrap();
        let compiled = RecordLayout::from_schema(&own).unwrap();
        assert!(!Arc::ptr_eq(record.layout(), &compiled));
        assert!(record.layout().same_fields(&compiled));
        assert_eq!(
            encode(schema, &AvroValue::Record(record)).unwrap(),
            vec![0x06, 0x02, b'y']
        );

        let reordered = parse_schema(
            r#"{"type": "record", "name": "P", "fields": [
                {"name": "b", "type": "string"},
                {"name": "a", "type": "int"}
            ]}"#,
        )
        .unwrap();
        let record = GenericRecord::from_schema(&reordered)
            .unwrap()
            .with("b", "y")
            .unwrap()
            .with("a", 3)
            .unwrap();
        assert!(!record.layout().same_fields(&compiled));
        assert_eq!(
            encode(schema, &AvroValue::Record(record)).unwrap(),
            vec![0x06, 0x02, b'y']
        );
    }

    #[test]
    fn test_decimal_scale_and_precision_checked() {
        let schema = r#"{"type": "bytes", "logicalType": "decimal", "precision": 4, "scale": 2}"#;
        assert_eq!(
            encode(schema, &AvroValue::Decimal(Decimal::from_i128(1234, 2))).unwrap(),
            vec![0x04, 0x04, 0xD2]
        );
        assert!(encode(schema, &AvroValue::Decimal(Decimal::from_i128(1234, 1))).is_err());
        assert!(encode(schema, &AvroValue::Decimal(Decimal::from_i128(12345, 2))).is_err());
    }

    #[test]
    fn test_duration_written_as_fixed() {
        let schema = r#"{"type": "fixed", "name": "D", "size": 12, "logicalType": "duration"}"#;
        let bytes = encode(schema, &AvroValue::Duration(Duration::new(12, 45, 98234))).unwrap();
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[..4], &12u32.to_be_bytes());
    }

    #[test]
    fn test_recursive_schema_encodes() {
        let schema = parse_schema(
            r#"{"type": "record", "name": "List", "fields": [
                {"name": "head", "type": "int"},
                {"name": "tail", "type": ["null", "List"]}
            ]}"#,
        )
        .unwrap();
        let writer = ResolvedWriter::new(&schema).unwrap();
        let tail = GenericRecord::from_schema(&schema)
            .unwrap()
            .with("head", 2)
            .unwrap()
            .with("tail", AvroValue::Null)
            .unwrap();
        let head = GenericRecord::from_schema(&schema)
            .unwrap()
            .with("head", 1)
            .unwrap()
            .with("tail", AvroValue::Record(tail))
            .unwrap();

        let mut encoder = Encoder::new();
        writer.encode(&mut encoder, &AvroValue::Record(head)).unwrap();
        assert_eq!(encoder.as_bytes(), &[0x02, 0x02, 0x04, 0x00]);
    }
}
