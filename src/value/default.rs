//! Materialization of JSON field defaults.
//!
//! Defaults follow the JSON encoding used in schema text: bytes and fixed
//! values are strings whose code points 0-255 are the byte values, a union
//! default belongs to the union's first branch, and logical types use the
//! JSON form of their underlying type.

use std::sync::Arc;

use serde_json::Value;

use super::{AvroValue, Decimal, Duration, EnumValue, FixedValue, GenericRecord, UnionValue};
use super::record::RecordLayout;
use crate::schema::{AvroSchema, LogicalType, LogicalTypeName, NamedTypes};

/// Convert a JSON default into a value of `schema`.
pub(crate) fn default_value(
    json: &Value,
    schema: &AvroSchema,
    registry: &NamedTypes,
) -> Result<AvroValue, String> {
    let mismatch = || format!("{} is not a valid {}", json, schema.type_name());

    Ok(match schema {
        AvroSchema::Null => match json {
            Value::Null => AvroValue::Null,
            _ => return Err(mismatch()),
        },
        AvroSchema::Boolean => AvroValue::Boolean(json.as_bool().ok_or_else(mismatch)?),
        AvroSchema::Int => AvroValue::Int(
            json.as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(mismatch)?,
        ),
        AvroSchema::Long => AvroValue::Long(json.as_i64().ok_or_else(mismatch)?),
        AvroSchema::Float => AvroValue::Float(json.as_f64().ok_or_else(mismatch)? as f32),
        AvroSchema::Double => AvroValue::Double(json.as_f64().ok_or_else(mismatch)?),
        AvroSchema::Bytes => AvroValue::Bytes(latin1_bytes(json).ok_or_else(mismatch)?),
        AvroSchema::String => AvroValue::String(json.as_str().ok_or_else(mismatch)?.to_string()),
        AvroSchema::Array(items) => {
            let arr = json.as_array().ok_or_else(mismatch)?;
            AvroValue::Array(
                arr.iter()
                    .map(|item| default_value(item, items, registry))
                    .collect::<Result<_, _>>()?,
            )
        }
        AvroSchema::Map(values) => {
            let obj = json.as_object().ok_or_else(mismatch)?;
            AvroValue::Map(
                obj.iter()
                    .map(|(k, v)| Ok((k.clone(), default_value(v, values, registry)?)))
                    .collect::<Result<_, String>>()?,
            )
        }
        AvroSchema::Union(union) => {
            let first = union.branches().first().ok_or_else(mismatch)?;
            AvroValue::Union(UnionValue::from_parts(
                0,
                default_value(json, first, registry)?,
            ))
        }
        AvroSchema::Record(record) => {
            let obj = json.as_object().ok_or_else(mismatch)?;
            let layout = RecordLayout::build(record, registry).map_err(|e| e.to_string())?;
            let mut value = GenericRecord::new(layout);
            for (i, field) in record.fields().iter().enumerate() {
                let field_value = match obj.get(field.name()) {
                    Some(v) => default_value(v, field.schema(), registry)?,
                    None => match value.layout().default_at(i) {
                        Some(d) => d.clone(),
                        None => {
                            return Err(format!(
                                "{} is missing field '{}' of record '{}'",
                                json,
                                field.name(),
                                record.fullname()
                            ))
                        }
                    },
                };
                value.set_unchecked(i, field_value);
            }
            AvroValue::Record(value)
        }
        AvroSchema::Enum(e) => {
            let symbol = json.as_str().ok_or_else(mismatch)?;
            AvroValue::Enum(
                EnumValue::from_symbol(Arc::new(e.clone()), symbol).map_err(|e| e.to_string())?,
            )
        }
        AvroSchema::Fixed(f) => {
            let bytes = latin1_bytes(json).ok_or_else(mismatch)?;
            AvroValue::Fixed(FixedValue::new(Arc::new(f.clone()), bytes).map_err(|e| e.to_string())?)
        }
        AvroSchema::Named(_) => {
            let target = registry.deref(schema).map_err(|e| e.to_string())?;
            default_value(json, target, registry)?
        }
        AvroSchema::Logical(logical) => logical_default(json, logical, registry)?,
    })
}

fn logical_default(
    json: &Value,
    logical: &LogicalType,
    registry: &NamedTypes,
) -> Result<AvroValue, String> {
    let base = default_value(json, logical.base(), registry)?;
    let invalid = || format!("{} is not a valid {}", json, logical.logical_type().name());

    Ok(match (logical.logical_type(), base) {
        (LogicalTypeName::Decimal { scale, .. }, AvroValue::Bytes(bytes)) => {
            AvroValue::Decimal(Decimal::from_be_bytes(&bytes, *scale))
        }
        (LogicalTypeName::Decimal { scale, .. }, AvroValue::Fixed(fixed)) => {
            AvroValue::Decimal(Decimal::from_be_bytes(fixed.bytes(), *scale))
        }
        (LogicalTypeName::Uuid, AvroValue::String(s)) => {
            AvroValue::Uuid(uuid::Uuid::parse_str(&s).map_err(|e| e.to_string())?)
        }
        (LogicalTypeName::Date, AvroValue::Int(v)) => AvroValue::Date(v),
        (LogicalTypeName::TimeMillis, AvroValue::Int(v)) => AvroValue::TimeMillis(v),
        (LogicalTypeName::TimeMicros, AvroValue::Long(v)) => AvroValue::TimeMicros(v),
        (LogicalTypeName::TimeNanos, AvroValue::Long(v)) => AvroValue::TimeNanos(v),
        (LogicalTypeName::TimestampMillis, AvroValue::Long(v)) => AvroValue::TimestampMillis(v),
        (LogicalTypeName::TimestampMicros, AvroValue::Long(v)) => AvroValue::TimestampMicros(v),
        (LogicalTypeName::TimestampNanos, AvroValue::Long(v)) => AvroValue::TimestampNanos(v),
        (LogicalTypeName::LocalTimestampMillis, AvroValue::Long(v)) => {
            AvroValue::LocalTimestampMillis(v)
        }
        (LogicalTypeName::LocalTimestampMicros, AvroValue::Long(v)) => {
            AvroValue::LocalTimestampMicros(v)
        }
        (LogicalTypeName::LocalTimestampNanos, AvroValue::Long(v)) => {
            AvroValue::LocalTimestampNanos(v)
        }
        (LogicalTypeName::Duration, AvroValue::Fixed(fixed)) => {
            let bytes: [u8; 12] = fixed.bytes().try_into().map_err(|_| invalid())?;
            AvroValue::Duration(Duration::from_bytes(bytes))
        }
        _ => return Err(invalid()),
    })
}

/// Bytes encoded as a JSON string of code points 0-255.
fn latin1_bytes(json: &Value) -> Option<Vec<u8>> {
    json.as_str()?
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_schema;
    use serde_json::json;

    fn convert(schema: &str, json: Value) -> Result<AvroValue, String> {
        let schema = parse_schema(schema).unwrap();
        let registry = NamedTypes::build_from_schema(&schema).unwrap();
        default_value(&json, &schema, &registry)
    }

    #[test]
    fn test_primitive_defaults() {
        assert_eq!(convert(r#""int""#, json!(5)).unwrap(), AvroValue::Int(5));
        assert!(convert(r#""int""#, json!(5_000_000_000i64)).is_err());
        assert_eq!(
            convert(r#""double""#, json!(1)).unwrap(),
            AvroValue::Double(1.0)
        );
        assert_eq!(
            convert(r#""bytes""#, json!("\u{00ff}a")).unwrap(),
            AvroValue::Bytes(vec![0xFF, b'a'])
        );
        assert!(convert(r#""bytes""#, json!("\u{0100}")).is_err());
    }

    #[test]
    fn test_union_default_uses_first_branch() {
        let value = convert(r#"["null", "string"]"#, json!(null)).unwrap();
        assert!(matches!(value, AvroValue::Union(ref u) if u.branch() == 0 && u.is_null()));
        assert!(convert(r#"["null", "string"]"#, json!("x")).is_err());
    }

    #[test]
    fn test_record_default_fills_nested_defaults() {
        let value = convert(
            r#"{"type": "record", "name": "P", "fields": [
                {"name": "x", "type": "int"},
                {"name": "y", "type": "int", "default": 9}
            ]}"#,
            json!({"x": 1}),
        )
        .unwrap();
        let AvroValue::Record(record) = value else {
            panic!("expected record");
        };
        assert_eq!(record.get("x"), Some(&AvroValue::Int(1)));
        assert_eq!(record.get("y"), Some(&AvroValue::Int(9)));
    }

    #[test]
    fn test_logical_defaults() {
        let value = convert(
            r#"{"type": "bytes", "logicalType": "decimal", "precision": 4, "scale": 2}"#,
            json!("\u{0004}\u{00d2}"),
        )
        .unwrap();
        assert_eq!(value, AvroValue::Decimal(Decimal::from_i128(1234, 2)));

        let value = convert(
            r#"{"type": "string", "logicalType": "uuid"}"#,
            json!("123e4567-e89b-12d3-a456-426614174000"),
        )
        .unwrap();
        assert!(matches!(value, AvroValue::Uuid(_)));

        let value = convert(r#"{"type": "int", "logicalType": "date"}"#, json!(19000)).unwrap();
        assert_eq!(value, AvroValue::Date(19000));
    }

    #[test]
    fn test_enum_default() {
        let value = convert(
            r#"{"type": "enum", "name": "E", "symbols": ["A", "B"]}"#,
            json!("B"),
        )
        .unwrap();
        assert!(matches!(value, AvroValue::Enum(ref e) if e.ordinal() == 1));
        assert!(convert(
            r#"{"type": "enum", "name": "E", "symbols": ["A", "B"]}"#,
            json!("C")
        )
        .is_err());
    }
}
