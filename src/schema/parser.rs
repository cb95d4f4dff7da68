//! Schema text parsing.
//!
//! Parses Avro schema JSON into the AvroSchema type hierarchy. Every node is
//! built through the validating constructors, so parse errors and
//! construction errors share one error type.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::SchemaError;
use crate::schema::{
    AvroSchema, EnumSchema, FieldOrder, FieldSchema, FixedSchema, LogicalType, LogicalTypeName,
    Name, Properties, RecordSchema,
};

/// Parse schema text.
///
/// # Example
/// ```
/// use avrokit::schema::parse_schema;
///
/// let schema = parse_schema(r#""string""#).unwrap();
/// ```
pub fn parse_schema(json: &str) -> Result<AvroSchema, SchemaError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| SchemaError::ParseError(format!("Invalid JSON: {}", e)))?;
    SchemaParser::new().parse(&value)
}

/// Parser state carried across one schema document.
///
/// Records every named type as it is defined so later references can
/// resolve against it. A name must be defined before it is
/// referenced, except that a record may refer to itself from its own fields.
#[derive(Debug, Default)]
pub struct SchemaParser {
    /// Defined named types by full name
    named_types: HashMap<String, AvroSchema>,
    /// Enclosing namespace for unqualified names
    current_namespace: Option<String>,
}

impl SchemaParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema from parsed JSON.
    pub fn parse(&mut self, value: &Value) -> Result<AvroSchema, SchemaError> {
        match value {
            Value::String(s) => self.parse_string_schema(s),
            Value::Object(obj) => self.parse_object_schema(obj),
            Value::Array(arr) => self.parse_union_schema(arr),
            _ => Err(SchemaError::InvalidSchema(format!(
                "Expected string, object, or array, found: {}",
                value
            ))),
        }
    }

    /// Named types defined so far.
    pub fn named_types(&self) -> &HashMap<String, AvroSchema> {
        &self.named_types
    }

    /// Bare string: primitive name or reference to a defined type.
    fn parse_string_schema(&self, s: &str) -> Result<AvroSchema, SchemaError> {
        if let Some(primitive) = primitive(s) {
            return Ok(primitive);
        }
        self.lookup_reference(s)
    }

    fn lookup_reference(&self, name: &str) -> Result<AvroSchema, SchemaError> {
        let qualified = Name::resolve(name, self.current_namespace.as_deref())?.fullname();
        if self.named_types.contains_key(&qualified) {
            return Ok(AvroSchema::Named(qualified));
        }
        // Unqualified names fall back to the null namespace
        if self.named_types.contains_key(name) {
            return Ok(AvroSchema::Named(name.to_string()));
        }
        Err(SchemaError::UnsupportedType(format!(
            "Unknown type: {}",
            name
        )))
    }

    /// Object form: `{"type": ...}`.
    fn parse_object_schema(&mut self, obj: &Map<String, Value>) -> Result<AvroSchema, SchemaError> {
        let type_value = obj
            .get("type")
            .ok_or_else(|| SchemaError::InvalidSchema("Missing 'type' field".to_string()))?;

        let type_str = match type_value {
            Value::String(s) => s.as_str(),
            // {"type": {...}} and {"type": [...]} wrap a nested schema
            nested => return self.parse(nested),
        };

        let base = match type_str {
            "record" => return self.parse_record_schema(obj, false),
            "error" => return self.parse_record_schema(obj, true),
            "enum" => return self.parse_enum_schema(obj),
            "array" => return self.parse_array_schema(obj),
            "map" => return self.parse_map_schema(obj),
            "fixed" => self.parse_fixed_schema(obj)?,
            other => match primitive(other) {
                Some(p) => p,
                None => return self.lookup_reference(other),
            },
        };

        self.maybe_wrap_logical(obj, base)
    }

    /// Array form: a union.
    fn parse_union_schema(&mut self, arr: &[Value]) -> Result<AvroSchema, SchemaError> {
        let branches = arr
            .iter()
            .map(|v| self.parse(v))
            .collect::<Result<Vec<_>, _>>()?;
        AvroSchema::union(branches)
    }

    /// Resolve the `name`/`namespace` attributes of a named type.
    fn parse_name(&self, obj: &Map<String, Value>, kind: &str) -> Result<Name, SchemaError> {
        let name = obj.get("name").and_then(|v| v.as_str()).ok_or_else(|| {
            SchemaError::InvalidSchema(format!("{} missing 'name' field", kind))
        })?;

        if name.contains('.') {
            return Name::new(name);
        }

        match obj.get("namespace") {
            Some(Value::String(ns)) => Name::with_namespace(name, ns),
            Some(Value::Null) => Name::new(name),
            Some(other) => Err(SchemaError::InvalidSchema(format!(
                "{} '{}' has non-string namespace {}",
                kind, name, other
            ))),
            None => Name::resolve(name, self.current_namespace.as_deref()),
        }
    }

    fn define(&mut self, fullname: String, schema: AvroSchema) {
        self.named_types.insert(fullname, schema);
    }

    fn check_undefined(&self, name: &Name) -> Result<(), SchemaError> {
        let fullname = name.fullname();
        if self.named_types.contains_key(&fullname) {
            return Err(SchemaError::Duplicate {
                kind: "named type",
                name: fullname,
            });
        }
        Ok(())
    }

    /// Parse a record or error schema.
    fn parse_record_schema(
        &mut self,
        obj: &Map<String, Value>,
        is_error: bool,
    ) -> Result<AvroSchema, SchemaError> {
        let kind = if is_error { "Error" } else { "Record" };
        let name = self.parse_name(obj, kind)?;
        self.check_undefined(&name)?;
        let fullname = name.fullname();

        // registered first so fields may refer back to it
        self.define(fullname.clone(), AvroSchema::Named(fullname.clone()));

        let fields_value = obj
            .get("fields")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                SchemaError::InvalidSchema(format!("{} '{}' missing 'fields' array", kind, name))
            })?;

        // Nested definitions inherit this record's namespace
        let prev_namespace = std::mem::replace(
            &mut self.current_namespace,
            name.namespace().map(String::from),
        );
        let fields = fields_value
            .iter()
            .map(|f| self.parse_field_schema(f))
            .collect::<Result<Vec<_>, _>>();
        self.current_namespace = prev_namespace;

        let record = if is_error {
            RecordSchema::error(name, fields?)?
        } else {
            RecordSchema::new(name, fields?)?
        };
        let mut record = record
            .with_aliases(parse_aliases(obj)?)?
            .with_properties(Properties::from_json_object(obj));
        if let Some(doc) = parse_doc(obj) {
            record = record.with_doc(doc);
        }

        let schema = AvroSchema::Record(record);
        self.define(fullname, schema.clone());
        Ok(schema)
    }

    /// One entry of a record's `fields` array.
    fn parse_field_schema(&mut self, value: &Value) -> Result<FieldSchema, SchemaError> {
        let obj = value
            .as_object()
            .ok_or_else(|| SchemaError::InvalidSchema("Field must be an object".to_string()))?;

        let name = obj
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SchemaError::InvalidSchema("Field missing 'name'".to_string()))?;

        let type_value = obj.get("type").ok_or_else(|| {
            SchemaError::InvalidSchema(format!("Field '{}' missing 'type'", name))
        })?;
        let schema = self.parse(type_value)?;

        let order = match obj.get("order") {
            None => FieldOrder::Ascending,
            Some(Value::String(s)) => match s.as_str() {
                "ascending" => FieldOrder::Ascending,
                "descending" => FieldOrder::Descending,
                "ignore" => FieldOrder::Ignore,
                other => {
                    return Err(SchemaError::InvalidSchema(format!(
                        "Field '{}' has invalid order '{}'",
                        name, other
                    )))
                }
            },
            Some(other) => {
                return Err(SchemaError::InvalidSchema(format!(
                    "Field '{}' has non-string order {}",
                    name, other
                )))
            }
        };

        let mut field = FieldSchema::new(name, schema)?
            .with_order(order)
            .with_aliases(parse_aliases(obj)?)?
            .with_properties(Properties::from_json_object(obj));
        if let Some(default) = obj.get("default") {
            field = field.with_default(default.clone());
        }
        if let Some(doc) = parse_doc(obj) {
            field = field.with_doc(doc);
        }
        Ok(field)
    }

    /// Parse an enum schema.
    fn parse_enum_schema(&mut self, obj: &Map<String, Value>) -> Result<AvroSchema, SchemaError> {
        let name = self.parse_name(obj, "Enum")?;
        self.check_undefined(&name)?;
        let fullname = name.fullname();

        let symbols = obj
            .get("symbols")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                SchemaError::InvalidSchema(format!("Enum '{}' missing 'symbols' array", name))
            })?
            .iter()
            .map(|v| {
                v.as_str().map(String::from).ok_or_else(|| {
                    SchemaError::InvalidSchema(format!("Enum symbol must be a string, found {}", v))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut enum_schema = EnumSchema::new(name, symbols)?
            .with_aliases(parse_aliases(obj)?)?
            .with_properties(Properties::from_json_object(obj));
        match obj.get("default") {
            None => {}
            Some(Value::String(symbol)) => enum_schema = enum_schema.with_default(symbol.as_str())?,
            Some(other) => {
                return Err(SchemaError::InvalidSchema(format!(
                    "Enum default must be a string, found {}",
                    other
                )))
            }
        }
        if let Some(doc) = parse_doc(obj) {
            enum_schema = enum_schema.with_doc(doc);
        }

        let schema = AvroSchema::Enum(enum_schema);
        self.define(fullname, schema.clone());
        Ok(schema)
    }

    /// Parse an array schema.
    fn parse_array_schema(&mut self, obj: &Map<String, Value>) -> Result<AvroSchema, SchemaError> {
        let items = obj
            .get("items")
            .ok_or_else(|| SchemaError::InvalidSchema("Array missing 'items' field".to_string()))?;
        Ok(AvroSchema::array(self.parse(items)?))
    }

    /// Parse a map schema.
    fn parse_map_schema(&mut self, obj: &Map<String, Value>) -> Result<AvroSchema, SchemaError> {
        let values = obj
            .get("values")
            .ok_or_else(|| SchemaError::InvalidSchema("Map missing 'values' field".to_string()))?;
        Ok(AvroSchema::map(self.parse(values)?))
    }

    /// Parse a fixed schema.
    fn parse_fixed_schema(&mut self, obj: &Map<String, Value>) -> Result<AvroSchema, SchemaError> {
        let name = self.parse_name(obj, "Fixed")?;
        self.check_undefined(&name)?;
        let fullname = name.fullname();

        let size = obj.get("size").and_then(|v| v.as_u64()).ok_or_else(|| {
            SchemaError::InvalidSchema(format!(
                "Fixed '{}' missing non-negative integer 'size'",
                name
            ))
        })? as usize;

        let mut fixed = FixedSchema::new(name, size)
            .with_aliases(parse_aliases(obj)?)?
            .with_properties(Properties::from_json_object(obj));
        if let Some(doc) = parse_doc(obj) {
            fixed = fixed.with_doc(doc);
        }

        let schema = AvroSchema::Fixed(fixed);
        self.define(fullname, schema.clone());
        Ok(schema)
    }

    /// Wrap `base` in a logical type if the object carries a known `logicalType`.
    ///
    /// Unknown logical types are ignored and the base type is used. A known
    /// logical type with invalid parameters is an error.
    fn maybe_wrap_logical(
        &mut self,
        obj: &Map<String, Value>,
        base: AvroSchema,
    ) -> Result<AvroSchema, SchemaError> {
        let Some(logical_value) = obj.get("logicalType") else {
            return Ok(base);
        };
        let logical_name = logical_value.as_str().ok_or_else(|| {
            SchemaError::InvalidSchema("logicalType must be a string".to_string())
        })?;

        let logical_type = match logical_name {
            "decimal" => {
                let precision = decimal_param(obj, "precision")?.ok_or_else(|| {
                    SchemaError::InvalidLogicalType {
                        logical_type: "decimal",
                        message: "missing 'precision'".to_string(),
                    }
                })?;
                let scale = decimal_param(obj, "scale")?.unwrap_or(0);
                LogicalTypeName::Decimal { precision, scale }
            }
            other => match LogicalTypeName::from_name(other) {
                Some(lt) => lt,
                None => {
                    debug!(logical_type = other, "ignoring unknown logical type");
                    return Ok(base);
                }
            },
        };

        let properties = if matches!(base, AvroSchema::Fixed(_)) {
            Properties::new()
        } else {
            Properties::from_json_object(obj)
        };
        Ok(AvroSchema::Logical(
            LogicalType::new(base, logical_type)?.with_properties(properties),
        ))
    }
}

fn primitive(name: &str) -> Option<AvroSchema> {
    Some(match name {
        "null" => AvroSchema::Null,
        "boolean" => AvroSchema::Boolean,
        "int" => AvroSchema::Int,
        "long" => AvroSchema::Long,
        "float" => AvroSchema::Float,
        "double" => AvroSchema::Double,
        "bytes" => AvroSchema::Bytes,
        "string" => AvroSchema::String,
        _ => return None,
    })
}

fn parse_doc(obj: &Map<String, Value>) -> Option<String> {
    obj.get("doc").and_then(|v| v.as_str()).map(String::from)
}

fn parse_aliases(obj: &Map<String, Value>) -> Result<Vec<String>, SchemaError> {
    match obj.get("aliases") {
        None => Ok(Vec::new()),
        Some(Value::Array(arr)) => arr
            .iter()
            .map(|v| {
                v.as_str().map(String::from).ok_or_else(|| {
                    SchemaError::InvalidSchema(format!("Alias must be a string, found {}", v))
                })
            })
            .collect(),
        Some(other) => Err(SchemaError::InvalidSchema(format!(
            "'aliases' must be an array, found {}",
            other
        ))),
    }
}

fn decimal_param(obj: &Map<String, Value>, key: &str) -> Result<Option<u32>, SchemaError> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| SchemaError::InvalidLogicalType {
                logical_type: "decimal",
                message: format!("'{}' must be a non-negative integer, found {}", key, v),
            }),
    }
}
