//! Schema text rendering.
//!
//! Three renderings are produced:
//! - `Canonical`: the Parsing Canonical Form. Only `name`, `type`, `fields`,
//!   `symbols`, `items`, `values` and `size` are kept, names are fully
//!   qualified, keys appear in that order and there is no whitespace. Logical
//!   annotations are dropped, so canonical equality means "same binary layout".
//! - `Default`: the compact form a schema author would write. Optional
//!   attributes appear only when set.
//! - `Full`: every optional attribute is written out, including empty alias
//!   lists, field sort orders and explicit namespaces.
//!
//! In every mode a named type is defined once; later occurrences are written
//! as a name reference.

use std::collections::HashSet;

use serde_json::Value;

use crate::schema::{
    AvroSchema, EnumSchema, FieldSchema, FixedSchema, LogicalType, LogicalTypeName, Name,
    Properties, RecordSchema,
};

/// Which rendering to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Canonical,
    Default,
    Full,
}

/// Render `schema` as JSON text.
pub fn to_json(schema: &AvroSchema, mode: RenderMode) -> String {
    let mut writer = SchemaWriter {
        mode,
        defined: HashSet::new(),
    };
    writer.render(schema, None)
}

struct SchemaWriter {
    mode: RenderMode,
    defined: HashSet<String>,
}

type Entries = Vec<(&'static str, String)>;

impl SchemaWriter {
    fn render(&mut self, schema: &AvroSchema, enclosing: Option<&str>) -> String {
        match schema {
            AvroSchema::Null => quote("null"),
            AvroSchema::Boolean => quote("boolean"),
            AvroSchema::Int => quote("int"),
            AvroSchema::Long => quote("long"),
            AvroSchema::Float => quote("float"),
            AvroSchema::Double => quote("double"),
            AvroSchema::Bytes => quote("bytes"),
            AvroSchema::String => quote("string"),
            AvroSchema::Array(items) => {
                let items = self.render(items, enclosing);
                format!(r#"{{"type":"array","items":{}}}"#, items)
            }
            AvroSchema::Map(values) => {
                let values = self.render(values, enclosing);
                format!(r#"{{"type":"map","values":{}}}"#, values)
            }
            AvroSchema::Union(union) => {
                let branches: Vec<String> = union
                    .branches()
                    .iter()
                    .map(|b| self.render(b, enclosing))
                    .collect();
                format!("[{}]", branches.join(","))
            }
            AvroSchema::Named(name) => quote(name),
            AvroSchema::Record(record) => match self.first_definition(record.name()) {
                true => {
                    let entries = self.record_entries(record, enclosing);
                    self.object(entries, record.properties())
                }
                false => quote(&record.fullname()),
            },
            AvroSchema::Enum(e) => match self.first_definition(e.name()) {
                true => self.object(self.enum_entries(e, enclosing), e.properties()),
                false => quote(&e.fullname()),
            },
            AvroSchema::Fixed(f) => match self.first_definition(f.name()) {
                true => self.object(self.fixed_entries(f, enclosing), f.properties()),
                false => quote(&f.fullname()),
            },
            AvroSchema::Logical(logical) => self.render_logical(logical, enclosing),
        }
    }

    fn first_definition(&mut self, name: &Name) -> bool {
        self.defined.insert(name.fullname())
    }

    /// Leading `name`/`type`/`namespace` entries of a named type.
    fn name_entries(&self, name: &Name, type_name: &str, enclosing: Option<&str>) -> Entries {
        if self.mode == RenderMode::Canonical {
            return vec![("name", quote(&name.fullname())), ("type", quote(type_name))];
        }

        let mut entries = vec![("type", quote(type_name)), ("name", quote(name.name()))];
        match (name.namespace(), enclosing) {
            (Some(ns), _) if self.mode == RenderMode::Full || Some(ns) != enclosing => {
                entries.push(("namespace", quote(ns)));
            }
            // Leave an enclosing namespace explicitly
            (None, Some(_)) => entries.push(("namespace", quote(""))),
            _ => {}
        }
        entries
    }

    fn descriptive_entries(
        &self,
        entries: &mut Entries,
        doc: Option<&str>,
        aliases: &[String],
    ) {
        if let Some(doc) = doc {
            entries.push(("doc", quote(doc)));
        }
        if !aliases.is_empty() || self.mode == RenderMode::Full {
            entries.push(("aliases", string_array(aliases)));
        }
    }

    fn record_entries(&mut self, record: &RecordSchema, enclosing: Option<&str>) -> Entries {
        let type_name = if record.is_error() { "error" } else { "record" };
        let mut entries = self.name_entries(record.name(), type_name, enclosing);
        let namespace = record.name().namespace();

        let fields: Vec<String> = record
            .fields()
            .iter()
            .map(|f| self.render_field(f, namespace))
            .collect();

        if self.mode == RenderMode::Canonical {
            entries.push(("fields", format!("[{}]", fields.join(","))));
            return entries;
        }

        self.descriptive_entries(&mut entries, record.doc(), record.aliases());
        entries.push(("fields", format!("[{}]", fields.join(","))));
        entries
    }

    fn render_field(&mut self, field: &FieldSchema, namespace: Option<&str>) -> String {
        let mut entries = vec![
            ("name", quote(field.name())),
            ("type", self.render(field.schema(), namespace)),
        ];
        if self.mode == RenderMode::Canonical {
            return self.object(entries, field.properties());
        }

        if let Some(default) = field.default() {
            entries.push(("default", default.to_string()));
        }
        if let Some(doc) = field.doc() {
            entries.push(("doc", quote(doc)));
        }
        if field.order() != Default::default() || self.mode == RenderMode::Full {
            entries.push(("order", quote(field.order().as_str())));
        }
        if !field.aliases().is_empty() || self.mode == RenderMode::Full {
            entries.push(("aliases", string_array(field.aliases())));
        }
        self.object(entries, field.properties())
    }

    fn enum_entries(&self, e: &EnumSchema, enclosing: Option<&str>) -> Entries {
        let mut entries = self.name_entries(e.name(), "enum", enclosing);
        if self.mode == RenderMode::Canonical {
            entries.push(("symbols", string_array(e.symbols())));
            return entries;
        }

        self.descriptive_entries(&mut entries, e.doc(), e.aliases());
        entries.push(("symbols", string_array(e.symbols())));
        if let Some(default) = e.default() {
            entries.push(("default", quote(default)));
        }
        entries
    }

    fn fixed_entries(&self, f: &FixedSchema, enclosing: Option<&str>) -> Entries {
        let mut entries = self.name_entries(f.name(), "fixed", enclosing);
        if self.mode == RenderMode::Canonical {
            entries.push(("size", f.size().to_string()));
            return entries;
        }

        self.descriptive_entries(&mut entries, f.doc(), f.aliases());
        entries.push(("size", f.size().to_string()));
        entries
    }

    fn render_logical(&mut self, logical: &LogicalType, enclosing: Option<&str>) -> String {
        if self.mode == RenderMode::Canonical {
            return self.render(logical.base(), enclosing);
        }

        let (mut entries, properties) = match logical.base() {
            AvroSchema::Fixed(f) => {
                if !self.first_definition(f.name()) {
                    return quote(&f.fullname());
                }
                (self.fixed_entries(f, enclosing), f.properties())
            }
            base => (
                vec![("type", self.render(base, enclosing))],
                logical.properties(),
            ),
        };

        entries.push(("logicalType", quote(logical.logical_type().name())));
        if let LogicalTypeName::Decimal { precision, scale } = logical.logical_type() {
            entries.push(("precision", precision.to_string()));
            if *scale > 0 || self.mode == RenderMode::Full {
                entries.push(("scale", scale.to_string()));
            }
        }
        self.object(entries, properties)
    }

    /// Join entries into a JSON object, appending custom properties outside canonical mode.
    fn object(&self, entries: Entries, properties: &Properties) -> String {
        let mut pairs: Vec<String> = entries
            .into_iter()
            .map(|(k, v)| format!("{}:{}", quote(k), v))
            .collect();
        if self.mode != RenderMode::Canonical {
            pairs.extend(properties.iter().map(|(k, v)| format!("{}:{}", quote(k), v)));
        }
        format!("{{{}}}", pairs.join(","))
    }
}

fn quote(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

fn string_array(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| quote(s)).collect();
    format!("[{}]", quoted.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_schema;

    #[test]
    fn test_canonical_primitives() {
        assert_eq!(AvroSchema::Int.canonical_form(), r#""int""#);
        assert_eq!(
            parse_schema(r#"{"type": "string"}"#).unwrap().canonical_form(),
            r#""string""#
        );
    }

    #[test]
    fn test_canonical_record_key_order_and_fullnames() {
        let schema = parse_schema(
            r#"{
                "namespace": "com.example",
                "doc": "A user",
                "fields": [
                    {"type": "long", "name": "id", "doc": "ignored"},
                    {"name": "suit", "type": {"symbols": ["A", "B"], "type": "enum", "name": "Suit"}},
                    {"name": "again", "type": "Suit"}
                ],
                "name": "User",
                "type": "record"
            }"#,
        )
        .unwrap();

        assert_eq!(
            schema.canonical_form(),
            concat!(
                r#"{"name":"com.example.User","type":"record","fields":["#,
                r#"{"name":"id","type":"long"},"#,
                r#"{"name":"suit","type":{"name":"com.example.Suit","type":"enum","symbols":["A","B"]}},"#,
                r#"{"name":"again","type":"com.example.Suit"}]}"#
            )
        );
    }

    #[test]
    fn test_canonical_strips_logical_type() {
        let schema =
            parse_schema(r#"{"type": "long", "logicalType": "timestamp-micros"}"#).unwrap();
        assert_eq!(schema.canonical_form(), r#""long""#);

        let schema = parse_schema(
            r#"{"type": "fixed", "name": "Money", "size": 8, "logicalType": "decimal", "precision": 12, "scale": 2}"#,
        )
        .unwrap();
        assert_eq!(
            schema.canonical_form(),
            r#"{"name":"Money","type":"fixed","size":8}"#
        );
    }

    #[test]
    fn test_default_rendering_reparses_to_equal_schema() {
        let text = r#"{
            "type": "record", "name": "Event", "namespace": "org.acme",
            "aliases": ["OldEvent"],
            "fields": [
                {"name": "at", "type": {"type": "long", "logicalType": "timestamp-millis"}},
                {"name": "amount", "type": {"type": "bytes", "logicalType": "decimal", "precision": 9, "scale": 2}},
                {"name": "tags", "type": {"type": "map", "values": "string"}, "default": {}},
                {"name": "kind", "type": {"type": "enum", "name": "Kind", "symbols": ["X", "Y"], "default": "X"}},
                {"name": "next", "type": ["null", "Event"], "default": null, "order": "ignore"}
            ]
        }"#;
        let schema = parse_schema(text).unwrap();
        let rendered = schema.to_json();
        let reparsed = parse_schema(&rendered).unwrap();

        assert_eq!(reparsed, schema);
        assert_eq!(reparsed.canonical_form(), schema.canonical_form());
        assert_eq!(reparsed.to_json(), rendered);
    }

    #[test]
    fn test_default_omits_unset_attributes() {
        let schema = parse_schema(
            r#"{"type": "record", "name": "R", "fields": [{"name": "a", "type": "int"}]}"#,
        )
        .unwrap();
        assert_eq!(
            schema.to_json(),
            r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"}]}"#
        );
    }

    #[test]
    fn test_full_materializes_optional_attributes() {
        let schema = parse_schema(
            r#"{"type": "record", "name": "R", "namespace": "n", "fields": [{"name": "a", "type": "int"}]}"#,
        )
        .unwrap();
        assert_eq!(
            to_json(&schema, RenderMode::Full),
            concat!(
                r#"{"type":"record","name":"R","namespace":"n","aliases":[],"#,
                r#""fields":[{"name":"a","type":"int","order":"ascending","aliases":[]}]}"#
            )
        );
    }

    #[test]
    fn test_properties_rendered_in_default_mode() {
        let schema = parse_schema(
            r#"{"type": "fixed", "name": "Hash", "size": 16, "encoding": "sha"}"#,
        )
        .unwrap();
        assert_eq!(
            schema.to_json(),
            r#"{"type":"fixed","name":"Hash","size":16,"encoding":"sha"}"#
        );
        assert_eq!(
            schema.canonical_form(),
            r#"{"name":"Hash","type":"fixed","size":16}"#
        );
    }

    #[test]
    fn test_null_namespace_inside_namespace() {
        let schema = parse_schema(
            r#"{"type": "record", "name": "Outer", "namespace": "a.b", "fields": [
                {"name": "inner", "type": {"type": "fixed", "name": "F", "namespace": "", "size": 2}}
            ]}"#,
        )
        .unwrap();
        let rendered = schema.to_json();
        assert!(rendered.contains(r#""name":"F","namespace":"""#));
        let reparsed = parse_schema(&rendered).unwrap();
        assert_eq!(reparsed.canonical_form(), schema.canonical_form());
    }
}
