//! Generic record values.
//!
//! A record value is an ordered list of field values plus a shared
//! `RecordLayout`: the field-name index and the pre-materialized defaults,
//! computed once per record schema and shared by every value built from it.

use std::collections::HashMap;
use std::sync::Arc;

use super::default::default_value;
use super::AvroValue;
use crate::error::{ResolveError, ValueError};
use crate::schema::{AvroSchema, NamedTypes, RecordSchema};

/// Field layout shared by all records of one schema.
#[derive(Debug)]
pub struct RecordLayout {
    fullname: String,
    fields: Vec<String>,
    index: HashMap<String, usize>,
    defaults: Vec<(usize, AvroValue)>,
}

impl RecordLayout {
    /// Build the layout of a record schema, materializing field defaults.
    pub fn from_schema(schema: &AvroSchema) -> Result<Arc<Self>, ResolveError> {
        let registry = NamedTypes::build_from_schema(schema)?;
        match registry.deref(schema)? {
            AvroSchema::Record(record) => Self::build(record, &registry),
            other => Err(ResolveError::TypeMismatch {
                path: String::new(),
                reader: "record".to_string(),
                writer: other.type_name(),
            }),
        }
    }

    pub(crate) fn build(
        record: &RecordSchema,
        registry: &NamedTypes,
    ) -> Result<Arc<Self>, ResolveError> {
        let fields: Vec<String> = record.fields().iter().map(|f| f.name().to_string()).collect();
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        let mut defaults = Vec::new();
        for (i, field) in record.fields().iter().enumerate() {
            if let Some(json) = field.default() {
                let value = default_value(json, field.schema(), registry).map_err(|message| {
                    ResolveError::InvalidDefault {
                        field: format!("{}.{}", record.fullname(), field.name()),
                        message,
                    }
                })?;
                defaults.push((i, value));
            }
        }

        Ok(Arc::new(Self {
            fullname: record.fullname(),
            fields,
            index,
            defaults,
        }))
    }

    pub fn fullname(&self) -> &str {
        &self.fullname
    }

    /// True when both layouts hold the same fields in the same order, so
    /// values can be matched by position.
    pub fn same_fields(&self, other: &RecordLayout) -> bool {
        std::ptr::eq(self, other) || self.fields == other.fields
    }

    pub fn field_names(&self) -> &[String] {
        &self.fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Default value of the field at `index`, if it declares one.
    pub fn default_at(&self, index: usize) -> Option<&AvroValue> {
        self.defaults
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, v)| v)
    }
}

/// A record value.
#[derive(Debug, Clone)]
pub struct GenericRecord {
    layout: Arc<RecordLayout>,
    values: Vec<AvroValue>,
}

impl GenericRecord {
    /// Create a record with defaults applied; fields without a default hold null.
    pub fn new(layout: Arc<RecordLayout>) -> Self {
        let mut values = vec![AvroValue::Null; layout.len()];
        for (i, default) in &layout.defaults {
            values[*i] = default.clone();
        }
        Self { layout, values }
    }

    /// Create a record directly from a record schema.
    pub fn from_schema(schema: &AvroSchema) -> Result<Self, ResolveError> {
        Ok(Self::new(RecordLayout::from_schema(schema)?))
    }

    pub fn layout(&self) -> &Arc<RecordLayout> {
        &self.layout
    }

    pub fn fullname(&self) -> &str {
        &self.layout.fullname
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&AvroValue> {
        self.layout.field_index(name).map(|i| &self.values[i])
    }

    pub fn get_index(&self, index: usize) -> Option<&AvroValue> {
        self.values.get(index)
    }

    /// Assign a field by name.
    pub fn put(&mut self, name: &str, value: impl Into<AvroValue>) -> Result<(), ValueError> {
        let index = self
            .layout
            .field_index(name)
            .ok_or_else(|| ValueError::UnknownField {
                record: self.layout.fullname.clone(),
                field: name.to_string(),
            })?;
        self.values[index] = value.into();
        Ok(())
    }

    /// Assign a field by position.
    pub fn put_index(&mut self, index: usize, value: impl Into<AvroValue>) -> Result<(), ValueError> {
        let fields = self.values.len();
        let slot = self
            .values
            .get_mut(index)
            .ok_or_else(|| ValueError::FieldIndexOutOfRange {
                record: self.layout.fullname.clone(),
                index,
                fields,
            })?;
        *slot = value.into();
        Ok(())
    }

    /// Builder-style `put`.
    pub fn with(mut self, name: &str, value: impl Into<AvroValue>) -> Result<Self, ValueError> {
        self.put(name, value)?;
        Ok(self)
    }

    /// Iterate over `(field name, value)` pairs in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &AvroValue)> {
        self.layout
            .fields
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn values(&self) -> &[AvroValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<AvroValue> {
        self.values
    }

    /// Place a decoded value without a bounds check on the field name.
    #[inline]
    pub(crate) fn set_unchecked(&mut self, index: usize, value: AvroValue) {
        self.values[index] = value;
    }
}

impl PartialEq for GenericRecord {
    fn eq(&self, other: &Self) -> bool {
        self.layout.fullname == other.layout.fullname && self.values == other.values
    }
}
