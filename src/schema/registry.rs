//! Registry of named type definitions.
//!
//! Named references (`AvroSchema::Named`) are resolved against a registry
//! built from the schema tree that defines them. Schemas built with the
//! constructors can reference types defined elsewhere in the same tree,
//! including the enclosing record for recursive types.

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::schema::AvroSchema;

/// Named types by fully qualified name.
#[derive(Debug, Clone, Default)]
pub struct NamedTypes {
    types: HashMap<String, AvroSchema>,
}

impl NamedTypes {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every named definition in `schema`.
    ///
    /// Fails if two different definitions share a full name.
    pub fn build_from_schema(schema: &AvroSchema) -> Result<Self, SchemaError> {
        let mut registry = Self::new();
        registry.extract(schema)?;
        Ok(registry)
    }

    /// Register a definition. Re-registering an identical definition is a no-op.
    pub fn register(&mut self, schema: &AvroSchema) -> Result<(), SchemaError> {
        let fullname = match schema {
            AvroSchema::Record(_) | AvroSchema::Enum(_) | AvroSchema::Fixed(_) => {
                schema.fullname().unwrap_or_default()
            }
            _ => return Ok(()),
        };

        if let Some(existing) = self.types.get(&fullname) {
            if !same_definition(existing, schema) {
                return Err(SchemaError::Duplicate {
                    kind: "named type",
                    name: fullname,
                });
            }
            return Ok(());
        }
        self.types.insert(fullname, schema.clone());
        Ok(())
    }

    /// Get a named type by full name.
    pub fn get(&self, name: &str) -> Option<&AvroSchema> {
        self.types.get(name)
    }

    /// Check if a named type exists.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Follow a `Named` reference to its definition; other schemas are returned as-is.
    pub fn deref<'a>(&'a self, schema: &'a AvroSchema) -> Result<&'a AvroSchema, SchemaError> {
        match schema {
            AvroSchema::Named(name) => self.types.get(name).ok_or_else(|| {
                SchemaError::InvalidSchema(format!("Unresolved named type reference: '{}'", name))
            }),
            other => Ok(other),
        }
    }

    /// Check that every `Named` reference in `schema` has a definition.
    pub fn check_references(&self, schema: &AvroSchema) -> Result<(), SchemaError> {
        match schema {
            AvroSchema::Named(name) if !self.contains(name) => Err(SchemaError::InvalidSchema(
                format!("Unresolved named type reference: '{}'", name),
            )),
            AvroSchema::Record(record) => record
                .fields()
                .iter()
                .try_for_each(|f| self.check_references(f.schema())),
            AvroSchema::Array(inner) | AvroSchema::Map(inner) => self.check_references(inner),
            AvroSchema::Union(union) => union
                .branches()
                .iter()
                .try_for_each(|b| self.check_references(b)),
            AvroSchema::Logical(logical) => self.check_references(logical.base()),
            _ => Ok(()),
        }
    }

    fn extract(&mut self, schema: &AvroSchema) -> Result<(), SchemaError> {
        match schema {
            AvroSchema::Record(record) => {
                self.register(schema)?;
                for field in record.fields() {
                    self.extract(field.schema())?;
                }
            }
            AvroSchema::Enum(_) | AvroSchema::Fixed(_) => self.register(schema)?,
            AvroSchema::Array(inner) | AvroSchema::Map(inner) => self.extract(inner)?,
            AvroSchema::Union(union) => {
                for branch in union.branches() {
                    self.extract(branch)?;
                }
            }
            AvroSchema::Logical(logical) => self.extract(logical.base())?,
            // Primitives and references carry no definitions
            _ => {}
        }
        Ok(())
    }
}

fn same_definition(a: &AvroSchema, b: &AvroSchema) -> bool {
    match (a, b) {
        (AvroSchema::Record(a), AvroSchema::Record(b)) => a == b,
        (AvroSchema::Enum(a), AvroSchema::Enum(b)) => a == b,
        (AvroSchema::Fixed(a), AvroSchema::Fixed(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, FixedSchema, Name, RecordSchema};

    fn linked_list() -> AvroSchema {
        let next = AvroSchema::union(vec![
            AvroSchema::Null,
            AvroSchema::Named("LongList".to_string()),
        ])
        .unwrap();
        AvroSchema::Record(
            RecordSchema::new(
                Name::new("LongList").unwrap(),
                vec![
                    FieldSchema::new("value", AvroSchema::Long).unwrap(),
                    FieldSchema::new("next", next).unwrap(),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_build_from_recursive_schema() {
        let schema = linked_list();
        let registry = NamedTypes::build_from_schema(&schema).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("LongList"));
        registry.check_references(&schema).unwrap();

        let named = AvroSchema::Named("LongList".to_string());
        assert!(matches!(
            registry.deref(&named).unwrap(),
            AvroSchema::Record(_)
        ));
    }

    #[test]
    fn test_unknown_reference() {
        let schema = AvroSchema::array(AvroSchema::Named("Missing".to_string()));
        let registry = NamedTypes::build_from_schema(&schema).unwrap();
        assert!(registry.check_references(&schema).is_err());
    }

    #[test]
    fn test_conflicting_definitions() {
        let a = AvroSchema::Fixed(FixedSchema::new(Name::new("F").unwrap(), 4));
        let b = AvroSchema::Fixed(FixedSchema::new(Name::new("F").unwrap(), 8));
        let schema = AvroSchema::union(vec![AvroSchema::array(a), AvroSchema::map(b)]).unwrap();
        let err = NamedTypes::build_from_schema(&schema).unwrap_err();
        assert!(matches!(err, SchemaError::Duplicate { .. }));
    }
}
