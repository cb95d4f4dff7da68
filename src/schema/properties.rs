//! Custom schema attributes.
//!
//! Any JSON attribute on a schema node that the format itself does not
//! interpret is kept here, in declaration order. Keys the format reserves
//! are rejected when inserted.

use serde_json::Value;

use crate::error::SchemaError;

/// Attribute keys that carry schema structure and cannot be set as properties.
pub const RESERVED_KEYS: &[&str] = &[
    "type",
    "name",
    "namespace",
    "fields",
    "items",
    "values",
    "symbols",
    "size",
    "doc",
    "aliases",
    "default",
    "order",
    "logicalType",
    "precision",
    "scale",
];

/// Ordered string-keyed metadata map attached to a schema node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: Vec<(String, Value)>,
}

impl Properties {
    /// Create an empty property map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `key` is reserved.
    pub fn is_reserved(key: &str) -> bool {
        RESERVED_KEYS.contains(&key)
    }

    /// Insert or replace a property, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: Value,
    ) -> Result<Option<Value>, SchemaError> {
        let key = key.into();
        if Self::is_reserved(&key) {
            return Err(SchemaError::ReservedProperty(key));
        }
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Ok(Some(std::mem::replace(existing, value))),
            None => {
                self.entries.push((key, value));
                Ok(None)
            }
        }
    }

    /// Get a property value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Remove a property.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Iterate over properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no properties.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Collect every non-reserved attribute of a JSON schema object.
    pub(crate) fn from_json_object(obj: &serde_json::Map<String, Value>) -> Self {
        let entries = obj
            .iter()
            .filter(|(k, _)| !Self::is_reserved(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { entries }
    }
}
