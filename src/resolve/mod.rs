//! Schema resolution.
//!
//! A [`Resolver`] compiles schemas into closure trees once and caches them:
//! [`ResolvedReader`] for a (reader, writer) pair and [`ResolvedWriter`] for
//! a writer schema. Cache keys are the full JSON renderings of the schemas,
//! so two structurally identical schemas share one compiled tree while
//! schemas that differ only in logical types or defaults do not.

mod promotion;
mod reader;
mod writer;

pub use promotion::TypePromotion;
pub use reader::ResolvedReader;
pub use writer::ResolvedWriter;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::ResolveError;
use crate::schema::{to_json, AvroSchema, RenderMode};

/// Cache of compiled readers and writers.
///
/// Owned by whoever builds datum readers and writers; there is no global
/// cache.
#[derive(Debug, Default)]
pub struct Resolver {
    readers: HashMap<(String, String), Arc<ResolvedReader>>,
    writers: HashMap<String, Arc<ResolvedWriter>>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile (or fetch) the reader for data written as `writer` and read as `reader`.
    pub fn resolve(
        &mut self,
        reader: &AvroSchema,
        writer: &AvroSchema,
    ) -> Result<Arc<ResolvedReader>, ResolveError> {
        let key = (cache_key(reader), cache_key(writer));
        if let Some(resolved) = self.readers.get(&key) {
            debug!(reader = %reader.type_name(), writer = %writer.type_name(), "Resolver cache hit");
            return Ok(resolved.clone());
        }

        debug!(reader = %reader.type_name(), writer = %writer.type_name(), "Resolver cache miss");
        let resolved = Arc::new(ResolvedReader::new(reader, writer)?);
        self.readers.insert(key, resolved.clone());
        Ok(resolved)
    }

    /// Compile (or fetch) the encoder for `schema`.
    pub fn resolve_writer(
        &mut self,
        schema: &AvroSchema,
    ) -> Result<Arc<ResolvedWriter>, ResolveError> {
        let key = cache_key(schema);
        if let Some(resolved) = self.writers.get(&key) {
            debug!(schema = %schema.type_name(), "Resolver writer cache hit");
            return Ok(resolved.clone());
        }

        debug!(schema = %schema.type_name(), "Resolver writer cache miss");
        let resolved = Arc::new(ResolvedWriter::new(schema)?);
        self.writers.insert(key, resolved.clone());
        Ok(resolved)
    }

    /// Number of cached readers and writers.
    pub fn len(&self) -> usize {
        self.readers.len() + self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty() && self.writers.is_empty()
    }

    pub fn clear(&mut self) {
        self.readers.clear();
        self.writers.clear();
    }
}

/// Cache key for a schema: its `Full` rendering.
///
/// The canonical form drops logical annotations and field defaults, both of
/// which change the compiled closures, so two schemas with equal canonical
/// forms can still need different readers.
fn cache_key(schema: &AvroSchema) -> String {
    to_json(schema, RenderMode::Full)
}
