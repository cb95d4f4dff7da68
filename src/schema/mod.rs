//! Avro schema types and parsing.
//!
//! Schema values, their JSON text form in both directions, the named type
//! registry and fingerprints.

mod fingerprint;
mod name;
mod parser;
mod properties;
mod registry;
mod types;
mod writer;

pub use fingerprint::rabin;
pub use name::{validate_identifier, validate_namespace, Name};
pub use parser::{parse_schema, SchemaParser};
pub use properties::{Properties, RESERVED_KEYS};
pub use registry::NamedTypes;
pub use types::*;
pub use writer::{to_json, RenderMode};
