//! Avro binary encoding.
//!
//! Primitive read, write and skip operations over a byte cursor. Schema
//! driven coding is built on top of these by the `resolve` module.

mod decoder;
mod encoder;
pub mod varint;

pub use decoder::{Decoder, DEFAULT_MAX_COLLECTION_ITEMS};
pub use encoder::Encoder;
