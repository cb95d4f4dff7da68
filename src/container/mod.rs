//! Object container files
//!
//! A container file is a header (magic, metadata, sync marker) followed by
//! blocks of records, each block terminated by the header's sync marker.
//! Blocks are the unit of compression and of splitting work.

mod block;
mod header;
mod io;
mod reader;
mod writer;

pub use block::Block;
pub use header::{Header, SyncMarker, CODEC_KEY, MAGIC, RESERVED_PREFIX, SCHEMA_KEY, SYNC_SIZE};
pub use reader::{ContainerReader, ReaderConfig};
pub use writer::{ContainerWriter, WriterConfig};
