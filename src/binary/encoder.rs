//! Avro binary encoder for primitive types.
//!
//! Arrays and maps are always written as non-negative block counts followed
//! by a terminating zero block.

use bytes::{BufMut, Bytes, BytesMut};

use super::varint;

/// Growable output buffer for Avro binary data.
#[derive(Debug, Default, Clone)]
pub struct Encoder {
    buf: BytesMut,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Take the written bytes, leaving the encoder empty for reuse.
    pub fn split(&mut self) -> Bytes {
        self.buf.split().freeze()
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Drop everything written after the first `len` bytes.
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }

    #[inline]
    pub fn write_null(&mut self) {}

    #[inline]
    pub fn write_boolean(&mut self, value: bool) {
        self.buf.put_u8(value as u8);
    }

    #[inline]
    pub fn write_int(&mut self, value: i32) {
        varint::write_zigzag(&mut self.buf, value as i64);
    }

    #[inline]
    pub fn write_long(&mut self, value: i64) {
        varint::write_zigzag(&mut self.buf, value);
    }

    #[inline]
    pub fn write_float(&mut self, value: f32) {
        self.buf.put_f32_le(value);
    }

    #[inline]
    pub fn write_double(&mut self, value: f64) {
        self.buf.put_f64_le(value);
    }

    /// Write length-prefixed bytes.
    #[inline]
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.write_long(value.len() as i64);
        self.buf.put_slice(value);
    }

    #[inline]
    pub fn write_string(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    /// Write raw bytes with no length prefix.
    #[inline]
    pub fn write_fixed(&mut self, value: &[u8]) {
        self.buf.put_slice(value);
    }

    #[inline]
    pub fn write_enum_index(&mut self, ordinal: usize) {
        self.write_int(ordinal as i32);
    }

    #[inline]
    pub fn write_union_index(&mut self, branch: usize) {
        self.write_long(branch as i64);
    }

    /// Start an array/map block of `count` items. Empty blocks are not written.
    #[inline]
    pub fn write_block_count(&mut self, count: usize) {
        if count > 0 {
            self.write_long(count as i64);
        }
    }

    /// Terminate an array/map.
    #[inline]
    pub fn write_block_end(&mut self) {
        self.buf.put_u8(0);
    }
}
