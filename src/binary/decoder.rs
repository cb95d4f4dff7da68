//! Avro binary decoder for primitive types.
//!
//! Binary encoding rules:
//! - Varints use zigzag encoding for signed integers
//! - Floats and doubles are little-endian IEEE 754
//! - Bytes and strings are length-prefixed
//!
//! Every `read_*` has a matching `skip_*` that advances the cursor by the
//! same number of bytes without materializing a value.

use super::varint;
use crate::error::DecodeError;

/// Default cap on the items of a single array or map.
pub const DEFAULT_MAX_COLLECTION_ITEMS: usize = 1 << 24;

/// Forward-only cursor over a byte slice.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    data: &'a [u8],
    consumed: usize,
    max_collection_items: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            consumed: 0,
            max_collection_items: DEFAULT_MAX_COLLECTION_ITEMS,
        }
    }

    /// Limit the total items one array or map may declare across its blocks.
    ///
    /// Items such as `null` or an empty record take no bytes, so block
    /// counts cannot be checked against the remaining input.
    pub fn with_max_collection_items(mut self, limit: usize) -> Self {
        self.max_collection_items = limit;
        self
    }

    pub fn max_collection_items(&self) -> usize {
        self.max_collection_items
    }

    /// Fail if a block of `count` items would take a collection that already
    /// holds `seen` items past the limit.
    #[inline]
    pub fn check_collection_items(&self, seen: usize, count: usize) -> Result<(), DecodeError> {
        if count > self.max_collection_items.saturating_sub(seen) {
            return Err(DecodeError::CollectionTooLarge {
                items: seen.saturating_add(count),
                limit: self.max_collection_items,
            });
        }
        Ok(())
    }

    /// Bytes consumed since construction.
    pub fn position(&self) -> usize {
        self.consumed
    }

    /// The unread tail.
    pub fn remaining(&self) -> &'a [u8] {
        self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    fn advance(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.data.len() < n {
            return Err(DecodeError::UnexpectedEof);
        }
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        self.consumed += n;
        Ok(head)
    }

    #[inline]
    fn tracked<T>(
        &mut self,
        f: impl FnOnce(&mut &'a [u8]) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        let before = self.data.len();
        let result = f(&mut self.data);
        self.consumed += before - self.data.len();
        result
    }

    /// Null values have no binary representation.
    #[inline]
    pub fn read_null(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }

    /// Decode a boolean: 0x00 for false, 0x01 for true.
    #[inline]
    pub fn read_boolean(&mut self) -> Result<bool, DecodeError> {
        match self.advance(1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(DecodeError::InvalidData(format!(
                "Invalid boolean value: {}, expected 0 or 1",
                byte
            ))),
        }
    }

    /// Decode a 32-bit signed integer (zigzag varint encoded).
    #[inline]
    pub fn read_int(&mut self) -> Result<i32, DecodeError> {
        let long = self.read_long()?;
        i32::try_from(long).map_err(|_| {
            DecodeError::InvalidData(format!("Integer overflow: {} does not fit in i32", long))
        })
    }

    /// Decode a 64-bit signed integer (zigzag varint encoded).
    #[inline]
    pub fn read_long(&mut self) -> Result<i64, DecodeError> {
        self.tracked(varint::decode_zigzag)
    }

    /// Decode a 32-bit IEEE 754 float (little-endian).
    #[inline]
    pub fn read_float(&mut self) -> Result<f32, DecodeError> {
        let bytes = self.advance(4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Decode a 64-bit IEEE 754 double (little-endian).
    #[inline]
    pub fn read_double(&mut self) -> Result<f64, DecodeError> {
        let bytes = self.advance(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(f64::from_le_bytes(buf))
    }

    fn read_len(&mut self) -> Result<usize, DecodeError> {
        let len = self.read_long()?;
        usize::try_from(len)
            .map_err(|_| DecodeError::InvalidData(format!("Negative length: {}", len)))
    }

    /// Decode length-prefixed bytes without copying.
    #[inline]
    pub fn read_bytes_ref(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_len()?;
        self.advance(len)
    }

    /// Decode length-prefixed bytes.
    #[inline]
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        self.read_bytes_ref().map(<[u8]>::to_vec)
    }

    /// Decode a UTF-8 string without copying.
    #[inline]
    pub fn read_str(&mut self) -> Result<&'a str, DecodeError> {
        let bytes = self.read_bytes_ref()?;
        std::str::from_utf8(bytes)
            .map_err(|e| DecodeError::InvalidData(format!("Invalid UTF-8: {}", e)))
    }

    /// Decode a UTF-8 string.
    #[inline]
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        String::from_utf8(self.read_bytes()?).map_err(DecodeError::from)
    }

    /// Read `size` raw bytes (fixed values carry no length prefix).
    #[inline]
    pub fn read_fixed(&mut self, size: usize) -> Result<&'a [u8], DecodeError> {
        self.advance(size)
    }

    /// Read an enum ordinal.
    #[inline]
    pub fn read_enum_index(&mut self) -> Result<usize, DecodeError> {
        let index = self.read_int()?;
        usize::try_from(index)
            .map_err(|_| DecodeError::InvalidData(format!("Negative enum index: {}", index)))
    }

    /// Read a union branch index and check it against the branch count.
    #[inline]
    pub fn read_union_index(&mut self, branches: usize) -> Result<usize, DecodeError> {
        let index = self.read_long()?;
        match usize::try_from(index) {
            Ok(i) if i < branches => Ok(i),
            _ => Err(DecodeError::UnionIndexOutOfRange { index, branches }),
        }
    }

    /// Read the item count of the next array/map block.
    ///
    /// Returns `None` at the terminating zero block. A negative count is
    /// followed by the block's byte size, which is read and discarded.
    pub fn read_block_count(&mut self) -> Result<Option<usize>, DecodeError> {
        let count = self.read_long()?;
        if count == 0 {
            return Ok(None);
        }
        if count < 0 {
            let _byte_size = self.read_long()?;
        }
        usize::try_from(count.unsigned_abs())
            .map(Some)
            .map_err(|_| DecodeError::InvalidData(format!("Block count too large: {}", count)))
    }

    #[inline]
    pub fn skip_boolean(&mut self) -> Result<(), DecodeError> {
        self.advance(1).map(drop)
    }

    /// Skip an int or long.
    #[inline]
    pub fn skip_varint(&mut self) -> Result<(), DecodeError> {
        self.tracked(varint::skip_varint)
    }

    #[inline]
    pub fn skip_float(&mut self) -> Result<(), DecodeError> {
        self.advance(4).map(drop)
    }

    #[inline]
    pub fn skip_double(&mut self) -> Result<(), DecodeError> {
        self.advance(8).map(drop)
    }

    /// Skip a bytes or string value.
    #[inline]
    pub fn skip_bytes(&mut self) -> Result<(), DecodeError> {
        let len = self.read_len()?;
        self.advance(len).map(drop)
    }

    #[inline]
    pub fn skip_fixed(&mut self, size: usize) -> Result<(), DecodeError> {
        self.advance(size).map(drop)
    }

    /// Skip a blocked array/map, calling `skip_item` once per item.
    ///
    /// Blocks written with a negative count are skipped by their byte size
    /// without visiting the items.
    pub fn skip_blocks(
        &mut self,
        mut skip_item: impl FnMut(&mut Self) -> Result<(), DecodeError>,
    ) -> Result<(), DecodeError> {
        let mut seen = 0usize;
        loop {
            let count = self.read_long()?;
            if count == 0 {
                return Ok(());
            }
            if count < 0 {
                let byte_size = self.read_len()?;
                self.advance(byte_size)?;
                continue;
            }
            let count = usize::try_from(count)
                .map_err(|_| DecodeError::InvalidData(format!("Block count too large: {}", count)))?;
            self.check_collection_items(seen, count)?;
            seen += count;
            for _ in 0..count {
                skip_item(self)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_boolean() {
        let mut decoder = Decoder::new(&[0x00, 0x01, 0x02]);
        assert!(!decoder.read_boolean().unwrap());
        assert!(decoder.read_boolean().unwrap());
        assert!(matches!(
            decoder.read_boolean(),
            Err(DecodeError::InvalidData(_))
        ));
    }

    #[test]
    fn test_read_int_overflow() {
        // zigzag(2^31) does not fit in i32
        let mut decoder = Decoder::new(&[0x80, 0x80, 0x80, 0x80, 0x10]);
        assert!(decoder.read_int().is_err());
    }

    #[test]
    fn test_read_float_double_little_endian() {
        let mut data = Vec::new();
        data.extend_from_slice(&1.5f32.to_le_bytes());
        data.extend_from_slice(&(-2.25f64).to_le_bytes());
        let mut decoder = Decoder::new(&data);
        assert_eq!(decoder.read_float().unwrap(), 1.5);
        assert_eq!(decoder.read_double().unwrap(), -2.25);
        assert_eq!(decoder.position(), 12);
        assert!(decoder.is_empty());
    }

    #[test]
    fn test_read_string_and_bytes() {
        let data = [0x08, b'a', b'b', b'c', b'd', 0x02, 0xFF];
        let mut decoder = Decoder::new(&data);
        assert_eq!(decoder.read_string().unwrap(), "abcd");
        assert_eq!(decoder.read_bytes().unwrap(), vec![0xFF]);
        assert_eq!(decoder.position(), data.len());
    }

    #[test]
    fn test_invalid_utf8() {
        let mut decoder = Decoder::new(&[0x02, 0xFF]);
        assert!(matches!(
            decoder.read_string(),
            Err(DecodeError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn test_negative_length() {
        let mut decoder = Decoder::new(&[0x01]);
        assert!(matches!(
            decoder.read_bytes(),
            Err(DecodeError::InvalidData(_))
        ));
    }

    #[test]
    fn test_truncated_bytes() {
        let mut decoder = Decoder::new(&[0x06, b'a']);
        assert!(matches!(
            decoder.read_bytes(),
            Err(DecodeError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_union_index_range() {
        let mut decoder = Decoder::new(&[0x02, 0x04, 0x01]);
        assert_eq!(decoder.read_union_index(2).unwrap(), 1);
        assert!(matches!(
            decoder.read_union_index(2),
            Err(DecodeError::UnionIndexOutOfRange {
                index: 2,
                branches: 2
            })
        ));
        assert!(matches!(
            decoder.read_union_index(2),
            Err(DecodeError::UnionIndexOutOfRange { index: -1, .. })
        ));
    }

    #[test]
    fn test_block_count_negative_form() {
        // count -2 (zigzag 0x03), byte size 2 (0x04), then two ints, then 0
        let data = [0x03, 0x04, 0x02, 0x04, 0x00];
        let mut decoder = Decoder::new(&data);
        assert_eq!(decoder.read_block_count().unwrap(), Some(2));
        assert_eq!(decoder.read_int().unwrap(), 1);
        assert_eq!(decoder.read_int().unwrap(), 2);
        assert_eq!(decoder.read_block_count().unwrap(), None);
    }

    #[test]
    fn test_skip_blocks_uses_byte_size() {
        let data = [0x03, 0x04, 0x02, 0x04, 0x02, 0x06, 0x00, 0xAA];
        let mut decoder = Decoder::new(&data);
        let mut visited = 0;
        decoder
            .skip_blocks(|d| {
                visited += 1;
                d.skip_varint()
            })
            .unwrap();
        // Only the positive-count block visits its item
        assert_eq!(visited, 1);
        assert_eq!(decoder.remaining(), &[0xAA]);
    }

    #[test]
    fn test_collection_item_limit() {
        let decoder = Decoder::new(&[]).with_max_collection_items(10);
        assert!(decoder.check_collection_items(0, 10).is_ok());
        assert!(decoder.check_collection_items(4, 6).is_ok());
        assert!(matches!(
            decoder.check_collection_items(4, 7),
            Err(DecodeError::CollectionTooLarge { items: 11, limit: 10 })
        ));
        assert!(decoder
            .check_collection_items(usize::MAX, usize::MAX)
            .is_err());
    }

    #[test]
    fn test_skip_blocks_rejects_huge_zero_width_count() {
        // count 2^62 of zero-width items
        let mut data = Vec::new();
        varint::write_zigzag(&mut data, 1i64 << 62);
        let mut decoder = Decoder::new(&data);
        let mut visited = 0u64;
        let result = decoder.skip_blocks(|_| {
            visited += 1;
            Ok(())
        });
        assert!(matches!(result, Err(DecodeError::CollectionTooLarge { .. })));
        assert_eq!(visited, 0);
    }
}
