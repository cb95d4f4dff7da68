//! Variable-length integers.
//!
//! `int` and `long` are written as zig-zag mapped values in base-128 groups,
//! least significant group first, with the high bit of each byte set while
//! more bytes follow. Zig-zag keeps small negative numbers short:
//! `0, -1, 1, -2` encode as `0, 1, 2, 3`.

use bytes::BufMut;

use crate::error::DecodeError;

/// Maximum encoded length of a 64-bit varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Read one base-128 group sequence as an unsigned value.
///
/// # Errors
/// - `DecodeError::UnexpectedEof` if the input is truncated
/// - `DecodeError::InvalidVarint` if the varint exceeds 10 bytes
#[inline]
pub fn decode_varint(data: &mut &[u8]) -> Result<u64, DecodeError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let (&byte, rest) = data.split_first().ok_or(DecodeError::UnexpectedEof)?;
        *data = rest;

        result |= u64::from(byte & 0x7F) << shift;

        if byte & 0x80 == 0 {
            return Ok(result);
        }

        shift += 7;

        if shift >= 64 {
            return Err(DecodeError::InvalidVarint);
        }
    }
}

/// Read a zig-zag encoded `long`.
#[inline]
pub fn decode_zigzag(data: &mut &[u8]) -> Result<i64, DecodeError> {
    let raw = decode_varint(data)?;
    Ok((raw >> 1) as i64 ^ -((raw & 1) as i64))
}

/// Advance past one varint.
#[inline]
pub fn skip_varint(data: &mut &[u8]) -> Result<(), DecodeError> {
    for _ in 0..MAX_VARINT_LEN {
        let (&byte, rest) = data.split_first().ok_or(DecodeError::UnexpectedEof)?;
        *data = rest;
        if byte & 0x80 == 0 {
            return Ok(());
        }
    }
    Err(DecodeError::InvalidVarint)
}

/// Append an unsigned varint to `buf`.
#[inline]
pub fn write_varint(buf: &mut impl BufMut, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.put_u8(byte);
            return;
        }
        buf.put_u8(byte | 0x80);
    }
}

/// Append a zigzag-encoded signed varint to `buf`.
#[inline]
pub fn write_zigzag(buf: &mut impl BufMut, value: i64) {
    write_varint(buf, ((value << 1) ^ (value >> 63)) as u64);
}

/// Encode a signed integer as a standalone zigzag varint.
pub fn encode_zigzag(value: i64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAX_VARINT_LEN);
    write_zigzag(&mut buf, value);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_byte_values() {
        let mut cursor: &[u8] = &[0x00];
        assert_eq!(decode_varint(&mut cursor).unwrap(), 0);
        assert!(cursor.is_empty());

        let mut cursor: &[u8] = &[0x7F];
        assert_eq!(decode_varint(&mut cursor).unwrap(), 127);
    }

    #[test]
    fn test_continuation_bytes() {
        let mut cursor: &[u8] = &[0xAC, 0x02];
        assert_eq!(decode_varint(&mut cursor).unwrap(), 300);

        let mut cursor: &[u8] = &[0x80, 0x80, 0x01];
        assert_eq!(decode_varint(&mut cursor).unwrap(), 16384);
    }

    #[test]
    fn test_truncated_varint() {
        let mut cursor: &[u8] = &[];
        assert!(matches!(
            decode_varint(&mut cursor),
            Err(DecodeError::UnexpectedEof)
        ));

        let mut cursor: &[u8] = &[0x80];
        assert!(matches!(
            decode_varint(&mut cursor),
            Err(DecodeError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_overlong_varint() {
        let mut cursor: &[u8] = &[0xFF; 11];
        assert!(matches!(
            decode_varint(&mut cursor),
            Err(DecodeError::InvalidVarint)
        ));

        let mut cursor: &[u8] = &[0xFF; 11];
        assert!(matches!(
            skip_varint(&mut cursor),
            Err(DecodeError::InvalidVarint)
        ));
    }

    #[test]
    fn test_zigzag_mapping() {
        for (value, encoded) in [(0i64, 0u8), (-1, 1), (1, 2), (-2, 3), (2, 4)] {
            assert_eq!(encode_zigzag(value), vec![encoded]);
            let mut cursor: &[u8] = &[encoded];
            assert_eq!(decode_zigzag(&mut cursor).unwrap(), value);
        }
    }

    #[test]
    fn test_boundary_encodings() {
        assert_eq!(encode_zigzag(64), vec![0x80, 0x01]);
        assert_eq!(
            encode_zigzag(i32::MIN as i64),
            vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]
        );

        let min = encode_zigzag(i64::MIN);
        assert_eq!(min.len(), 10);
        assert_eq!(min.last(), Some(&0x01));

        let mut cursor = &min[..];
        assert_eq!(decode_zigzag(&mut cursor).unwrap(), i64::MIN);

        let max = encode_zigzag(i64::MAX);
        let mut cursor = &max[..];
        assert_eq!(decode_zigzag(&mut cursor).unwrap(), i64::MAX);
    }

    #[test]
    fn test_skip_stops_after_last_group() {
        let mut cursor: &[u8] = &[0x80, 0x80, 0x01, 0xFF];
        skip_varint(&mut cursor).unwrap();
        assert_eq!(cursor, &[0xFF]);
    }
}
