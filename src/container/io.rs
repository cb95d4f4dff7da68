//! Stream-level primitives for reading container structure.
//!
//! Record payloads are decoded from in-memory blocks with [`Decoder`]; only
//! the header and block framing are read straight from the stream.
//!
//! [`Decoder`]: crate::binary::Decoder

use std::io::{ErrorKind, Read};

use crate::binary::varint::MAX_VARINT_LEN;
use crate::error::ContainerError;

fn unexpected_eof(offset: u64) -> ContainerError {
    ContainerError::Parse {
        offset,
        message: "unexpected end of file".to_string(),
    }
}

fn read_byte<R: Read>(reader: &mut R) -> Result<Option<u8>, ContainerError> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Read a zig-zag long, returning `None` on a clean end of stream.
///
/// End of stream after the first byte of the varint is a parse error.
pub(crate) fn read_long<R: Read>(
    reader: &mut R,
    offset: &mut u64,
) -> Result<Option<i64>, ContainerError> {
    let start = *offset;
    let mut value: u64 = 0;
    for i in 0..MAX_VARINT_LEN {
        let byte = match read_byte(reader)? {
            Some(b) => b,
            None if i == 0 => return Ok(None),
            None => return Err(unexpected_eof(*offset)),
        };
        *offset += 1;
        value |= ((byte & 0x7F) as u64) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(Some(((value >> 1) as i64) ^ -((value & 1) as i64)));
        }
    }
    Err(ContainerError::Parse {
        offset: start,
        message: "varint exceeds 10 bytes".to_string(),
    })
}

pub(crate) fn read_long_required<R: Read>(
    reader: &mut R,
    offset: &mut u64,
) -> Result<i64, ContainerError> {
    read_long(reader, offset)?.ok_or_else(|| unexpected_eof(*offset))
}

pub(crate) fn read_exact<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    offset: &mut u64,
) -> Result<(), ContainerError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => unexpected_eof(*offset),
        _ => ContainerError::Io(e),
    })?;
    *offset += buf.len() as u64;
    Ok(())
}

/// Read a length, rejecting negative values.
pub(crate) fn read_len<R: Read>(reader: &mut R, offset: &mut u64) -> Result<usize, ContainerError> {
    let start = *offset;
    let len = read_long_required(reader, offset)?;
    usize::try_from(len).map_err(|_| ContainerError::Parse {
        offset: start,
        message: format!("negative length {}", len),
    })
}

/// Read exactly `len` bytes without trusting `len` for the allocation size.
pub(crate) fn read_vec<R: Read>(
    reader: &mut R,
    len: usize,
    offset: &mut u64,
) -> Result<Vec<u8>, ContainerError> {
    let mut buf = Vec::new();
    reader.take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(unexpected_eof(*offset + buf.len() as u64));
    }
    *offset += len as u64;
    Ok(buf)
}

pub(crate) fn read_bytes<R: Read>(
    reader: &mut R,
    offset: &mut u64,
) -> Result<Vec<u8>, ContainerError> {
    let len = read_len(reader, offset)?;
    read_vec(reader, len, offset)
}

pub(crate) fn read_string<R: Read>(
    reader: &mut R,
    offset: &mut u64,
) -> Result<String, ContainerError> {
    let start = *offset;
    let bytes = read_bytes(reader, offset)?;
    String::from_utf8(bytes).map_err(|e| ContainerError::Parse {
        offset: start,
        message: format!("invalid UTF-8 in metadata key: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::varint::encode_zigzag;

    #[test]
    fn test_read_long_values() {
        for value in [0i64, -1, 1, 64, -65, i64::MAX, i64::MIN] {
            let bytes = encode_zigzag(value);
            let mut offset = 0;
            let read = read_long(&mut bytes.as_slice(), &mut offset).unwrap();
            assert_eq!(read, Some(value));
            assert_eq!(offset, bytes.len() as u64);
        }
    }

    #[test]
    fn test_read_long_clean_eof() {
        let mut offset = 0;
        assert_eq!(read_long(&mut &[][..], &mut offset).unwrap(), None);
    }

    #[test]
    fn test_read_long_truncated() {
        let mut offset = 0;
        assert!(matches!(
            read_long(&mut &[0x80][..], &mut offset),
            Err(ContainerError::Parse { offset: 1, .. })
        ));
    }

    #[test]
    fn test_read_vec_short() {
        let mut offset = 0;
        assert!(matches!(
            read_vec(&mut &[1, 2][..], 5, &mut offset),
            Err(ContainerError::Parse { offset: 2, .. })
        ));
    }

    #[test]
    fn test_negative_length() {
        let mut offset = 0;
        assert!(matches!(
            read_bytes(&mut &[0x01][..], &mut offset),
            Err(ContainerError::Parse { .. })
        ));
    }
}
