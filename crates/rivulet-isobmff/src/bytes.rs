//! Bounds-checked big-endian reads.

use crate::error::Error;

pub(crate) fn read_u16(data: &[u8], offset: usize) -> Result<u16, Error> {
    let bytes = slice(data, offset, 2)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

pub(crate) fn read_u32(data: &[u8], offset: usize) -> Result<u32, Error> {
    let bytes = slice(data, offset, 4)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub(crate) fn read_u64(data: &[u8], offset: usize) -> Result<u64, Error> {
    let bytes = slice(data, offset, 8)?;
    Ok(u64::from_be_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ]))
}

fn slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8], Error> {
    let end = offset.checked_add(len).ok_or(Error::BufferUnderflow {
        need: usize::MAX,
        have: data.len(),
    })?;
    data.get(offset..end).ok_or(Error::BufferUnderflow {
        need: end,
        have: data.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_reads() {
        let data = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        assert_eq!(read_u16(&data, 0).unwrap(), 0x0001);
        assert_eq!(read_u32(&data, 2).unwrap(), 0x0203_0405);
        assert_eq!(read_u64(&data, 0).unwrap(), 0x0001_0203_0405_0607);
    }

    #[test]
    fn test_underflow() {
        let data = [0u8; 3];
        assert_eq!(
            read_u32(&data, 0),
            Err(Error::BufferUnderflow { need: 4, have: 3 })
        );
        assert!(read_u16(&data, 2).is_err());
    }
}
