//! Multibyte integer encoding and decoding
//!
//! WBXML encodes unsigned integers (`mb_u_int32`) as a sequence of 7-bit groups, most
//! significant group first. Each byte uses:
//! - 7 bits for the value
//! - 1 "continuation" bit to indicate if more bytes follow
//!
//! The group order is the reverse of Protocol Buffers varints: `300` is written as `0x82 0x2C`.

use crate::Error;
use bytes::{Buf, BufMut};

const DATA_BITS_PER_BYTE: u32 = 7;
const DATA_BITS_MASK: u8 = 0x7F;
const CONTINUATION_BIT_MASK: u8 = 0x80;

/// Maximum number of bytes needed to encode a `u32`.
pub const MAX_LEN: usize = 5;

/// Encodes an unsigned integer as a multibyte integer.
pub fn write(value: u32, buf: &mut impl BufMut) {
    if value < u32::from(CONTINUATION_BIT_MASK) {
        // Fast path for small values (common case for lengths).
        buf.put_u8(value as u8);
        return;
    }

    // Collect groups from least to most significant, then emit in reverse.
    let mut groups = [0u8; MAX_LEN];
    let mut len = 0;
    let mut val = value;
    while val > 0 {
        groups[len] = (val as u8) & DATA_BITS_MASK;
        val >>= DATA_BITS_PER_BYTE;
        len += 1;
    }
    for i in (1..len).rev() {
        buf.put_u8(groups[i] | CONTINUATION_BIT_MASK);
    }
    buf.put_u8(groups[0]);
}

/// Decodes an unsigned integer from a multibyte integer.
///
/// Leading zero groups are accepted without limit. A value that does not fit in 32 bits is
/// rejected rather than truncated.
pub fn read(buf: &mut impl Buf) -> Result<u32, Error> {
    let mut result: u32 = 0;
    loop {
        if !buf.has_remaining() {
            return Err(Error::EndOfBuffer);
        }
        let byte = buf.get_u8();

        // Shifting in another group must not push set bits out of the accumulator.
        if result.leading_zeros() < DATA_BITS_PER_BYTE {
            return Err(Error::InvalidVarint);
        }
        result = (result << DATA_BITS_PER_BYTE) | u32::from(byte & DATA_BITS_MASK);

        if byte & CONTINUATION_BIT_MASK == 0 {
            return Ok(result);
        }
    }
}

/// Calculates the number of bytes needed to encode an unsigned integer as a multibyte integer.
pub fn size(value: u32) -> usize {
    let data_bits = u32::BITS - value.leading_zeros();
    usize::max(1, data_bits.div_ceil(DATA_BITS_PER_BYTE) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use test_case::test_case;

    #[test_case(0, &[0x00]; "zero")]
    #[test_case(1, &[0x01]; "one")]
    #[test_case(127, &[0x7F]; "largest single byte")]
    #[test_case(128, &[0x81, 0x00]; "smallest two bytes")]
    #[test_case(300, &[0x82, 0x2C]; "three hundred")]
    #[test_case(16383, &[0xFF, 0x7F]; "largest two bytes")]
    #[test_case(16384, &[0x81, 0x80, 0x00]; "smallest three bytes")]
    #[test_case(2097151, &[0xFF, 0xFF, 0x7F]; "largest three bytes")]
    fn test_multibyte_encoding(value: u32, expected: &[u8]) {
        let mut buf = Vec::new();
        write(value, &mut buf);
        assert_eq!(buf, expected);
        assert_eq!(buf.len(), size(value));

        let mut read_buf = &buf[..];
        assert_eq!(read(&mut read_buf).unwrap(), value);
        assert_eq!(read_buf.len(), 0);
    }

    #[test]
    fn test_multibyte_max() {
        let mut buf = Vec::new();
        write(u32::MAX, &mut buf);
        assert_eq!(buf, [0x8F, 0xFF, 0xFF, 0xFF, 0x7F]);
        assert_eq!(size(u32::MAX), MAX_LEN);
        assert_eq!(read(&mut &buf[..]).unwrap(), u32::MAX);
    }

    #[test]
    fn test_multibyte_leading_zero_groups() {
        let mut buf = Bytes::from_static(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x82, 0x2C]);
        assert_eq!(read(&mut buf).unwrap(), 300);
    }

    #[test]
    fn test_multibyte_stops_at_first_final_group() {
        let mut buf = Bytes::from_static(&[0x05, 0x06]);
        assert_eq!(read(&mut buf).unwrap(), 5);
        assert_eq!(buf.remaining(), 1);
    }

    #[test]
    fn test_multibyte_insufficient_buffer() {
        let mut buf = Bytes::from_static(&[0x81, 0x80]);
        assert!(matches!(read(&mut buf), Err(Error::EndOfBuffer)));
    }

    #[test]
    fn test_multibyte_overflow() {
        let mut buf = Bytes::from_static(&[0x90, 0x80, 0x80, 0x80, 0x00]);
        assert!(matches!(read(&mut buf), Err(Error::InvalidVarint)));
    }
}
