//! Unsigned LEB128 variable-length integers.
//!
//! Every attribute tag, string-table index and raw length in the heap is an
//! unsigned LEB128 value: each byte contributes 7 bits of data, low bits
//! first, and the high bit says whether more bytes follow.
//!
//! Format:
//! - Bits 0-6: Data bits
//! - Bit 7: Continuation flag (1 = more bytes follow)
//!
//! Values are decoded into a `u64`. Redundant zero-padding bytes are
//! accepted; a value that needs more than 64 bits is rejected rather than
//! truncated.

use crate::error::{HpkError, Result};

/// Fold one byte into an accumulating value. Returns `None` on overflow.
#[inline]
fn accumulate(result: u64, byte: u8, shift: u32) -> Option<u64> {
    let payload = u64::from(byte & 0x7F);
    if payload == 0 {
        return Some(result);
    }
    if shift >= 64 || (shift == 63 && payload > 1) {
        return None;
    }
    Some(result | (payload << shift))
}

/// Read an unsigned LEB128 value from a byte slice.
/// Returns the value and the number of bytes consumed, or `None` if the
/// slice ends mid-value or the value overflows 64 bits.
#[inline]
pub fn read_unsigned_leb128(data: &[u8]) -> Option<(u64, usize)> {
    let mut result = 0u64;
    let mut shift = 0u32;

    for (i, &byte) in data.iter().enumerate() {
        result = accumulate(result, byte, shift)?;

        if byte & 0x80 == 0 {
            return Some((result, i + 1));
        }

        shift = shift.saturating_add(7);
    }

    // Ran out of bytes without finding end
    None
}

/// Decode an unsigned LEB128 value from a byte source, one byte at a time.
///
/// `offset` is the heap offset of the first byte and is only used for error
/// reporting.
pub fn decode_unsigned_leb128<F>(offset: u64, mut next_byte: F) -> Result<u64>
where
    F: FnMut() -> Result<u8>,
{
    let mut result = 0u64;
    let mut shift = 0u32;

    loop {
        let byte = next_byte()?;
        result = accumulate(result, byte, shift).ok_or(HpkError::Leb128Overflow { offset })?;

        if byte & 0x80 == 0 {
            return Ok(result);
        }

        shift = shift.saturating_add(7);
    }
}

/// Append the unsigned LEB128 encoding of `value` to `out`.
/// Returns the number of bytes written.
pub fn write_unsigned_leb128(mut value: u64, out: &mut Vec<u8>) -> usize {
    let start = out.len();
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            return out.len() - start;
        }
    }
}

/// Encode `value` into a fresh buffer.
pub fn encode_unsigned_leb128(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(10);
    write_unsigned_leb128(value, &mut out);
    out
}

/// Big-endian cursor over a fixed buffer, used by the header parsers.
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Read a fixed number of bytes.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(count)?;
        let slice = self.data.get(self.offset..end)?;
        self.offset = end;
        Some(slice)
    }

    #[inline]
    pub fn read_u16_be(&mut self) -> Option<u16> {
        let bytes = self.read_bytes(2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    #[inline]
    pub fn read_u32_be(&mut self) -> Option<u32> {
        let bytes = self.read_bytes(4)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    #[inline]
    pub fn read_u64_be(&mut self) -> Option<u64> {
        let bytes = self.read_bytes(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Some(u64::from_be_bytes(raw))
    }

    /// Skip ahead by a number of bytes.
    pub fn skip(&mut self, count: usize) -> bool {
        self.read_bytes(count).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_byte_leb128() {
        // Values 0-127 fit in one byte
        assert_eq!(read_unsigned_leb128(&[0x00]), Some((0, 1)));
        assert_eq!(read_unsigned_leb128(&[0x7F]), Some((127, 1)));
        assert_eq!(read_unsigned_leb128(&[0x01]), Some((1, 1)));
    }

    #[test]
    fn test_two_byte_leb128() {
        assert_eq!(read_unsigned_leb128(&[0x80, 0x01]), Some((128, 2)));
        assert_eq!(read_unsigned_leb128(&[0xFF, 0x01]), Some((255, 2)));
        // 624485 is the textbook example
        assert_eq!(read_unsigned_leb128(&[0xE5, 0x8E, 0x26]), Some((624_485, 3)));
    }

    #[test]
    fn test_u64_max() {
        let encoded = encode_unsigned_leb128(u64::MAX);
        assert_eq!(encoded.len(), 10);
        assert_eq!(encoded[9], 0x01);
        assert_eq!(read_unsigned_leb128(&encoded), Some((u64::MAX, 10)));
    }

    #[test]
    fn test_overflow_rejected() {
        // 2^64 needs a 0x02 in the tenth byte
        let mut too_big = vec![0x80; 9];
        too_big.push(0x02);
        assert_eq!(read_unsigned_leb128(&too_big), None);

        let mut bytes = too_big.iter().copied();
        let result = decode_unsigned_leb128(42, || {
            bytes.next().ok_or(HpkError::UnexpectedEnd { offset: 0 })
        });
        assert!(matches!(result, Err(HpkError::Leb128Overflow { offset: 42 })));
    }

    #[test]
    fn test_zero_padding_accepted() {
        // 1 encoded with redundant continuation bytes
        let padded = [0x81, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x00];
        assert_eq!(read_unsigned_leb128(&padded), Some((1, 11)));
    }

    #[test]
    fn test_write_reports_length() {
        let mut out = vec![0xAA];
        assert_eq!(write_unsigned_leb128(0, &mut out), 1);
        assert_eq!(write_unsigned_leb128(300, &mut out), 2);
        assert_eq!(out, vec![0xAA, 0x00, 0xAC, 0x02]);
    }

    #[test]
    fn test_byte_cursor() {
        let data = [0x00, 0x50, 0x00, 0x00, 0x00, 0x01, 0x05, 0x80, 0x01];
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.read_u16_be(), Some(0x50));
        assert_eq!(cursor.read_u32_be(), Some(1));
        assert!(cursor.skip(1));
        assert_eq!(cursor.read_bytes(2), Some(&data[7..]));
        assert_eq!(cursor.read_u16_be(), None);
        assert!(!cursor.skip(1));
    }

    #[test]
    fn test_consecutive_values() {
        let data = [0x05, 0x80, 0x01, 0x80];
        let (first, used) = read_unsigned_leb128(&data).unwrap();
        assert_eq!((first, used), (5, 1));
        let (second, more) = read_unsigned_leb128(&data[used..]).unwrap();
        assert_eq!((second, more), (128, 2));
        assert_eq!(read_unsigned_leb128(&data[used + more..]), None);
    }

    #[test]
    fn test_empty_and_incomplete() {
        assert_eq!(read_unsigned_leb128(&[]), None);
        // Continuation bit set but no more bytes
        assert_eq!(read_unsigned_leb128(&[0x80]), None);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_roundtrip_property(value in any::<u64>()) {
                let encoded = encode_unsigned_leb128(value);
                prop_assert_eq!(read_unsigned_leb128(&encoded), Some((value, encoded.len())));

                let mut bytes = encoded.iter().copied();
                let decoded = decode_unsigned_leb128(0, || {
                    bytes.next().ok_or(HpkError::UnexpectedEnd { offset: 0 })
                })?;
                prop_assert_eq!(decoded, value);
            }
        }
    }
}
