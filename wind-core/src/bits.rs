//! Bit-field extraction primitives.
//!
//! All message fields are fixed-offset bit ranges over the 14-byte frame,
//! indexed MSB-first from bit 0. Gray-coded altitude groups decode through
//! the cascading-XOR transform.

use crate::types::{DecodeError, Result};

/// Decode a hex string into bytes. Case-insensitive, must be even length.
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return Err(DecodeError::InvalidHex(hex.to_string()));
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for chunk in hex.as_bytes().chunks(2) {
        let high = hex_digit(chunk[0]).ok_or_else(|| DecodeError::InvalidHex(hex.to_string()))?;
        let low = hex_digit(chunk[1]).ok_or_else(|| DecodeError::InvalidHex(hex.to_string()))?;
        bytes.push((high << 4) | low);
    }
    Ok(bytes)
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Single bit at `idx`, MSB-first over the buffer.
pub fn bit(data: &[u8], idx: usize) -> u8 {
    (data[idx / 8] >> (7 - (idx % 8))) & 1
}

/// Unsigned integer from `len` bits starting at `start`, MSB-first.
///
/// `len` must be at most 32.
pub fn bits_u32(data: &[u8], start: usize, len: usize) -> u32 {
    debug_assert!(len <= 32);
    let mut val = 0u32;
    for i in start..start + len {
        val = (val << 1) | bit(data, i) as u32;
    }
    val
}

/// Gray code to binary: cascading XOR with right-shifts of 8, 4, 2, 1.
pub fn gray_to_binary(gray: u32) -> u32 {
    let mut num = gray;
    num ^= num >> 8;
    num ^= num >> 4;
    num ^= num >> 2;
    num ^= num >> 1;
    num
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_bytes() {
        assert_eq!(hex_to_bytes("4840D6").unwrap(), vec![0x48, 0x40, 0xD6]);
        assert_eq!(hex_to_bytes("4840d6").unwrap(), vec![0x48, 0x40, 0xD6]);
    }

    #[test]
    fn test_hex_to_bytes_odd_length() {
        assert!(hex_to_bytes("484").is_err());
    }

    #[test]
    fn test_hex_to_bytes_invalid_char() {
        assert!(hex_to_bytes("4G").is_err());
    }

    #[test]
    fn test_bit() {
        let data = [0b1000_0001u8, 0b0100_0000];
        assert_eq!(bit(&data, 0), 1);
        assert_eq!(bit(&data, 1), 0);
        assert_eq!(bit(&data, 7), 1);
        assert_eq!(bit(&data, 9), 1);
    }

    #[test]
    fn test_bits_u32() {
        let data = [0x8D, 0x48, 0x40, 0xD6];
        // DF field: first 5 bits of 0x8D = 0b10001 = 17
        assert_eq!(bits_u32(&data, 0, 5), 17);
        // Whole bytes across boundaries
        assert_eq!(bits_u32(&data, 8, 24), 0x4840D6);
        // Zero-width reads as zero-padded
        assert_eq!(bits_u32(&data, 4, 8), 0xD4);
    }

    #[test]
    fn test_gray_to_binary() {
        // Gray sequence for 0..8: 000 001 011 010 110 111 101 100
        let gray = [0b000, 0b001, 0b011, 0b010, 0b110, 0b111, 0b101, 0b100];
        for (i, &g) in gray.iter().enumerate() {
            assert_eq!(gray_to_binary(g), i as u32, "gray {g:03b}");
        }
    }

    #[test]
    fn test_gray_to_binary_wide() {
        // 11-bit value exercising the 8-shift stage: gray 11000000000 -> 1024
        assert_eq!(gray_to_binary(0b110_0000_0000), 1024);
        // Identity at zero
        assert_eq!(gray_to_binary(0), 0);
    }
}
