//! Altitude decoding: 13-bit surveillance altitude code and ADS-B variants.
//!
//! Returns nullable feet; an all-zero field means "altitude unknown", never
//! an error. The 13-bit code interleaves three flag/data layouts selected by
//! the M (metric) and Q (25-ft resolution) bits.

use crate::bits::{bits_u32, gray_to_binary};
use crate::crc::{downlink_format, typecode};
use crate::types::RawMessage;

/// Metres to feet.
const FT_PER_M: f64 = 3.28084;

/// Altitude from an ADS-B airborne position message (DF17/18, TC 9-22).
///
/// TC 9-18: the 12-bit field is the legacy 13-bit code with the M bit
/// removed; reinsert a 0 and decode. TC 20-22: the 12 bits are raw metres.
/// Other type codes carry no altitude.
pub fn adsb_altitude(msg: &RawMessage) -> Option<f64> {
    let tc = typecode(msg)?;
    if tc < 9 || tc == 19 || tc > 22 {
        return None;
    }

    // ME bits 9-20: message bits 41-52
    let alt12 = bits_u32(msg.bytes(), 40, 12);

    if tc < 19 {
        let code13 = (((alt12 >> 6) << 7) | (alt12 & 0x3F)) as u16;
        altitude13(code13)
    } else {
        Some(alt12 as f64 * FT_PER_M)
    }
}

/// Altitude from a surveillance reply (DF0/4/16/20), 13-bit code at message
/// bits 20-32.
pub fn surveillance_altitude(msg: &RawMessage) -> Option<f64> {
    if !matches!(downlink_format(msg), 0 | 4 | 16 | 20) {
        return None;
    }
    altitude13(bits_u32(msg.bytes(), 19, 13) as u16)
}

/// Decode the legacy 13-bit altitude code.
///
/// Bit layout (MSB first): C1 A1 C2 A2 C4 A4 M B1 Q B2 D2 B4 D4.
/// - all-zero: unknown
/// - M=0, Q=1: 25-ft increments, 11-bit value after dropping the Q bit
/// - M=0, Q=0: 100-ft Gray-coded steps
/// - M=1: 12-bit value in metres
pub fn altitude13(code: u16) -> Option<f64> {
    debug_assert!(code < 1 << 13);

    if code == 0 {
        return None;
    }

    let m_bit = (code >> 6) & 1;

    if m_bit == 1 {
        // Metres: 12 bits after dropping M, truncated to whole feet
        let n = (((code >> 7) & 0x3F) << 6) | (code & 0x3F);
        return Some((n as f64 * FT_PER_M).trunc());
    }

    let q_bit = (code >> 4) & 1;

    if q_bit == 1 {
        // 25-ft mode: 11 bits after dropping M and Q
        let n = (((code >> 7) & 0x3F) << 5) | (((code >> 5) & 1) << 4) | (code & 0xF);
        Some(n as f64 * 25.0 - 1000.0)
    } else {
        // Gray-coded 100-ft mode. Reassemble the Gray field as
        // D2 D4 A1 A2 A4 B1 B2 B4 C1 C2 C4 from the interleaved positions.
        let p = |i: usize| (code >> (12 - i)) & 1;
        let gray = (p(10) << 10)
            | (p(12) << 9)
            | (p(1) << 8)
            | (p(3) << 7)
            | (p(5) << 6)
            | (p(7) << 5)
            | (p(9) << 4)
            | (p(11) << 3)
            | (p(0) << 2)
            | (p(2) << 1)
            | p(4);
        gray_to_alt(gray).map(|a| a as f64)
    }
}

/// Decode an 11-bit Gray altitude field: 8-bit 500-ft group followed by a
/// 3-bit 100-ft group.
///
/// Domain rules: a 100-ft group of 0, 5 or 6 is undefined; 7 remaps to 5;
/// when the 500-ft group is odd the 100-ft group counts downward (mirrored
/// as 6 - value).
pub fn gray_to_alt(gray: u16) -> Option<i32> {
    debug_assert!(gray < 1 << 11);

    let n500 = gray_to_binary((gray >> 3) as u32) as i32;
    let mut n100 = gray_to_binary((gray & 0x7) as u32) as i32;

    if n100 == 0 || n100 == 5 || n100 == 6 {
        return None;
    }
    if n100 == 7 {
        n100 = 5;
    }
    if n500 % 2 == 1 {
        n100 = 6 - n100;
    }

    Some(n500 * 500 + n100 * 100 - 1300)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
