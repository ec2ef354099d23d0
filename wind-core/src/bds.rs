//! Comm-B register inference and field extraction for BDS 5,0 (track and
//! turn) and BDS 6,0 (heading and speed).
//!
//! DF20/21 replies do not say which register they carry; the payload is
//! classified by checking each candidate's status-bit consistency and field
//! plausibility bounds. A payload that matches both candidates, or neither,
//! is unusable and classified as such.
//!
//! Bit positions below are 0-based offsets into the 56-bit MB field
//! (message bits 33-88).

use crate::air::{mach2cas, MS_PER_KT, M_PER_FT};
use crate::altitude::surveillance_altitude;
use crate::bits::{bit, bits_u32};
use crate::crc::downlink_format;
use crate::types::{Bds50Fields, Bds60Fields, CommBRegister, RawMessage};

/// IAS plausibility ceiling, knots.
const MAX_IAS: f64 = 500.0;

/// Ground speed plausibility ceiling, knots.
const MAX_GS: f64 = 600.0;

/// TAS plausibility ceiling, knots.
const MAX_TAS: f64 = 500.0;

/// Vertical rate plausibility ceiling, ft/min.
const MAX_VR: i32 = 6000;

/// Single MB-field bit.
fn mb_bit(msg: &RawMessage, idx: usize) -> u8 {
    bit(msg.data(), idx)
}

/// Unsigned MB-field range [start, start+len).
fn mb_bits(msg: &RawMessage, start: usize, len: usize) -> u32 {
    bits_u32(msg.data(), start, len)
}

/// A status bit of 0 with non-zero field content is inconsistent.
///
/// `sb`, `msb`, `lsb` are 1-based MB bit numbers, `lsb` inclusive.
fn wrong_status(msg: &RawMessage, sb: usize, msb: usize, lsb: usize) -> bool {
    mb_bit(msg, sb - 1) == 0 && mb_bits(msg, msb - 1, lsb - msb + 1) != 0
}

fn round1(val: f64) -> f64 {
    (val * 10.0).round() / 10.0
}

fn round3(val: f64) -> f64 {
    (val * 1000.0).round() / 1000.0
}

/// Signed angle from a sign bit and magnitude bits, scaled and wrapped to
/// [0, 360).
fn angle(sign: u8, value: u32, full_scale: i32) -> f64 {
    let v = if sign == 1 {
        value as i32 - full_scale
    } else {
        value as i32
    };
    let deg = v as f64 * 90.0 / 512.0;
    if deg < 0.0 {
        deg + 360.0
    } else {
        deg
    }
}

// ---------------------------------------------------------------------------
// BDS 5,0 fields
// ---------------------------------------------------------------------------

/// Roll angle, degrees, negative left wing down. MB bits 1-11.
pub fn roll50(msg: &RawMessage) -> Option<f64> {
    if mb_bit(msg, 0) == 0 {
        return None;
    }
    let sign = mb_bit(msg, 1);
    let value = mb_bits(msg, 2, 9);
    let v = if sign == 1 {
        value as i32 - 512
    } else {
        value as i32
    };
    Some(round1(v as f64 * 45.0 / 256.0))
}

/// True track angle, degrees [0, 360). MB bits 12-23.
pub fn trk50(msg: &RawMessage) -> Option<f64> {
    if mb_bit(msg, 11) == 0 {
        return None;
    }
    Some(round3(angle(mb_bit(msg, 12), mb_bits(msg, 13, 10), 1024)))
}

/// Ground speed, knots (2-kt steps). MB bits 24-34.
pub fn gs50(msg: &RawMessage) -> Option<f64> {
    if mb_bit(msg, 23) == 0 {
        return None;
    }
    Some(mb_bits(msg, 24, 10) as f64 * 2.0)
}

/// True airspeed, knots (2-kt steps). MB bits 46-56.
pub fn tas50(msg: &RawMessage) -> Option<f64> {
    if mb_bit(msg, 45) == 0 {
        return None;
    }
    Some(mb_bits(msg, 46, 10) as f64 * 2.0)
}

/// True if the payload is a plausible BDS 5,0 register.
fn is50(msg: &RawMessage) -> bool {
    if msg.data_all_zero() {
        return false;
    }
    for &(sb, msb, lsb) in &[
        (1, 3, 11),
        (12, 13, 23),
        (24, 25, 34),
        (35, 36, 45),
        (46, 47, 56),
    ] {
        if wrong_status(msg, sb, msb, lsb) {
            return false;
        }
    }

    let roll = roll50(msg);
    let gs = gs50(msg);
    let tas = tas50(msg);

    if roll.is_some_and(|r| r.abs() > 50.0) {
        return false;
    }
    if gs.is_some_and(|v| v > MAX_GS) {
        return false;
    }
    if tas.is_some_and(|v| v > MAX_TAS) {
        return false;
    }
    if let (Some(gs), Some(tas)) = (gs, tas) {
        if (tas - gs).abs() > 200.0 {
            return false;
        }
    }
    true
}

/// Extract all BDS 5,0 fields.
pub fn bds50_fields(msg: &RawMessage) -> Bds50Fields {
    Bds50Fields {
        roll: roll50(msg),
        track: trk50(msg),
        ground_speed: gs50(msg),
        true_airspeed: tas50(msg),
    }
}

// ---------------------------------------------------------------------------
// BDS 6,0 fields
// ---------------------------------------------------------------------------

/// Magnetic heading, degrees [0, 360). MB bits 1-12.
pub fn hdg60(msg: &RawMessage) -> Option<f64> {
    if mb_bit(msg, 0) == 0 {
        return None;
    }
    Some(round3(angle(mb_bit(msg, 1), mb_bits(msg, 2, 10), 1024)))
}

/// Indicated airspeed, knots. MB bits 13-23.
pub fn ias60(msg: &RawMessage) -> Option<f64> {
    if mb_bit(msg, 12) == 0 {
        return None;
    }
    Some(mb_bits(msg, 13, 10) as f64)
}

/// Mach number (1/512 steps of 2.048). MB bits 24-34.
pub fn mach60(msg: &RawMessage) -> Option<f64> {
    if mb_bit(msg, 23) == 0 {
        return None;
    }
    Some(round3(mb_bits(msg, 24, 10) as f64 * 2.048 / 512.0))
}

/// Two's-complement vertical rate field; all-zero or all-one magnitude
/// reads as 0 ft/min.
fn vr60(msg: &RawMessage, status: usize, sign: usize, lo: usize) -> Option<i32> {
    if mb_bit(msg, status) == 0 {
        return None;
    }
    let value = mb_bits(msg, lo, 9) as i32;
    if value == 0 || value == 511 {
        return Some(0);
    }
    let v = if mb_bit(msg, sign) == 1 {
        value - 512
    } else {
        value
    };
    Some(v * 32)
}

/// Barometric vertical rate, ft/min. MB bits 35-45. Noisy in practice.
pub fn vr60baro(msg: &RawMessage) -> Option<i32> {
    vr60(msg, 34, 35, 36)
}

/// Inertial (IRS/AHRS) vertical rate, ft/min. MB bits 46-56.
pub fn vr60ins(msg: &RawMessage) -> Option<i32> {
    vr60(msg, 45, 46, 47)
}

/// True if the payload is a plausible BDS 6,0 register.
///
/// Beyond bounds checks, a DF20 reply with both IAS and Mach present is
/// cross-checked against its own altitude: the CAS implied by the Mach must
/// agree with the reported IAS within 20 kt.
fn is60(msg: &RawMessage) -> bool {
    if msg.data_all_zero() {
        return false;
    }
    for &(sb, msb, lsb) in &[
        (1, 2, 12),
        (13, 14, 23),
        (24, 25, 34),
        (35, 36, 45),
        (46, 47, 56),
    ] {
        if wrong_status(msg, sb, msb, lsb) {
            return false;
        }
    }

    let ias = ias60(msg);
    let mach = mach60(msg);

    if ias.is_some_and(|v| v > MAX_IAS) {
        return false;
    }
    if mach.is_some_and(|v| v > 1.0) {
        return false;
    }
    if vr60baro(msg).is_some_and(|v| v.abs() > MAX_VR) {
        return false;
    }
    if vr60ins(msg).is_some_and(|v| v.abs() > MAX_VR) {
        return false;
    }

    if let (Some(ias), Some(mach)) = (ias, mach) {
        if downlink_format(msg) == 20 {
            if let Some(alt) = surveillance_altitude(msg) {
                let implied_ias = mach2cas(mach, alt * M_PER_FT) / MS_PER_KT;
                if (ias - implied_ias).abs() > 20.0 {
                    return false;
                }
            }
        }
    }
    true
}

/// Extract all BDS 6,0 fields.
pub fn bds60_fields(msg: &RawMessage) -> Bds60Fields {
    Bds60Fields {
        heading: hdg60(msg),
        indicated_airspeed: ias60(msg),
        mach: mach60(msg),
        vertical_rate_baro: vr60baro(msg),
        vertical_rate_inertial: vr60ins(msg),
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify a Comm-B payload as exactly one of the supported registers.
pub fn classify(msg: &RawMessage) -> CommBRegister {
    match (is50(msg), is60(msg)) {
        (true, false) => CommBRegister::Bds50(bds50_fields(msg)),
        (false, true) => CommBRegister::Bds60(bds60_fields(msg)),
        _ => CommBRegister::Unclassified,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const BDS50_MSG: &str = "A000139381951536E024D4CCF6B5";
    const BDS60_MSG: &str = "A00004128F39F91A7E27C46ADC21";

    fn parse(hex: &str) -> RawMessage {
        RawMessage::from_hex(hex).unwrap()
    }

    #[test]
    fn test_bds50_fields() {
        let msg = parse(BDS50_MSG);
        assert_eq!(roll50(&msg), Some(2.1));
        assert_eq!(trk50(&msg), Some(114.258));
        assert_eq!(gs50(&msg), Some(438.0));
        assert_eq!(tas50(&msg), Some(424.0));
    }

    #[test]
    fn test_bds60_fields() {
        let msg = parse(BDS60_MSG);
        assert_eq!(hdg60(&msg), Some(42.715));
        assert_eq!(ias60(&msg), Some(252.0));
        assert_eq!(mach60(&msg), Some(0.42));
        assert_eq!(vr60baro(&msg), Some(-1920));
        assert_eq!(vr60ins(&msg), Some(-1920));
    }

    #[test]
    fn test_classification_exclusive() {
        assert!(matches!(
            classify(&parse(BDS50_MSG)),
            CommBRegister::Bds50(_)
        ));
        assert!(matches!(
            classify(&parse(BDS60_MSG)),
            CommBRegister::Bds60(_)
        ));
    }

    #[test]
    fn test_classification_all_zero_payload() {
        assert_eq!(
            classify(&parse("A00000000000000000000000C123")),
            CommBRegister::Unclassified
        );
    }

    #[test]
    fn test_wrong_status_rejects() {
        // BDS50 payload with the roll status bit cleared but field content
        // kept: MB byte 0x81 -> 0x01 clears bit 1 while bits 3-11 stay set.
        let msg = parse("A000139301951536E024D4CCF6B5");
        assert!(!is50(&msg));
    }

    #[test]
    fn test_vr_all_ones_reads_zero() {
        // vr magnitude 511 with status set decodes as 0, not -32 or 16352
        let msg = parse(BDS60_MSG);
        let mut bytes = *msg.bytes();
        // force the baro vr magnitude (MB bits 37-45, message bits 68-76)
        // to all ones with the status bit set
        bytes[8] |= 0x2F;
        bytes[9] |= 0xF8;
        let forged = RawMessage::from_bytes(bytes);
        assert_eq!(vr60baro(&forged), Some(0));

        // all-zero magnitude with the status and sign bits set also reads 0
        let mut bytes = *msg.bytes();
        bytes[8] &= 0xF0;
        bytes[9] &= 0x07;
        let forged = RawMessage::from_bytes(bytes);
        assert_eq!(vr60baro(&forged), Some(0));
    }

    #[test]
    fn test_field_status_gating() {
        // All-zero MB: every status bit clear, every field None
        let msg = parse("A00000000000000000000000C123");
        assert_eq!(roll50(&msg), None);
        assert_eq!(trk50(&msg), None);
        assert_eq!(gs50(&msg), None);
        assert_eq!(tas50(&msg), None);
        assert_eq!(hdg60(&msg), None);
        assert_eq!(ias60(&msg), None);
        assert_eq!(mach60(&msg), None);
        assert_eq!(vr60baro(&msg), None);
        assert_eq!(vr60ins(&msg), None);
    }
}
