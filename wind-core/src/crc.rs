//! CRC-24 and message identity: Downlink Format, ICAO address, Type Code.
//!
//! ICAO standard polynomial, generator bytes `FF FA 04 80`. The checksum is
//! computed as a byte-by-byte cascade that XOR-folds the generator into a
//! 3-byte running remainder; a valid DF17/18 frame leaves remainder 0.
//!
//! For DF0/4/5/16/20/21 the trailing 24 bits are the checksum XOR'd with the
//! transmitter's ICAO address, so the address is recovered by re-encoding the
//! payload and XORing with the parity field as received.

use crate::bits::bits_u32;
use crate::types::{Icao, RawMessage};

/// The fixed 4-byte CRC generator.
const GENERATOR: [u8; 4] = [0xFF, 0xFA, 0x04, 0x80];

/// Checksum mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrcMode {
    /// Use the message as received. Remainder 0 means a clean frame.
    Check,
    /// Zero the 24-bit parity field first and return the checksum that
    /// belongs in it.
    Encode,
}

/// Mode S CRC-24.
///
/// Runs the generator over all but the last 3 bytes, folding into the three
/// trailing bytes as a running remainder; the result is those 3 bytes after
/// the cascade.
pub fn crc24(msg: &RawMessage, mode: CrcMode) -> u32 {
    let mut bytes = *msg.bytes();
    if mode == CrcMode::Encode {
        bytes[11] = 0;
        bytes[12] = 0;
        bytes[13] = 0;
    }

    for ibyte in 0..bytes.len() - 3 {
        for ibit in 0..8 {
            let mask = 0x80 >> ibit;
            if bytes[ibyte] & mask != 0 {
                bytes[ibyte] ^= GENERATOR[0] >> ibit;
                bytes[ibyte + 1] ^= fold(GENERATOR[0], GENERATOR[1], ibit);
                bytes[ibyte + 2] ^= fold(GENERATOR[1], GENERATOR[2], ibit);
                bytes[ibyte + 3] ^= fold(GENERATOR[2], GENERATOR[3], ibit);
            }
        }
    }

    (bytes[11] as u32) << 16 | (bytes[12] as u32) << 8 | bytes[13] as u32
}

/// Generator bytes realigned to bit offset `ibit` across a byte boundary.
fn fold(hi: u8, lo: u8, ibit: usize) -> u8 {
    ((((hi as u16) << (8 - ibit)) | ((lo as u16) >> ibit)) & 0xFF) as u8
}

/// Downlink Format: first 5 bits, clamped to 24.
///
/// The clamp mirrors the reference decoder and is preserved as observed.
pub fn downlink_format(msg: &RawMessage) -> u8 {
    (bits_u32(msg.bytes(), 0, 5) as u8).min(24)
}

/// ICAO address of the transmitting aircraft.
///
/// DF11/17/18 carry it verbatim in bits 9-32. DF0/4/5/16/20/21 hide it in
/// the parity field; it is recovered via encode-mode CRC. Other formats
/// carry no address.
pub fn icao_address(msg: &RawMessage) -> Option<Icao> {
    match downlink_format(msg) {
        11 | 17 | 18 => Some(bits_u32(msg.bytes(), 8, 24)),
        0 | 4 | 5 | 16 | 20 | 21 => {
            let c0 = crc24(msg, CrcMode::Encode);
            let c1 = bits_u32(msg.bytes(), 88, 24);
            Some(c0 ^ c1)
        }
        _ => None,
    }
}

/// ADS-B Type Code: top 5 bits of the ME field. Defined only for DF17/18.
pub fn typecode(msg: &RawMessage) -> Option<u8> {
    match downlink_format(msg) {
        17 | 18 => Some(bits_u32(msg.bytes(), 32, 5) as u8),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
