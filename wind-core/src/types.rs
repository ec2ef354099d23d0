//! Shared types, error enum, and output record types for wind-core.

use serde::Serialize;
use thiserror::Error;

use crate::bits::hex_to_bytes;

/// All errors produced by wind-core.
///
/// Every variant is scoped to a single message (or a single per-aircraft
/// batch); callers skip the offending input and continue. Unknown field
/// values are never errors — they come back as `None`.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    #[error("invalid frame length: expected {expected} hex digits, got {actual}")]
    FrameLength { expected: usize, actual: usize },
    #[error("both even and odd CPR frames are required")]
    CprParity,
    #[error("message is not an airborne position report")]
    NotAirbornePosition,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

// ---------------------------------------------------------------------------
// Raw message
// ---------------------------------------------------------------------------

/// Number of hex digits in a long Mode S frame (112 bits).
pub const FRAME_HEX_LEN: usize = 28;

/// An immutable 112-bit Mode S message.
///
/// Only long (112-bit) frames carry the registers needed for wind retrieval,
/// so anything else is rejected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMessage {
    bytes: [u8; 14],
}

impl RawMessage {
    /// Parse a 28-hex-digit string into a message.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        if hex.len() != FRAME_HEX_LEN {
            return Err(DecodeError::FrameLength {
                expected: FRAME_HEX_LEN,
                actual: hex.len(),
            });
        }
        let decoded = hex_to_bytes(hex)?;
        let mut bytes = [0u8; 14];
        bytes.copy_from_slice(&decoded);
        Ok(RawMessage { bytes })
    }

    /// Build a message directly from its 14 bytes.
    pub fn from_bytes(bytes: [u8; 14]) -> Self {
        RawMessage { bytes }
    }

    /// Full message bytes.
    pub fn bytes(&self) -> &[u8; 14] {
        &self.bytes
    }

    /// Comm-B / ME data field, bytes 4-10 (message bits 33-88).
    pub fn data(&self) -> &[u8] {
        &self.bytes[4..11]
    }

    /// True if the 56-bit data field is all zero.
    pub fn data_all_zero(&self) -> bool {
        self.data().iter().all(|&b| b == 0)
    }
}

impl std::fmt::Display for RawMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in &self.bytes {
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ICAO address helpers
// ---------------------------------------------------------------------------

/// 24-bit ICAO transponder address.
pub type Icao = u32;

/// Format an ICAO address as 6-char uppercase hex.
pub fn icao_to_string(icao: Icao) -> String {
    format!("{icao:06X}")
}

// ---------------------------------------------------------------------------
// Decoded entities
// ---------------------------------------------------------------------------

/// CPR frame parity, message bit 54.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Parity {
    Even,
    Odd,
}

/// One position-qualifying message in a per-aircraft batch.
#[derive(Debug, Clone, Copy)]
pub struct CprMessage {
    /// Unix time in seconds.
    pub time: f64,
    pub frame: RawMessage,
}

/// An unambiguous position fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedPosition {
    pub time: f64,
    pub icao: Icao,
    pub lat: f64,
    pub lon: f64,
    /// Feet. `None` when the source frame's altitude field was unknown.
    pub alt: Option<f64>,
}

/// Fields extracted from a BDS 5,0 (track and turn) register.
///
/// Each field is gated by its own status bit; `None` means not transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Bds50Fields {
    /// Roll angle in degrees, negative to the left.
    pub roll: Option<f64>,
    /// True track angle in degrees [0, 360).
    pub track: Option<f64>,
    /// Ground speed in knots.
    pub ground_speed: Option<f64>,
    /// True airspeed in knots.
    pub true_airspeed: Option<f64>,
}

/// Fields extracted from a BDS 6,0 (heading and speed) register.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Bds60Fields {
    /// Magnetic heading in degrees [0, 360).
    pub heading: Option<f64>,
    /// Indicated airspeed in knots.
    pub indicated_airspeed: Option<f64>,
    /// Mach number.
    pub mach: Option<f64>,
    /// Barometric vertical rate in ft/min.
    pub vertical_rate_baro: Option<i32>,
    /// Inertial (IRS/AHRS) vertical rate in ft/min.
    pub vertical_rate_inertial: Option<i32>,
}

/// Classified Comm-B register content.
///
/// Classification is mutually exclusive: a payload that passes both the
/// BDS 5,0 and BDS 6,0 validity tests, or neither, is `Unclassified` and
/// unusable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommBRegister {
    Bds50(Bds50Fields),
    Bds60(Bds60Fields),
    Unclassified,
}

/// Horizontal wind derived from one BDS50 + BDS60 pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindVector {
    /// Eastward component, knots.
    pub u: f64,
    /// Northward component, knots.
    pub v: f64,
    /// Magnitude, knots.
    pub speed: f64,
    /// Meteorological "from" direction, degrees.
    pub direction: f64,
}

// ---------------------------------------------------------------------------
// Flat staging records (merge keys: time bucket + ICAO)
// ---------------------------------------------------------------------------

/// Position staging record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionRecord {
    /// Time bucket, unix milliseconds.
    pub time_ms: u64,
    pub icao: Icao,
    pub lat: f64,
    pub lon: f64,
    /// Mean of the pair's altitudes (or the frame's own, for reference
    /// decodes), feet.
    pub alt: Option<f64>,
}

/// BDS 5,0 staging record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bds50Record {
    pub time_ms: u64,
    pub icao: Icao,
    /// 13-bit surveillance altitude of the carrying message, feet.
    pub alt: Option<f64>,
    pub fields: Bds50Fields,
}

/// BDS 6,0 staging record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bds60Record {
    pub time_ms: u64,
    pub icao: Icao,
    pub alt: Option<f64>,
    pub fields: Bds60Fields,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
