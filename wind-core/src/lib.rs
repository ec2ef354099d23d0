//! wind-core: Pure decode library for Mode S / ADS-B wind retrieval.
//!
//! No async, no I/O — just algorithms. Frames come in as 28-hex-digit
//! strings; out come position fixes (CPR), Comm-B track/speed and
//! heading/airspeed registers (BDS 5,0 / 6,0), and the wind vectors their
//! pairing implies. This crate is the shared core used by `wind-batch`.

pub mod air;
pub mod altitude;
pub mod bds;
pub mod bits;
pub mod cpr;
pub mod crc;
pub mod types;
pub mod wind;

// Re-export commonly used items at crate root
pub use bds::classify;
pub use cpr::{airborne_position, airborne_position_with_ref, resolve_batch};
pub use crc::{downlink_format, icao_address, typecode};
pub use types::*;
pub use wind::wind_vector;
