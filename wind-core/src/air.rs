//! ICAO standard atmosphere (troposphere + lower stratosphere) and
//! compressible-flow airspeed conversions.
//!
//! Altitudes in metres, speeds in m/s throughout.

/// Specific gas constant for air, J/(kg K).
const R: f64 = 287.05287;

/// Ratio of specific heats for air.
const GAMMA: f64 = 1.4;

/// Sea-level density, kg/m3.
const RHO0: f64 = 1.225;

/// Sea-level pressure, Pa.
const P0: f64 = 101325.0;

/// Metres per second per knot.
pub const MS_PER_KT: f64 = 0.514444;

/// Metres per foot.
pub const M_PER_FT: f64 = 0.3048;

/// Standard atmosphere at geopotential altitude `h` metres.
///
/// Temperature lapses at 6.5 K/km down to the 216.65 K tropopause floor;
/// above 11 km density decays exponentially. Returns (pressure Pa,
/// density kg/m3, temperature K).
pub fn atmos(h: f64) -> (f64, f64, f64) {
    let t = (288.15 - 0.0065 * h).max(216.65);
    let rho_trop = 1.225 * (t / 288.15).powf(4.256848030018761);
    let dh_strat = (h - 11000.0).max(0.0);
    let rho = rho_trop * (-dh_strat / 6341.552161).exp();
    let p = rho * R * t;
    (p, rho, t)
}

/// Speed of sound at altitude `h` metres, m/s.
pub fn vsound(h: f64) -> f64 {
    let (_, _, t) = atmos(h);
    (GAMMA * R * t).sqrt()
}

/// True airspeed to Mach number.
pub fn tas2mach(v_tas: f64, h: f64) -> f64 {
    v_tas / vsound(h)
}

/// Mach number to true airspeed.
pub fn mach2tas(mach: f64, h: f64) -> f64 {
    mach * vsound(h)
}

/// Equivalent airspeed to true airspeed.
pub fn eas2tas(v_eas: f64, h: f64) -> f64 {
    let (_, rho, _) = atmos(h);
    v_eas * (RHO0 / rho).sqrt()
}

/// True airspeed to equivalent airspeed.
pub fn tas2eas(v_tas: f64, h: f64) -> f64 {
    let (_, rho, _) = atmos(h);
    v_tas * (rho / RHO0).sqrt()
}

/// Calibrated airspeed to true airspeed, compressible flow.
pub fn cas2tas(v_cas: f64, h: f64) -> f64 {
    let (p, rho, _) = atmos(h);
    let qdyn = P0 * ((1.0 + RHO0 * v_cas * v_cas / (7.0 * P0)).powf(3.5) - 1.0);
    (7.0 * p / rho * ((1.0 + qdyn / p).powf(2.0 / 7.0) - 1.0)).sqrt()
}

/// True airspeed to calibrated airspeed, compressible flow.
pub fn tas2cas(v_tas: f64, h: f64) -> f64 {
    let (p, rho, _) = atmos(h);
    let qdyn = p * ((1.0 + rho * v_tas * v_tas / (7.0 * p)).powf(3.5) - 1.0);
    (7.0 * P0 / RHO0 * ((qdyn / P0 + 1.0).powf(2.0 / 7.0) - 1.0)).sqrt()
}

/// Mach number to calibrated airspeed.
pub fn mach2cas(mach: f64, h: f64) -> f64 {
    tas2cas(mach2tas(mach, h), h)
}

/// Calibrated airspeed to Mach number.
pub fn cas2mach(v_cas: f64, h: f64) -> f64 {
    tas2mach(cas2tas(v_cas, h), h)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
