//! Compact Position Reporting: globally unambiguous decode from an
//! even/odd frame pair, single-frame decode against a nearby reference, and
//! the per-aircraft stream-pairing resolver.
//!
//! Key constants:
//! - NZ = 15 latitude zones per hemisphere
//! - 17 bits per CPR coordinate (2^17 = 131072)
//! - Dlat_even = 360 / 60 = 6.0 degrees
//! - Dlat_odd = 360 / 59 ≈ 6.1017 degrees

use crate::altitude::adsb_altitude;
use crate::bits::{bit, bits_u32};
use crate::crc::typecode;
use crate::types::{
    CprMessage, DecodeError, Icao, Parity, RawMessage, ResolvedPosition, Result,
};

/// CPR coordinate scale (2^17).
const CPR_MAX: f64 = 131072.0;

/// Even-frame latitude zone width, degrees.
const D_LAT_EVEN: f64 = 360.0 / 60.0;

/// Odd-frame latitude zone width, degrees.
const D_LAT_ODD: f64 = 360.0 / 59.0;

/// Maximum altitude disagreement for a pairing candidate, feet.
const PAIR_ALT_TOLERANCE: f64 = 50.0;

/// Number of longitude zones at a given latitude (the NL function).
///
/// 59 at the equator down to 1 beyond 87 degrees; elsewhere the largest
/// zone count satisfying the closed-form 15-zone relation. Matches the
/// published boundary table exactly.
pub fn nl(lat: f64) -> u32 {
    if lat.abs() < 1e-9 {
        return 59;
    }
    if (lat.abs() - 87.0).abs() < 1e-9 {
        return 2;
    }
    if lat.abs() > 87.0 {
        return 1;
    }

    let nz = 15.0;
    let a = 1.0 - (std::f64::consts::PI / (2.0 * nz)).cos();
    let b = (std::f64::consts::PI / 180.0 * lat.abs()).cos().powi(2);
    // The argument grazes -1 just below 87 degrees; clamp keeps acos defined
    // and yields the table's NL=2 band.
    let x = (1.0 - a / b).clamp(-1.0, 1.0);
    (2.0 * std::f64::consts::PI / x.acos()).floor() as u32
}

/// CPR odd/even flag, message bit 54. Defined for position type codes 5-18.
pub fn odd_even_flag(msg: &RawMessage) -> Option<Parity> {
    let tc = typecode(msg)?;
    if !(5..=18).contains(&tc) {
        return None;
    }
    match bit(msg.bytes(), 53) {
        0 => Some(Parity::Even),
        _ => Some(Parity::Odd),
    }
}

/// 17-bit CPR latitude fraction, message bits 55-71.
fn cpr_lat(msg: &RawMessage) -> f64 {
    bits_u32(msg.bytes(), 54, 17) as f64 / CPR_MAX
}

/// 17-bit CPR longitude fraction, message bits 72-88.
fn cpr_lon(msg: &RawMessage) -> f64 {
    bits_u32(msg.bytes(), 71, 17) as f64 / CPR_MAX
}

/// Global decode from an even/odd position message pair.
///
/// Frame order is free: the pair is canonicalized from the parity bits, and
/// a same-parity pair is an input error. `Ok(None)` means the two candidate
/// latitudes fall in different longitude-zone bands (a no-fix, expected
/// while crossing a zone boundary); position comes from the
/// later-timestamped frame.
pub fn airborne_position(
    msg0: &RawMessage,
    msg1: &RawMessage,
    t0: f64,
    t1: f64,
) -> Result<Option<(f64, f64)>> {
    let oe0 = bit(msg0.bytes(), 53);
    let oe1 = bit(msg1.bytes(), 53);

    let (even, odd, t_even, t_odd) = match (oe0, oe1) {
        (0, 1) => (msg0, msg1, t0, t1),
        (1, 0) => (msg1, msg0, t1, t0),
        _ => return Err(DecodeError::CprParity),
    };

    let cprlat_even = cpr_lat(even);
    let cprlon_even = cpr_lon(even);
    let cprlat_odd = cpr_lat(odd);
    let cprlon_odd = cpr_lon(odd);

    // latitude zone index
    let j = (59.0 * cprlat_even - 60.0 * cprlat_odd + 0.5).floor() as i64;

    let mut lat_even = D_LAT_EVEN * (j.rem_euclid(60) as f64 + cprlat_even);
    let mut lat_odd = D_LAT_ODD * (j.rem_euclid(59) as f64 + cprlat_odd);

    if lat_even >= 270.0 {
        lat_even -= 360.0;
    }
    if lat_odd >= 270.0 {
        lat_odd -= 360.0;
    }

    // both candidates must sit in the same longitude-zone band
    if nl(lat_even) != nl(lat_odd) {
        return Ok(None);
    }

    let (lat, lon) = if t_even > t_odd {
        let nl_val = nl(lat_even) as i64;
        let ni = nl_val.max(1);
        let m = (cprlon_even * (nl_val - 1) as f64 - cprlon_odd * nl_val as f64 + 0.5).floor()
            as i64;
        let lon = (360.0 / ni as f64) * (m.rem_euclid(ni) as f64 + cprlon_even);
        (lat_even, lon)
    } else {
        let nl_val = nl(lat_odd) as i64;
        let ni = (nl_val - 1).max(1);
        let m = (cprlon_even * (nl_val - 1) as f64 - cprlon_odd * nl_val as f64 + 0.5).floor()
            as i64;
        let lon = (360.0 / ni as f64) * (m.rem_euclid(ni) as f64 + cprlon_odd);
        (lat_odd, lon)
    };

    let lon = if lon > 180.0 { lon - 360.0 } else { lon };

    Ok(Some((round5(lat), round5(lon))))
}

/// Single-frame decode against a trusted nearby reference position.
///
/// The reference (a previous fix, ground station, airport) must be within
/// ~180 NM of the true position; that proximity is the caller's contract and
/// is not checked here.
pub fn airborne_position_with_ref(msg: &RawMessage, lat_ref: f64, lon_ref: f64) -> (f64, f64) {
    let cprlat = cpr_lat(msg);
    let cprlon = cpr_lon(msg);

    let i = bit(msg.bytes(), 53) as i64;
    let d_lat = if i == 1 { D_LAT_ODD } else { D_LAT_EVEN };

    let j = (lat_ref / d_lat).floor() + (0.5 + lat_ref.rem_euclid(d_lat) / d_lat - cprlat).floor();
    let lat = d_lat * (j + cprlat);

    let ni = nl(lat) as i64 - i;
    let d_lon = if ni > 0 { 360.0 / ni as f64 } else { 360.0 };

    let m = (lon_ref / d_lon).floor() + (0.5 + lon_ref.rem_euclid(d_lon) / d_lon - cprlon).floor();
    let lon = d_lon * (m + cprlon);

    (round5(lat), round5(lon))
}

/// Indices preceding each parity change in a batch.
///
/// Each returned index and its successor form a pairing candidate; a repeat
/// of the running parity (e.g. the second E of E,E) is not a boundary.
pub fn pair_boundaries(parities: &[Parity]) -> Vec<usize> {
    let mut boundaries = Vec::new();
    let Some(&first) = parities.first() else {
        return boundaries;
    };
    let mut run = first;
    for (j, &p) in parities.iter().enumerate() {
        if p != run {
            boundaries.push(j - 1);
            run = p;
        }
    }
    boundaries
}

/// Resolve every position in one time-ordered single-aircraft batch.
///
/// Pairing candidates (parity-change boundaries) are accepted when both
/// frames report altitudes within 50 ft of each other; an accepted pair that
/// yields a global fix is emitted and re-anchors the running reference
/// (position + mean altitude), while one that decodes to no fix invalidates
/// the reference. Every other message resolves against the current
/// reference when one exists, and is silently dropped otherwise. The
/// reference never outlives the batch.
pub fn resolve_batch(icao: Icao, msgs: &[CprMessage]) -> Result<Vec<ResolvedPosition>> {
    let parities: Vec<Parity> = msgs
        .iter()
        .map(|m| odd_even_flag(&m.frame).ok_or(DecodeError::NotAirbornePosition))
        .collect::<Result<_>>()?;

    let boundaries = pair_boundaries(&parities);
    let mut resolved = Vec::new();
    let mut reference: Option<(f64, f64)> = None;
    let mut pair_c = 0usize;

    for loc in 0..msgs.len() {
        if boundaries.get(pair_c) == Some(&loc) && loc + 1 < msgs.len() {
            let alt0 = adsb_altitude(&msgs[loc].frame);
            let alt1 = adsb_altitude(&msgs[loc + 1].frame);

            if let (Some(a0), Some(a1)) = (alt0, alt1) {
                if (a0 - a1).abs() < PAIR_ALT_TOLERANCE {
                    match airborne_position(
                        &msgs[loc].frame,
                        &msgs[loc + 1].frame,
                        msgs[loc].time,
                        msgs[loc + 1].time,
                    )? {
                        Some((lat, lon)) => {
                            resolved.push(ResolvedPosition {
                                time: msgs[loc + 1].time,
                                icao,
                                lat,
                                lon,
                                alt: Some((a0 + a1) / 2.0),
                            });
                            reference = Some((lat, lon));
                        }
                        // a zone-mismatch pair invalidates the reference
                        None => reference = None,
                    }
                }
            }

            if pair_c + 1 < boundaries.len() {
                pair_c += 1;
            }
        } else if let Some((ref_lat, ref_lon)) = reference {
            let (lat, lon) = airborne_position_with_ref(&msgs[loc].frame, ref_lat, ref_lon);
            resolved.push(ResolvedPosition {
                time: msgs[loc].time,
                icao,
                lat,
                lon,
                alt: adsb_altitude(&msgs[loc].frame),
            });
        }
    }

    Ok(resolved)
}

/// Round to 5 decimal places (~1.1 m).
fn round5(val: f64) -> f64 {
    (val * 100_000.0).round() / 100_000.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const EVEN: &str = "8D40621D58C382D690C8AC2863A7";
    const ODD: &str = "8D40621D58C386435CC412692AD6";

    // Synthetic TC11 frames whose candidate latitudes straddle the
    // 10.47047130 NL boundary (59 vs 58).
    const MISMATCH_EVEN: &str = "8D40621D580002FA1C9C40000000";
    const MISMATCH_ODD: &str = "8D40621D580006DEDC9C40000000";

    fn parse(hex: &str) -> RawMessage {
        RawMessage::from_hex(hex).unwrap()
    }

    #[test]
    fn test_nl_table() {
        // Published boundary table spot checks
        assert_eq!(nl(0.0), 59);
        assert_eq!(nl(10.47047130), 58);
        assert_eq!(nl(29.91135686), 51);
        assert_eq!(nl(52.0), 36);
        assert_eq!(nl(-52.0), 36);
        assert_eq!(nl(86.9), 2);
        assert_eq!(nl(87.0), 2);
        assert_eq!(nl(-87.0), 2);
        assert_eq!(nl(88.0), 1);
        assert_eq!(nl(-90.0), 1);
    }

    #[test]
    fn test_odd_even_flag() {
        assert_eq!(odd_even_flag(&parse(EVEN)), Some(Parity::Even));
        assert_eq!(odd_even_flag(&parse(ODD)), Some(Parity::Odd));
        // TC 4 identification has no CPR payload
        assert_eq!(odd_even_flag(&parse("8D4840D6202CC371C32CE0576098")), None);
    }

    #[test]
    fn test_global_decode_even_later() {
        let fix = airborne_position(&parse(EVEN), &parse(ODD), 1.0, 0.0)
            .unwrap()
            .unwrap();
        assert!((fix.0 - 52.25720).abs() < 1e-4, "lat {}", fix.0);
        assert!((fix.1 - 3.91937).abs() < 1e-4, "lon {}", fix.1);
    }

    #[test]
    fn test_global_decode_odd_later() {
        let fix = airborne_position(&parse(EVEN), &parse(ODD), 0.0, 1.0)
            .unwrap()
            .unwrap();
        assert!((fix.0 - 52.26578).abs() < 1e-4, "lat {}", fix.0);
        assert!((fix.1 - 3.93891).abs() < 1e-4, "lon {}", fix.1);
    }

    #[test]
    fn test_global_decode_order_free() {
        // Arguments swapped, timestamps following: same fix
        let a = airborne_position(&parse(EVEN), &parse(ODD), 1.0, 0.0).unwrap();
        let b = airborne_position(&parse(ODD), &parse(EVEN), 0.0, 1.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_global_decode_same_parity_is_error() {
        let err = airborne_position(&parse(EVEN), &parse(EVEN), 0.0, 1.0).unwrap_err();
        assert!(matches!(err, DecodeError::CprParity));
    }

    #[test]
    fn test_global_decode_zone_mismatch_is_no_fix() {
        let fix =
            airborne_position(&parse(MISMATCH_EVEN), &parse(MISMATCH_ODD), 0.0, 1.0).unwrap();
        assert_eq!(fix, None);
    }

    #[test]
    fn test_local_decode_even() {
        let (lat, lon) = airborne_position_with_ref(&parse(EVEN), 52.258, 3.918);
        assert!((lat - 52.25720).abs() < 1e-4, "lat {lat}");
        assert!((lon - 3.91937).abs() < 1e-4, "lon {lon}");
    }

    #[test]
    fn test_local_decode_odd() {
        let (lat, lon) = airborne_position_with_ref(&parse(ODD), 52.258, 3.918);
        assert!((lat - 52.26578).abs() < 1e-4, "lat {lat}");
        assert!((lon - 3.93891).abs() < 1e-4, "lon {lon}");
    }

    #[test]
    fn test_pair_boundaries() {
        use Parity::{Even as E, Odd as O};
        // E,O,E,E,O: boundary at 0 (E->O); index 2 (E repeat) is not one
        let b = pair_boundaries(&[E, O, E, E, O]);
        assert!(b.contains(&0));
        assert!(!b.contains(&2));
        assert_eq!(b, vec![0, 1, 3]);

        assert!(pair_boundaries(&[]).is_empty());
        assert!(pair_boundaries(&[E, E, E]).is_empty());
    }

    fn batch(entries: &[(&str, f64)]) -> Vec<CprMessage> {
        entries
            .iter()
            .map(|&(hex, time)| CprMessage {
                time,
                frame: parse(hex),
            })
            .collect()
    }

    #[test]
    fn test_resolve_batch_pairs_and_references() {
        let msgs = batch(&[
            (EVEN, 0.0),
            (ODD, 1.0),
            (EVEN, 2.0),
            (EVEN, 3.0),
            (ODD, 4.0),
        ]);
        let fixes = resolve_batch(0x40621D, &msgs).unwrap();

        // pair (0,1), pair (1,2), ref decode of 2, pair (3,4), ref decode of 4
        assert_eq!(fixes.len(), 5);
        for fix in &fixes {
            assert_eq!(fix.icao, 0x40621D);
            assert_eq!(fix.alt, Some(38000.0));
            assert!((fix.lat - 52.26).abs() < 0.02, "lat {}", fix.lat);
        }
        // pair (1,2) resolves with the even frame later
        assert!((fixes[1].lat - 52.25720).abs() < 1e-4);
        assert!((fixes[1].lon - 3.91937).abs() < 1e-4);
        // output order follows input order
        assert!(fixes.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn test_resolve_batch_no_pair_no_output() {
        // Same parity throughout: no boundary, no reference, nothing emitted
        let msgs = batch(&[(EVEN, 0.0), (EVEN, 1.0), (EVEN, 2.0)]);
        let fixes = resolve_batch(0x40621D, &msgs).unwrap();
        assert!(fixes.is_empty());
    }

    #[test]
    fn test_resolve_batch_zone_mismatch_silent() {
        // Mismatch frames carry no altitude, so the candidate is skipped
        // without error and nothing downstream has a reference.
        let msgs = batch(&[(MISMATCH_EVEN, 0.0), (MISMATCH_ODD, 1.0)]);
        let fixes = resolve_batch(0x40621D, &msgs).unwrap();
        assert!(fixes.is_empty());
    }

    #[test]
    fn test_resolve_batch_no_fix_pair_invalidates_reference() {
        // Variants of the mismatch frames carrying the 38000 ft altitude
        // field, so the pair passes the altitude gate and reaches the
        // zone-mismatch no-fix.
        let even_alt = "8D40621D58C382FA1C9C40000000";
        let odd_alt = "8D40621D58C386DEDC9C40000000";

        let msgs = batch(&[
            (EVEN, 0.0),
            (ODD, 1.0),
            (even_alt, 2.0),
            (odd_alt, 3.0),
            (odd_alt, 4.0),
        ]);
        let fixes = resolve_batch(0x40621D, &msgs).unwrap();

        // pair (0,1) fixes; pair (1,2) happens to fix as well; pair (2,3)
        // is a no-fix that clears the reference, so the trailing odd frame
        // yields nothing.
        assert_eq!(fixes.len(), 2);
        assert!((fixes[0].lat - 52.26578).abs() < 1e-4);
        assert!((fixes[0].lon - 3.93891).abs() < 1e-4);
        assert!((fixes[1].lat - 64.46548).abs() < 1e-4);
        assert!((fixes[1].lon - -24.40547).abs() < 1e-4);
        assert_eq!(fixes[1].time, 2.0);
    }

    #[test]
    fn test_resolve_batch_rejects_non_position_messages() {
        let msgs = batch(&[("8D4840D6202CC371C32CE0576098", 0.0)]);
        let err = resolve_batch(0x4840D6, &msgs).unwrap_err();
        assert!(matches!(err, DecodeError::NotAirbornePosition));
    }
}
