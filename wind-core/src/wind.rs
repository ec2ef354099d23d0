//! Wind retrieval from paired track/speed and heading/airspeed reports.
//!
//! Wind is the vector difference between the ground velocity (from BDS 5,0
//! track and ground speed) and the air velocity (from BDS 6,0 magnetic
//! heading and true airspeed). A fixed 8 degree offset maps the magnetic
//! heading into the track's reference frame before subtraction; this
//! calibration constant is preserved as observed.

use crate::types::WindVector;

/// Magnetic-to-true heading offset, degrees.
const HEADING_OFFSET_DEG: f64 = 8.0;

/// Zero-component nudge applied before the direction arctangent.
const DIRECTION_EPS: f64 = 1e-7;

/// Horizontal wind from one ground-velocity / air-velocity pair.
///
/// `track` and `heading` in degrees, speeds in knots. The magnitude is
/// computed from the raw components; the direction from components with
/// exact zeros nudged by a small epsilon, so a calm wind still gets a
/// finite direction.
pub fn wind_vector(
    ground_speed: f64,
    track: f64,
    true_airspeed: f64,
    heading: f64,
) -> WindVector {
    let tau = track.to_radians();
    let psi = (heading - HEADING_OFFSET_DEG).to_radians();

    let u = ground_speed * tau.sin() - true_airspeed * psi.sin();
    let v = ground_speed * tau.cos() - true_airspeed * psi.cos();

    let speed = (u * u + v * v).sqrt();

    let un = if u == 0.0 { DIRECTION_EPS } else { u };
    let vn = if v == 0.0 { DIRECTION_EPS } else { v };
    let direction = if un > 0.0 {
        270.0 - (vn / un).atan().to_degrees()
    } else {
        90.0 - (vn / un).atan().to_degrees()
    };

    WindVector {
        u,
        v,
        speed,
        direction,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_wind_from_register_pair() {
        // Field values of a real BDS50/BDS60 report pair
        let w = wind_vector(438.0, 114.258, 424.0, 42.715);
        assert!(close(w.u, 157.86088306563366, 1e-9), "u {}", w.u);
        assert!(close(w.v, -528.4764854685118, 1e-9), "v {}", w.v);
        assert!(close(w.speed, 551.5500467731027, 1e-9), "speed {}", w.speed);
        assert!(
            close(w.direction, 343.3686212232483, 1e-9),
            "dir {}",
            w.direction
        );
    }

    #[test]
    fn test_pure_headwind() {
        // Stationary over ground, airspeed 100 kt on the offset-corrected
        // north axis: wind blows from due north.
        let w = wind_vector(0.0, 0.0, 100.0, 8.0);
        assert!(close(w.u, 0.0, 1e-12));
        assert!(close(w.v, -100.0, 1e-12));
        assert!(close(w.speed, 100.0, 1e-12));
        assert!(close(w.direction, 360.0, 1e-4), "dir {}", w.direction);
    }

    #[test]
    fn test_calm_wind_direction_finite() {
        // Identical ground and air vectors: zero wind, but the epsilon
        // nudge keeps the direction defined (both components +eps -> 225).
        let w = wind_vector(250.0, 90.0, 250.0, 98.0);
        assert!(close(w.speed, 0.0, 1e-9));
        assert!(close(w.direction, 225.0, 1e-6), "dir {}", w.direction);
    }

    #[test]
    fn test_southerly_tailwind() {
        let w = wind_vector(300.0, 180.0, 280.0, 188.0);
        assert!(close(w.v, -20.0, 1e-9));
        assert!(close(w.speed, 20.0, 1e-9));
        assert!(close(w.direction, 360.0, 1e-6), "dir {}", w.direction);
    }

    #[test]
    fn test_speed_uses_raw_components() {
        // The magnitude must come from the un-nudged components: exactly
        // zero wind has speed 0 even though the direction is nudged.
        let w = wind_vector(250.0, 90.0, 250.0, 98.0);
        assert_eq!(w.speed, 0.0);
    }
}
