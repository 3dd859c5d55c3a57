//! Great-circle distance on a spherical Earth.
//!
//! Uses the spherical law of cosines with the same constants the catalog
//! queries have always used, so distances stay comparable with stored data.

use serde::{Deserialize, Serialize};

/// Degrees per radian, truncated the way the catalog queries use it.
pub const DEGREES_PER_RADIAN: f64 = 57.2958;

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3958.75;

/// A (latitude, longitude) pair in degrees.
///
/// No range validation is performed; out-of-range values are tolerated by
/// every computation in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Round both components to 4 decimal places (about 11 m).
    pub fn rounded(&self) -> Self {
        Self {
            lat: round4(self.lat),
            lng: round4(self.lng),
        }
    }

    /// Distance in statute miles to `other`.
    pub fn miles_to(&self, other: &Coordinate) -> f64 {
        great_circle_miles(self, other)
    }

    /// Bit-exact key used to collapse records plotted at the same point.
    pub(crate) fn exact_key(&self) -> (u64, u64) {
        // -0.0 and 0.0 plot at the same spot
        let norm = |v: f64| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() };
        (norm(self.lat), norm(self.lng))
    }
}

/// Round half away from zero to 4 decimal places.
pub fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Surface distance between two coordinates in statute miles.
///
/// The arccosine argument is clamped to at most 1 so rounding at zero
/// separation cannot produce NaN; it is also floored at -1 for antipodes.
pub fn great_circle_miles(a: &Coordinate, b: &Coordinate) -> f64 {
    if a.lat == b.lat && a.lng == b.lng {
        return 0.0;
    }

    // Fixed operand order keeps the result bit-identical when a and b swap.
    let (a, b) = match a.lat.total_cmp(&b.lat).then(a.lng.total_cmp(&b.lng)) {
        std::cmp::Ordering::Greater => (b, a),
        _ => (a, b),
    };

    let lat1 = a.lat / DEGREES_PER_RADIAN;
    let lng1 = a.lng / DEGREES_PER_RADIAN;
    let lat2 = b.lat / DEGREES_PER_RADIAN;
    let lng2 = b.lng / DEGREES_PER_RADIAN;

    let c = lat1.cos() * lng1.cos() * lat2.cos() * lng2.cos()
        + lat1.cos() * lng1.sin() * lat2.cos() * lng2.sin()
        + lat1.sin() * lat2.sin();

    c.clamp(-1.0, 1.0).acos() * EARTH_RADIUS_MILES
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_identical_points_are_zero() {
        for (lat, lng) in [(0.0, 0.0), (51.5, -0.12), (-33.86, 151.2), (89.9999, 179.9999)] {
            let p = Coordinate::new(lat, lng);
            assert_eq!(great_circle_miles(&p, &p), 0.0);
        }
    }

    #[test]
    fn test_symmetric() {
        let chicago = Coordinate::new(41.8781, -87.6298);
        let denver = Coordinate::new(39.7392, -104.9903);
        assert_eq!(
            great_circle_miles(&chicago, &denver),
            great_circle_miles(&denver, &chicago)
        );
    }

    #[test]
    fn test_known_distance() {
        // New York to Los Angeles is roughly 2445 statute miles
        let nyc = Coordinate::new(40.7128, -74.0060);
        let la = Coordinate::new(34.0522, -118.2437);
        let d = great_circle_miles(&nyc, &la);
        assert!((d - 2445.0).abs() < 15.0, "got {}", d);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let a = Coordinate::new(10.0, 20.0);
        let b = Coordinate::new(11.0, 20.0);
        assert_abs_diff_eq!(great_circle_miles(&a, &b), 69.09, epsilon = 0.05);
    }

    #[test]
    fn test_monotonic_along_meridian() {
        let origin = Coordinate::new(0.0, 30.0);
        let near = Coordinate::new(5.0, 30.0);
        let mid = Coordinate::new(20.0, 30.0);
        let far = Coordinate::new(60.0, 30.0);
        let d1 = great_circle_miles(&origin, &near);
        let d2 = great_circle_miles(&origin, &mid);
        let d3 = great_circle_miles(&origin, &far);
        assert!(d1 <= d2 && d2 <= d3);
    }

    #[test]
    fn test_out_of_range_input_is_finite() {
        let a = Coordinate::new(250.0, -900.0);
        let b = Coordinate::new(-91.0, 181.0);
        let d = great_circle_miles(&a, &b);
        assert!(d.is_finite() && d >= 0.0);
    }

    #[test]
    fn test_antipodes_are_finite() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 180.0);
        let d = great_circle_miles(&a, &b);
        assert!(d.is_finite());
        assert!(d > 12_000.0);
    }

    #[test]
    fn test_rounded() {
        let p = Coordinate::new(12.345_67, -98.765_43).rounded();
        assert_abs_diff_eq!(p.lat, 12.3457, epsilon = 1e-9);
        assert_abs_diff_eq!(p.lng, -98.7654, epsilon = 1e-9);
    }
}
