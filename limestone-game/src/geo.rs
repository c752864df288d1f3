//! Great-circle distance and the distance-to-score curve.
use serde::{Deserialize, Serialize};

use crate::constants::{
    EARTH_RADIUS_M, EXCELLENT_RADIUS_M, FAIR_RADIUS_M, GOOD_RADIUS_M, MAX_ROUND_SCORE,
    MIN_GUESS_SCORE, PERFECT_RADIUS_M, POOR_RADIUS_M,
};
use crate::numbers::floor_f64_to_u32;

/// A decimal-degree coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Haversine distance to `other` in meters.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        distance_meters(self.lat, self.lon, other.lat, other.lon)
    }
}

/// Axis-aligned lat/lon rectangle describing a play area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.south..=self.north).contains(&point.lat)
            && (self.west..=self.east).contains(&point.lon)
    }

    #[must_use]
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }
}

/// Queen's campus and downtown Kingston.
pub const KINGSTON_BOUNDS: Bounds = Bounds {
    north: 44.245,
    south: 44.215,
    east: -76.475,
    west: -76.515,
};

/// Great-circle distance in meters between two decimal-degree coordinates.
///
/// The haversine term is clamped to `[0, 1]` so rounding error near
/// antipodal points cannot push `sqrt(1 - a)` into NaN.
#[must_use]
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Points awarded for a guess `distance` meters away, before hint penalties.
///
/// Each tier is floored at the value where the next closer tier ends, so the
/// curve never rises as distance grows. Negative inputs score as a perfect
/// guess; NaN scores the floor.
#[must_use]
pub fn score_for_distance(distance: f64) -> u32 {
    if distance.is_nan() {
        return MIN_GUESS_SCORE;
    }
    let d = distance.max(0.0);
    let raw = if d <= PERFECT_RADIUS_M {
        f64::from(MAX_ROUND_SCORE)
    } else if d <= EXCELLENT_RADIUS_M {
        (5_000.0 - d * 10.0).max(4_000.0)
    } else if d <= GOOD_RADIUS_M {
        (4_000.0 - d * 5.0).max(3_000.0)
    } else if d <= FAIR_RADIUS_M {
        (3_000.0 - d * 2.5).max(2_000.0)
    } else if d <= POOR_RADIUS_M {
        (2_000.0 - d).max(1_000.0)
    } else {
        (1_000.0 - d * 0.5).max(f64::from(MIN_GUESS_SCORE))
    };
    floor_f64_to_u32(raw)
}

/// Final score for a round: the curve value minus the hint penalty, never below zero.
#[must_use]
pub fn round_score(distance: f64, hint_penalty: u32) -> u32 {
    score_for_distance(distance).saturating_sub(hint_penalty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const GRANT_HALL: GeoPoint = GeoPoint::new(44.2315, -76.4959);

    #[test]
    fn identical_points_are_zero_apart() {
        assert!(GRANT_HALL.distance_to(GRANT_HALL).abs() < f64::EPSILON);
        assert!(distance_meters(0.0, 0.0, 0.0, 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn known_distance_matches_reference() {
        // Grant Hall to Douglas Library is a little under 300 m.
        let library = GeoPoint::new(44.2298, -76.4931);
        let d = GRANT_HALL.distance_to(library);
        assert!((280.0..305.0).contains(&d), "distance was {d}");
    }

    #[test]
    fn antipodal_points_stay_finite() {
        let d = distance_meters(0.0, 0.0, 0.0, 180.0);
        assert!(d.is_finite());
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_M;
        assert!((d - half_circumference).abs() < 1.0);
    }

    #[test]
    fn tiny_separations_are_positive() {
        let d = distance_meters(44.2315, -76.4959, 44.231_500_1, -76.4959);
        assert!(d > 0.0 && d < 0.1);
    }

    #[test]
    fn score_tiers_match_curve() {
        assert_eq!(score_for_distance(0.0), 5_000);
        assert_eq!(score_for_distance(10.0), 5_000);
        assert_eq!(score_for_distance(20.0), 4_800);
        assert_eq!(score_for_distance(50.0), 4_500);
        assert_eq!(score_for_distance(80.0), 3_600);
        assert_eq!(score_for_distance(150.0), 2_625);
        assert_eq!(score_for_distance(300.0), 1_700);
        assert_eq!(score_for_distance(600.0), 700);
        assert_eq!(score_for_distance(5_000.0), 100);
    }

    #[test]
    fn degenerate_distances_score_at_the_ends() {
        assert_eq!(score_for_distance(-5.0), 5_000);
        assert_eq!(score_for_distance(f64::NAN), MIN_GUESS_SCORE);
        assert_eq!(round_score(f64::NAN, 100), 0);
        assert_eq!(score_for_distance(f64::INFINITY), 100);
    }

    #[test]
    fn hint_penalty_floors_at_zero() {
        assert_eq!(round_score(0.0, 100), 4_900);
        assert_eq!(round_score(5_000.0, 300), 0);
    }

    #[test]
    fn kingston_bounds_contain_campus() {
        assert!(KINGSTON_BOUNDS.contains(GRANT_HALL));
        assert!(!KINGSTON_BOUNDS.contains(GeoPoint::new(43.65, -79.38)));
        assert!(KINGSTON_BOUNDS.contains(KINGSTON_BOUNDS.center()));
    }

    proptest! {
        #[test]
        fn score_never_increases_with_distance(a in 0.0f64..50_000.0, b in 0.0f64..50_000.0) {
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(score_for_distance(near) >= score_for_distance(far));
        }

        #[test]
        fn distance_is_symmetric(
            lat1 in -90.0f64..90.0,
            lon1 in -180.0f64..180.0,
            lat2 in -90.0f64..90.0,
            lon2 in -180.0f64..180.0,
        ) {
            let ab = distance_meters(lat1, lon1, lat2, lon2);
            let ba = distance_meters(lat2, lon2, lat1, lon1);
            prop_assert!((ab - ba).abs() < 1e-6);
            prop_assert!(ab >= 0.0);
        }

        #[test]
        fn each_hint_costs_exactly_one_penalty(d in 0.0f64..10_000.0, hints in 0u32..60) {
            let base = score_for_distance(d);
            let expected = base.saturating_sub(hints * crate::constants::HINT_PENALTY);
            prop_assert_eq!(round_score(d, hints * crate::constants::HINT_PENALTY), expected);
        }
    }
}
