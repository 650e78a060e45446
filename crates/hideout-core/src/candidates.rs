//! Fixed candidate grid around a target.

use crate::models::{CandidateSite, GeoPoint};

/// Distances from the target, in meters.
pub const DISTANCE_LADDER_M: [f64; 9] = [
    200.0, 500.0, 1000.0, 1500.0, 2000.0, 2500.0, 3000.0, 3500.0, 4000.0,
];

/// Cardinal and intercardinal bearings, in degrees.
pub const BEARING_LADDER_DEG: [f64; 8] = [0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0];

pub const CANDIDATE_COUNT: usize = DISTANCE_LADDER_M.len() * BEARING_LADDER_DEG.len();

/// Candidates in distance-major, bearing-minor order.
///
/// The order is the ranking tie-break, so it must not change between calls.
pub fn generate_candidates(target: GeoPoint) -> Vec<CandidateSite> {
    let mut candidates = Vec::with_capacity(CANDIDATE_COUNT);
    for distance_m in DISTANCE_LADDER_M {
        for bearing_deg in BEARING_LADDER_DEG {
            let point = target.destination(distance_m, bearing_deg);
            candidates.push(CandidateSite {
                latitude: point.lat,
                longitude: point.lon,
                distance_km: distance_m / 1000.0,
                bearing_deg,
                generation_index: candidates.len(),
            });
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_full_grid_in_order() {
        let target = GeoPoint::new(51.6564, 5.7083);
        let candidates = generate_candidates(target);
        assert_eq!(candidates.len(), 72);
        assert_eq!(candidates[0].distance_km, 0.2);
        assert_eq!(candidates[0].bearing_deg, 0.0);
        assert_eq!(candidates[1].bearing_deg, 45.0);
        assert_eq!(candidates[8].distance_km, 0.5);
        assert_eq!(candidates[71].distance_km, 4.0);
        assert_eq!(candidates[71].bearing_deg, 315.0);
        assert!(candidates
            .iter()
            .enumerate()
            .all(|(i, c)| c.generation_index == i));
    }

    #[test]
    fn test_projection_matches_ladder_distance() {
        let target = GeoPoint::new(51.6564, 5.7083);
        for candidate in generate_candidates(target) {
            let actual = target.distance_m(&candidate.point());
            assert!((actual - candidate.distance_km * 1000.0).abs() < 0.5);
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let target = GeoPoint::new(52.3105, 4.7683);
        let first = generate_candidates(target);
        let second = generate_candidates(target);
        assert_eq!(first, second);
    }
}
