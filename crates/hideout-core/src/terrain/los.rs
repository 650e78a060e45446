//! Line-of-sight between an operator position and the target.

use crate::models::GeoPoint;

use super::TerrainRegion;

pub const DEFAULT_LOS_SAMPLES: usize = 10;

/// Terrain rising more than this above the sight line blocks it (meters).
const OBSTRUCTION_THRESHOLD_M: f64 = 10.0;
const BLOCKED_PENALTY_SPAN_M: f64 = 50.0;
const HIGH_VANTAGE_M: f64 = 20.0;
const MODERATE_VANTAGE_M: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineOfSight {
    pub has_los: bool,
    /// Largest excess of terrain over the sight line (negative = always below)
    pub max_obstruction_m: f64,
    pub operator_elevation_m: f64,
    pub target_elevation_m: f64,
    pub quality: f64,
}

/// Sample the straight operator→target path and grade the view.
///
/// Uses `samples` segments; the intermediate points `1..samples` are compared
/// against the line interpolated between the endpoint elevations.
pub fn compute_line_of_sight(
    region: &TerrainRegion,
    operator: GeoPoint,
    target: GeoPoint,
    samples: usize,
) -> LineOfSight {
    let samples = samples.max(2);
    let operator_elevation_m = region.elevation_at(operator);
    let target_elevation_m = region.elevation_at(target);

    let mut max_obstruction_m = f64::NEG_INFINITY;
    for i in 1..samples {
        let t = i as f64 / samples as f64;
        let point = GeoPoint::new(
            operator.lat + t * (target.lat - operator.lat),
            operator.lon + t * (target.lon - operator.lon),
        );
        let expected = operator_elevation_m + t * (target_elevation_m - operator_elevation_m);
        let obstruction = region.elevation_at(point) - expected;
        max_obstruction_m = max_obstruction_m.max(obstruction);
    }

    let has_los = max_obstruction_m <= OBSTRUCTION_THRESHOLD_M;
    let mut quality = if !has_los {
        (0.5 - (max_obstruction_m - OBSTRUCTION_THRESHOLD_M) / BLOCKED_PENALTY_SPAN_M).max(0.0)
    } else if max_obstruction_m < -OBSTRUCTION_THRESHOLD_M {
        1.0
    } else if max_obstruction_m < 0.0 {
        0.9
    } else {
        0.8
    };

    let vantage = operator_elevation_m - target_elevation_m;
    if vantage > HIGH_VANTAGE_M {
        quality += 0.10;
    } else if vantage > MODERATE_VANTAGE_M {
        quality += 0.05;
    }

    LineOfSight {
        has_los,
        max_obstruction_m,
        operator_elevation_m,
        target_elevation_m,
        quality: quality.clamp(0.0, 1.0),
    }
}

pub fn has_line_of_sight(region: &TerrainRegion, operator: GeoPoint, target: GeoPoint) -> bool {
    compute_line_of_sight(region, operator, target, DEFAULT_LOS_SAMPLES).has_los
}
