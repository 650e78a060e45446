//! Cover and concealment scoring.

use crate::models::{CoverType, GeoPoint, TimeOfDay};

use super::{Landuse, TerrainRegion};

/// Radius within which building clusters count as nearby cover.
pub const BUILDING_SEARCH_RADIUS_M: f64 = 500.0;

const DEEP_DEPRESSION_M: f64 = -10.0;
const DEEP_DEPRESSION_BONUS: f64 = 0.10;
const SHALLOW_DEPRESSION_BONUS: f64 = 0.05;
const BUILDINGS_BONUS: f64 = 0.05;
const NIGHT_CONCEALMENT_BONUS: f64 = 0.20;
const RELIEF_BONUS: f64 = 0.10;
const RELIEF_MIN_M: f64 = 5.0;
const RELIEF_MAX_M: f64 = 30.0;

/// Cover and concealment at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverAssessment {
    pub landuse: Landuse,
    pub cover_type: CoverType,
    pub cover: f64,
    pub concealment: f64,
    /// Elevation relative to the region center (negative = lower)
    pub elevation_diff_m: f64,
    pub buildings_nearby: u32,
}

pub fn assess_cover(region: &TerrainRegion, point: GeoPoint, time_of_day: TimeOfDay) -> CoverAssessment {
    let landuse = region.landuse_at(point);
    let elevation_diff_m = region.elevation_at(point) - region.center_elevation();
    let buildings_nearby = region.buildings_near(point, BUILDING_SEARCH_RADIUS_M);

    CoverAssessment {
        landuse,
        cover_type: landuse.cover_type(buildings_nearby > 0),
        cover: cover_score(landuse, elevation_diff_m, buildings_nearby),
        concealment: concealment_score(landuse, elevation_diff_m, time_of_day),
        elevation_diff_m,
        buildings_nearby,
    }
}

fn cover_score(landuse: Landuse, elevation_diff_m: f64, buildings_nearby: u32) -> f64 {
    let mut score = landuse.cover_base();

    // Sitting in a depression hides the operator from the target
    if elevation_diff_m < DEEP_DEPRESSION_M {
        score += DEEP_DEPRESSION_BONUS;
    } else if elevation_diff_m < 0.0 {
        score += SHALLOW_DEPRESSION_BONUS;
    }

    if buildings_nearby > 0 {
        score += BUILDINGS_BONUS;
    }

    score.min(1.0)
}

fn concealment_score(landuse: Landuse, elevation_diff_m: f64, time_of_day: TimeOfDay) -> f64 {
    let mut score = landuse.cover_base() * landuse.concealment_multiplier();

    if time_of_day.is_night() {
        score += NIGHT_CONCEALMENT_BONUS;
    }

    let relief = elevation_diff_m.abs();
    if relief > RELIEF_MIN_M && relief < RELIEF_MAX_M {
        score += RELIEF_BONUS;
    }

    score.min(1.0)
}
