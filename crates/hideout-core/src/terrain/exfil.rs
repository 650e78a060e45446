//! Exfiltration (escape route) scoring.

use serde::Serialize;

use crate::models::GeoPoint;

use super::{RoadKind, TerrainRegion};

/// Roads farther than this are not considered escape routes.
pub const EXFIL_SEARCH_RADIUS_M: f64 = 1000.0;
/// Escape on foot is always nominally possible.
pub const MIN_EXFIL_SCORE: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExfilRoute {
    pub kind: RoadKind,
    pub distance_m: f64,
    pub quality: f64,
    pub distance_factor: f64,
    pub score: f64,
}

pub fn distance_factor(distance_m: f64) -> f64 {
    if distance_m < 50.0 {
        1.0
    } else if distance_m < 100.0 {
        0.9
    } else if distance_m < 200.0 {
        0.8
    } else if distance_m < 500.0 {
        0.6
    } else {
        0.4
    }
}

/// Reachable roads, best first. Ties go to the closer road.
pub fn compute_exfil_routes(region: &TerrainRegion, point: GeoPoint) -> Vec<ExfilRoute> {
    let mut routes: Vec<ExfilRoute> = region
        .roads_near(point, EXFIL_SEARCH_RADIUS_M)
        .into_iter()
        .map(|road| {
            let quality = road.kind.quality();
            let distance_factor = distance_factor(road.distance_m);
            ExfilRoute {
                kind: road.kind,
                distance_m: road.distance_m,
                quality,
                distance_factor,
                score: quality * distance_factor,
            }
        })
        .collect();

    routes.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.distance_m.total_cmp(&b.distance_m))
    });
    routes
}

/// Best route plus redundancy and diversity bonuses, in `[0.2, 1.0]`.
pub fn score_exfil_routes(routes: &[ExfilRoute]) -> f64 {
    let Some(best) = routes.first() else {
        return MIN_EXFIL_SCORE;
    };

    let mut score = best.score;
    if routes.len() >= 3 {
        score += 0.15;
    } else if routes.len() >= 2 {
        score += 0.10;
    }

    let mut kinds: Vec<RoadKind> = Vec::with_capacity(3);
    for route in routes.iter().take(3) {
        if !kinds.contains(&route.kind) {
            kinds.push(route.kind);
        }
    }
    score += 0.05 * kinds.len() as f64;

    score.clamp(MIN_EXFIL_SCORE, 1.0)
}

pub fn score_exfil_attractiveness(region: &TerrainRegion, point: GeoPoint) -> f64 {
    score_exfil_routes(&compute_exfil_routes(region, point))
}
