//! Deterministic synthetic terrain.
//!
//! Not real geography. Every value is a pure function of distance and bearing
//! from the region center, which makes the provider usable offline, in tests,
//! and as the fallback whenever a remote provider fails.

use crate::models::GeoPoint;

use super::{
    BuildingCluster, ElevationGrid, GridBounds, GridLayout, Landuse, LanduseFeature, RegionSource,
    RoadKind, RoadSegment, TerrainError, TerrainProvider, TerrainRegion,
};

pub const SYNTHETIC_GRID_SPACING_M: f64 = 250.0;
pub const SYNTHETIC_GRID_MAX_POINTS: usize = 4096;

const BASE_ELEVATION_M: f64 = 50.0;
/// Extra margin loaded beyond the requested radius (km).
const REGION_MARGIN_KM: f64 = 0.5;
const RING_RADII_KM: [f64; 10] = [0.2, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5];
const FEATURE_BEARING_STEP_DEG: f64 = 15.0;
const OUTER_LANDUSE: [Landuse; 8] = [
    Landuse::Forest,
    Landuse::Farmland,
    Landuse::Scrub,
    Landuse::Forest,
    Landuse::Grass,
    Landuse::Industrial,
    Landuse::Farmland,
    Landuse::Water,
];

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticTerrain;

impl SyntheticTerrain {
    pub fn new() -> Self {
        Self
    }

    /// Synthetic elevation at `point` for a region centered on `center`.
    pub fn elevation_model(center: GeoPoint, point: GeoPoint) -> f64 {
        let d_km = center.distance_m(&point) / 1000.0;
        if d_km < 1e-6 {
            return BASE_ELEVATION_M;
        }
        let theta = center.bearing_to_deg(&point).to_radians();
        let relief = 20.0 * (d_km * 1.5 + 2.0 * theta).sin() + 15.0 * (3.0 * theta).cos();
        BASE_ELEVATION_M + d_km.min(1.0) * relief
    }

    pub fn generate(&self, center: GeoPoint, radius_km: f64) -> TerrainRegion {
        let outer_km = radius_km + REGION_MARGIN_KM;
        let (landuse, buildings) = landuse_and_buildings(center, outer_km);
        let roads = road_network(center, outer_km);
        let layout = GridLayout::resolve(
            GridBounds::around(center, outer_km * 1000.0),
            SYNTHETIC_GRID_SPACING_M,
            SYNTHETIC_GRID_MAX_POINTS,
        );
        let elevation = ElevationGrid::from_fn(layout, |point| Self::elevation_model(center, point));

        TerrainRegion {
            center,
            radius_km,
            landuse,
            roads,
            buildings,
            elevation,
            source: RegionSource::Synthetic,
        }
    }
}

impl TerrainProvider for SyntheticTerrain {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn load_region(&self, center: GeoPoint, radius_km: f64) -> Result<TerrainRegion, TerrainError> {
        if !center.is_valid() {
            return Err(TerrainError::InvalidRegion(format!(
                "center ({}, {}) out of range",
                center.lat, center.lon
            )));
        }
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(TerrainError::InvalidRegion(format!("radius {radius_km} km")));
        }
        Ok(self.generate(center, radius_km))
    }
}

fn synthetic_landuse(ring_idx: usize, bearing_idx: usize) -> Landuse {
    let ring_km = RING_RADII_KM[ring_idx];
    let sector = bearing_idx / 3;
    if ring_km < 1.0 {
        if sector % 4 == 2 {
            Landuse::Commercial
        } else {
            Landuse::Residential
        }
    } else if ring_km < 2.0 {
        [
            Landuse::Industrial,
            Landuse::Residential,
            Landuse::Scrub,
            Landuse::Farmland,
        ][sector % 4]
    } else {
        OUTER_LANDUSE[(sector + ring_idx) % OUTER_LANDUSE.len()]
    }
}

fn landuse_and_buildings(
    center: GeoPoint,
    outer_km: f64,
) -> (Vec<LanduseFeature>, Vec<BuildingCluster>) {
    let bearings = (360.0 / FEATURE_BEARING_STEP_DEG) as usize;
    let mut features = Vec::new();
    let mut buildings = Vec::new();

    for (ring_idx, ring_km) in RING_RADII_KM.iter().enumerate() {
        if *ring_km > outer_km {
            break;
        }
        for bearing_idx in 0..bearings {
            let bearing_deg = bearing_idx as f64 * FEATURE_BEARING_STEP_DEG;
            let position = center.destination(ring_km * 1000.0, bearing_deg);
            let landuse = synthetic_landuse(ring_idx, bearing_idx);
            features.push(LanduseFeature {
                landuse,
                center: position,
            });

            let count = match landuse {
                Landuse::Residential => 12,
                Landuse::Commercial => 8,
                Landuse::Industrial => 6,
                Landuse::Farmland if (ring_idx + bearing_idx) % 4 == 0 => 2,
                _ => 0,
            };
            if count > 0 {
                buildings.push(BuildingCluster {
                    center: position,
                    count,
                });
            }
        }
    }

    (features, buildings)
}

fn radial(
    road_id: u32,
    kind: RoadKind,
    center: GeoPoint,
    bearing_deg: f64,
    from_km: f64,
    to_km: f64,
) -> Option<RoadSegment> {
    if from_km >= to_km {
        return None;
    }
    Some(RoadSegment {
        road_id,
        kind,
        start: center.destination(from_km * 1000.0, bearing_deg),
        end: center.destination(to_km * 1000.0, bearing_deg),
    })
}

fn ring(road_id: u32, kind: RoadKind, center: GeoPoint, radius_km: f64, sides: usize) -> Vec<RoadSegment> {
    let step = 360.0 / sides as f64;
    (0..sides)
        .map(|i| RoadSegment {
            road_id,
            kind,
            start: center.destination(radius_km * 1000.0, i as f64 * step),
            end: center.destination(radius_km * 1000.0, (i + 1) as f64 * step),
        })
        .collect()
}

fn road_network(center: GeoPoint, outer_km: f64) -> Vec<RoadSegment> {
    let mut roads = Vec::new();

    // Two arterials crossing at the center
    for (road_id, kind, bearings) in [
        (1, RoadKind::Primary, [0.0, 180.0]),
        (2, RoadKind::Secondary, [90.0, 270.0]),
    ] {
        for bearing in bearings {
            roads.extend(radial(road_id, kind, center, bearing, 0.0, outer_km));
        }
    }

    if outer_km >= 1.25 {
        roads.extend(ring(3, RoadKind::Residential, center, 1.25, 24));
    }
    if outer_km >= 3.25 {
        roads.extend(ring(4, RoadKind::Unclassified, center, 3.25, 36));
    }

    roads.extend(radial(5, RoadKind::Track, center, 45.0, 1.0, outer_km));
    roads.extend(radial(6, RoadKind::Track, center, 225.0, 1.0, outer_km));
    roads.extend(radial(7, RoadKind::Footway, center, 135.0, 0.5, outer_km.min(2.5)));
    roads.extend(radial(8, RoadKind::Tertiary, center, 315.0, 1.5, outer_km));

    roads
}
