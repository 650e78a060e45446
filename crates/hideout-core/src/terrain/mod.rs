//! Terrain intelligence: land use, elevation, and the scores derived from them.
//!
//! A [`TerrainProvider`] loads a [`TerrainRegion`] around a center point.
//! Regions are memoized by [`cache::TerrainIntel`], and the scoring helpers in
//! [`cover`], [`los`] and [`exfil`] only ever read from a loaded region.

pub mod cache;
pub mod cover;
pub mod exfil;
pub mod grid;
pub mod los;
pub mod synthetic;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{CoverType, GeoPoint};
use crate::spatial;

pub use cache::{RegionKey, TerrainIntel};
pub use grid::{ElevationGrid, GridBounds, GridLayout};
pub use synthetic::SyntheticTerrain;

/// Max distance to a land-use feature for it to classify a point.
pub const LANDUSE_MATCH_RADIUS_M: f64 = 500.0;

#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("terrain provider request failed: {0}")]
    Request(String),
    #[error("terrain provider HTTP {0}")]
    Http(u16),
    #[error("terrain provider returned malformed data: {0}")]
    Malformed(String),
    #[error("terrain provider did not answer within {0:?}")]
    Timeout(std::time::Duration),
    #[error("terrain provider returned {actual} samples, expected {expected}")]
    SampleCount { expected: usize, actual: usize },
    #[error("invalid terrain region: {0}")]
    InvalidRegion(String),
}

/// Land-use category of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landuse {
    Forest,
    Wood,
    Scrub,
    Residential,
    Industrial,
    Commercial,
    Farmland,
    Grass,
    Meadow,
    Park,
    Parking,
    Bare,
    Water,
    Unknown,
}

impl Landuse {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "forest" => Landuse::Forest,
            "wood" => Landuse::Wood,
            "scrub" => Landuse::Scrub,
            "residential" => Landuse::Residential,
            "industrial" => Landuse::Industrial,
            "commercial" | "retail" => Landuse::Commercial,
            "farmland" => Landuse::Farmland,
            "grass" => Landuse::Grass,
            "meadow" => Landuse::Meadow,
            "park" => Landuse::Park,
            "parking" => Landuse::Parking,
            "bare" | "bare_rock" => Landuse::Bare,
            "water" => Landuse::Water,
            _ => Landuse::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Landuse::Forest => "forest",
            Landuse::Wood => "wood",
            Landuse::Scrub => "scrub",
            Landuse::Residential => "residential",
            Landuse::Industrial => "industrial",
            Landuse::Commercial => "commercial",
            Landuse::Farmland => "farmland",
            Landuse::Grass => "grass",
            Landuse::Meadow => "meadow",
            Landuse::Park => "park",
            Landuse::Parking => "parking",
            Landuse::Bare => "bare",
            Landuse::Water => "water",
            Landuse::Unknown => "unknown",
        }
    }

    /// Physical cover offered by the land use.
    pub fn cover_base(self) -> f64 {
        match self {
            Landuse::Forest | Landuse::Wood => 0.95,
            Landuse::Scrub => 0.75,
            Landuse::Residential => 0.70,
            Landuse::Industrial | Landuse::Commercial => 0.65,
            Landuse::Farmland => 0.30,
            Landuse::Park => 0.25,
            Landuse::Grass | Landuse::Meadow => 0.20,
            Landuse::Bare => 0.10,
            Landuse::Water => 0.05,
            Landuse::Parking | Landuse::Unknown => 0.40,
        }
    }

    /// How well an operator blends in, relative to the cover base.
    pub fn concealment_multiplier(self) -> f64 {
        match self {
            Landuse::Forest | Landuse::Wood => 1.0,
            Landuse::Residential => 0.9,
            Landuse::Industrial | Landuse::Commercial => 0.7,
            Landuse::Farmland => 0.5,
            Landuse::Grass | Landuse::Meadow => 0.3,
            Landuse::Water => 0.1,
            _ => 0.6,
        }
    }

    /// Cover label; open land next to buildings reads as a rural structure.
    pub fn cover_type(self, buildings_nearby: bool) -> CoverType {
        match self {
            Landuse::Forest | Landuse::Wood | Landuse::Scrub => CoverType::Forest,
            Landuse::Residential | Landuse::Industrial | Landuse::Commercial => {
                CoverType::UrbanBuilding
            }
            Landuse::Parking => CoverType::ParkingLot,
            Landuse::Farmland | Landuse::Grass | Landuse::Meadow | Landuse::Park | Landuse::Bare => {
                if buildings_nearby {
                    CoverType::RuralStructure
                } else {
                    CoverType::OpenField
                }
            }
            Landuse::Water | Landuse::Unknown => CoverType::Unknown,
        }
    }
}

/// Road classification, used for exfiltration quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadKind {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    Unclassified,
    Track,
    Path,
    Footway,
    Other,
}

impl RoadKind {
    pub fn quality(self) -> f64 {
        match self {
            RoadKind::Motorway => 1.0,
            RoadKind::Trunk => 0.95,
            RoadKind::Primary => 0.90,
            RoadKind::Secondary => 0.85,
            RoadKind::Tertiary => 0.75,
            RoadKind::Residential => 0.70,
            RoadKind::Unclassified => 0.60,
            RoadKind::Track => 0.40,
            RoadKind::Path => 0.20,
            RoadKind::Footway => 0.10,
            RoadKind::Other => 0.50,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoadKind::Motorway => "motorway",
            RoadKind::Trunk => "trunk",
            RoadKind::Primary => "primary",
            RoadKind::Secondary => "secondary",
            RoadKind::Tertiary => "tertiary",
            RoadKind::Residential => "residential",
            RoadKind::Unclassified => "unclassified",
            RoadKind::Track => "track",
            RoadKind::Path => "path",
            RoadKind::Footway => "footway",
            RoadKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanduseFeature {
    pub landuse: Landuse,
    pub center: GeoPoint,
}

/// One straight piece of a road; segments of the same road share `road_id`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadSegment {
    pub road_id: u32,
    pub kind: RoadKind,
    pub start: GeoPoint,
    pub end: GeoPoint,
}

impl RoadSegment {
    pub fn distance_m(&self, point: GeoPoint) -> f64 {
        spatial::distance_to_segment_m(
            point.lat,
            point.lon,
            self.start.lat,
            self.start.lon,
            self.end.lat,
            self.end.lon,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingCluster {
    pub center: GeoPoint,
    pub count: u32,
}

/// A road reachable from a point, closest segment only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyRoad {
    pub road_id: u32,
    pub kind: RoadKind,
    pub distance_m: f64,
}

/// Land use and elevation at a single coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainSample {
    pub landuse: Landuse,
    pub elevation_m: f64,
}

/// Where a region's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSource {
    Synthetic,
    Remote,
}

/// Everything known about the terrain around a center point.
#[derive(Debug, Clone)]
pub struct TerrainRegion {
    pub center: GeoPoint,
    pub radius_km: f64,
    pub landuse: Vec<LanduseFeature>,
    pub roads: Vec<RoadSegment>,
    pub buildings: Vec<BuildingCluster>,
    pub elevation: ElevationGrid,
    pub source: RegionSource,
}

impl TerrainRegion {
    /// Land use of the nearest feature within [`LANDUSE_MATCH_RADIUS_M`].
    pub fn landuse_at(&self, point: GeoPoint) -> Landuse {
        self.landuse
            .iter()
            .map(|feature| (feature.landuse, feature.center.distance_m(&point)))
            .filter(|(_, distance)| *distance <= LANDUSE_MATCH_RADIUS_M)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(landuse, _)| landuse)
            .unwrap_or(Landuse::Unknown)
    }

    pub fn elevation_at(&self, point: GeoPoint) -> f64 {
        self.elevation.sample_point(point)
    }

    pub fn center_elevation(&self) -> f64 {
        self.elevation_at(self.center)
    }

    pub fn sample(&self, point: GeoPoint) -> TerrainSample {
        TerrainSample {
            landuse: self.landuse_at(point),
            elevation_m: self.elevation_at(point),
        }
    }

    /// Total buildings in clusters within `radius_m`.
    pub fn buildings_near(&self, point: GeoPoint, radius_m: f64) -> u32 {
        self.buildings
            .iter()
            .filter(|cluster| cluster.center.distance_m(&point) <= radius_m)
            .map(|cluster| cluster.count)
            .sum()
    }

    /// Roads with any segment within `radius_m`, one entry per road.
    pub fn roads_near(&self, point: GeoPoint, radius_m: f64) -> Vec<NearbyRoad> {
        let mut nearby: Vec<NearbyRoad> = Vec::new();
        for segment in &self.roads {
            let distance_m = segment.distance_m(point);
            if distance_m > radius_m {
                continue;
            }
            match nearby.iter_mut().find(|road| road.road_id == segment.road_id) {
                Some(road) if distance_m < road.distance_m => road.distance_m = distance_m,
                Some(_) => {}
                None => nearby.push(NearbyRoad {
                    road_id: segment.road_id,
                    kind: segment.kind,
                    distance_m,
                }),
            }
        }
        nearby
    }
}

/// Source of terrain regions.
///
/// Implementations must be deterministic for a given `(center, radius_km)`:
/// the region cache treats loads as pure.
pub trait TerrainProvider: Send + Sync {
    fn name(&self) -> &str;

    fn load_region(&self, center: GeoPoint, radius_km: f64) -> Result<TerrainRegion, TerrainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_region(center: GeoPoint) -> TerrainRegion {
        let layout = GridLayout::resolve(GridBounds::around(center, 2000.0), 250.0, 1024);
        TerrainRegion {
            center,
            radius_km: 1.5,
            landuse: vec![
                LanduseFeature {
                    landuse: Landuse::Forest,
                    center: center.destination(300.0, 0.0),
                },
                LanduseFeature {
                    landuse: Landuse::Water,
                    center: center.destination(700.0, 0.0),
                },
            ],
            roads: vec![
                RoadSegment {
                    road_id: 1,
                    kind: RoadKind::Primary,
                    start: center.destination(1000.0, 270.0),
                    end: center,
                },
                RoadSegment {
                    road_id: 1,
                    kind: RoadKind::Primary,
                    start: center,
                    end: center.destination(1000.0, 90.0),
                },
            ],
            buildings: vec![BuildingCluster {
                center: center.destination(200.0, 180.0),
                count: 8,
            }],
            elevation: ElevationGrid::from_fn(layout, |_| 30.0),
            source: RegionSource::Synthetic,
        }
    }

    #[test]
    fn test_landuse_nearest_feature_within_radius() {
        let center = GeoPoint::new(51.0, 5.0);
        let region = flat_region(center);
        assert_eq!(region.landuse_at(center.destination(250.0, 0.0)), Landuse::Forest);
        assert_eq!(region.landuse_at(center.destination(800.0, 0.0)), Landuse::Water);
        assert_eq!(region.landuse_at(center.destination(1500.0, 180.0)), Landuse::Unknown);
    }

    #[test]
    fn test_roads_near_deduplicates_by_road() {
        let center = GeoPoint::new(51.0, 5.0);
        let region = flat_region(center);
        let roads = region.roads_near(center.destination(100.0, 0.0), 500.0);
        assert_eq!(roads.len(), 1);
        assert!((roads[0].distance_m - 100.0).abs() < 1.0);
    }

    #[test]
    fn test_buildings_near() {
        let center = GeoPoint::new(51.0, 5.0);
        let region = flat_region(center);
        assert_eq!(region.buildings_near(center, 500.0), 8);
        assert_eq!(region.buildings_near(center.destination(2000.0, 0.0), 500.0), 0);
    }

    #[test]
    fn test_cover_type_mapping() {
        assert_eq!(Landuse::Wood.cover_type(false), CoverType::Forest);
        assert_eq!(Landuse::Industrial.cover_type(false), CoverType::UrbanBuilding);
        assert_eq!(Landuse::Farmland.cover_type(true), CoverType::RuralStructure);
        assert_eq!(Landuse::Grass.cover_type(false), CoverType::OpenField);
        assert_eq!(Landuse::Parking.cover_type(false), CoverType::ParkingLot);
        assert_eq!(Landuse::Water.cover_type(true), CoverType::Unknown);
    }

    #[test]
    fn test_landuse_tags() {
        assert_eq!(Landuse::from_tag("Forest"), Landuse::Forest);
        assert_eq!(Landuse::from_tag("retail"), Landuse::Commercial);
        assert_eq!(Landuse::from_tag("quarry"), Landuse::Unknown);
    }
}
