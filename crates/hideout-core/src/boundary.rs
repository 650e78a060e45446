//! Protected site boundaries and the registry of known sites.
//!
//! A boundary is a hard constraint: any point for which [`SiteBoundary::is_inside`]
//! holds must never be reported as an operator location.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::GeoPoint;
use crate::spatial;

pub const DEFAULT_SAFETY_BUFFER_M: f64 = 200.0;
const MIN_RING_AREA_M2: f64 = 1.0;

/// Built-in sites: (name, lat, lon, radius_m).
const KNOWN_SITES: [(&str, f64, f64, f64); 3] = [
    ("Volkel Air Base", 51.6564, 5.7083, 1500.0),
    ("Eindhoven Airport", 51.4500, 5.3747, 1200.0),
    ("Schiphol Airport", 52.3105, 4.7683, 2500.0),
];

#[derive(Debug, Error, PartialEq)]
pub enum BoundaryError {
    #[error("boundary '{0}' must define exactly one of radius_m or polygon_vertices")]
    AmbiguousShape(String),
    #[error("boundary '{name}' polygon needs at least 3 distinct vertices, got {count}")]
    TooFewVertices { name: String, count: usize },
    #[error("boundary '{0}' polygon ring intersects itself")]
    SelfIntersecting(String),
    #[error("boundary '{0}' polygon ring encloses no area")]
    ZeroArea(String),
    #[error("boundary '{0}' has non-finite or out-of-range coordinates")]
    InvalidCoordinate(String),
    #[error("boundary '{name}' has invalid {field}: {value}")]
    InvalidDistance {
        name: String,
        field: &'static str,
        value: f64,
    },
    #[error("site '{0}' is already registered")]
    DuplicateSite(String),
}

/// Geometry of a protected zone.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryShape {
    Circle { radius_m: f64 },
    Polygon { vertices: Vec<GeoPoint> },
}

/// Wire form of a boundary; converted into [`SiteBoundary`] with validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteBoundaryRecord {
    pub name: String,
    #[serde(default)]
    pub center_lat: Option<f64>,
    #[serde(default)]
    pub center_lon: Option<f64>,
    #[serde(default)]
    pub radius_m: Option<f64>,
    /// Polygon vertices as [lat, lon] pairs
    #[serde(default)]
    pub polygon_vertices: Option<Vec<[f64; 2]>>,
    #[serde(default = "default_safety_buffer")]
    pub safety_buffer_m: f64,
}

fn default_safety_buffer() -> f64 {
    DEFAULT_SAFETY_BUFFER_M
}

/// A named protected zone with a safety buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SiteBoundaryRecord", into = "SiteBoundaryRecord")]
pub struct SiteBoundary {
    name: String,
    center: GeoPoint,
    shape: BoundaryShape,
    safety_buffer_m: f64,
}

impl SiteBoundary {
    /// Circular boundary around `center`.
    pub fn circle(
        name: impl Into<String>,
        center: GeoPoint,
        radius_m: f64,
        safety_buffer_m: f64,
    ) -> Result<Self, BoundaryError> {
        let name = name.into();
        if !center.is_valid() {
            return Err(BoundaryError::InvalidCoordinate(name));
        }
        check_distance(&name, "radius_m", radius_m)?;
        check_distance(&name, "safety_buffer_m", safety_buffer_m)?;
        Ok(Self {
            name,
            center,
            shape: BoundaryShape::Circle { radius_m },
            safety_buffer_m,
        })
    }

    /// Polygonal boundary. The ring may be given open or closed.
    ///
    /// When `center` is `None` the vertex centroid is used for nearest lookups.
    pub fn polygon(
        name: impl Into<String>,
        vertices: Vec<GeoPoint>,
        safety_buffer_m: f64,
        center: Option<GeoPoint>,
    ) -> Result<Self, BoundaryError> {
        let name = name.into();
        check_distance(&name, "safety_buffer_m", safety_buffer_m)?;
        if vertices.iter().any(|v| !v.is_valid()) {
            return Err(BoundaryError::InvalidCoordinate(name));
        }

        let mut ring: Vec<GeoPoint> = Vec::with_capacity(vertices.len());
        for vertex in vertices {
            if ring.last() != Some(&vertex) {
                ring.push(vertex);
            }
        }
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 3 {
            return Err(BoundaryError::TooFewVertices {
                name,
                count: ring.len(),
            });
        }
        if ring_self_intersects(&ring) {
            return Err(BoundaryError::SelfIntersecting(name));
        }
        if ring_area_m2(&ring) < MIN_RING_AREA_M2 {
            return Err(BoundaryError::ZeroArea(name));
        }

        let center = match center {
            Some(point) if point.is_valid() => point,
            Some(_) => return Err(BoundaryError::InvalidCoordinate(name)),
            None => centroid(&ring),
        };

        Ok(Self {
            name,
            center,
            shape: BoundaryShape::Polygon { vertices: ring },
            safety_buffer_m,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn shape(&self) -> &BoundaryShape {
        &self.shape
    }

    pub fn safety_buffer_m(&self) -> f64 {
        self.safety_buffer_m
    }

    /// Whether a point falls inside the zone or its safety buffer.
    pub fn is_inside(&self, point: GeoPoint) -> bool {
        match &self.shape {
            BoundaryShape::Circle { radius_m } => {
                self.center.distance_m(&point) <= radius_m + self.safety_buffer_m
            }
            BoundaryShape::Polygon { vertices } => {
                ring_contains(vertices, point)
                    || distance_to_ring_m(vertices, point) <= self.safety_buffer_m
            }
        }
    }

    /// Distance from a point to the zone edge (ignoring the buffer); 0 inside.
    pub fn distance_to_edge_m(&self, point: GeoPoint) -> f64 {
        match &self.shape {
            BoundaryShape::Circle { radius_m } => {
                (self.center.distance_m(&point) - radius_m).max(0.0)
            }
            BoundaryShape::Polygon { vertices } => {
                if ring_contains(vertices, point) {
                    0.0
                } else {
                    distance_to_ring_m(vertices, point)
                }
            }
        }
    }
}

impl TryFrom<SiteBoundaryRecord> for SiteBoundary {
    type Error = BoundaryError;

    fn try_from(record: SiteBoundaryRecord) -> Result<Self, Self::Error> {
        let center = match (record.center_lat, record.center_lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            (None, None) => None,
            _ => return Err(BoundaryError::InvalidCoordinate(record.name)),
        };

        match (record.radius_m, record.polygon_vertices) {
            (Some(radius_m), None) => {
                let Some(center) = center else {
                    return Err(BoundaryError::InvalidCoordinate(record.name));
                };
                SiteBoundary::circle(record.name, center, radius_m, record.safety_buffer_m)
            }
            (None, Some(vertices)) => SiteBoundary::polygon(
                record.name,
                vertices
                    .into_iter()
                    .map(|[lat, lon]| GeoPoint::new(lat, lon))
                    .collect(),
                record.safety_buffer_m,
                center,
            ),
            _ => Err(BoundaryError::AmbiguousShape(record.name)),
        }
    }
}

impl From<SiteBoundary> for SiteBoundaryRecord {
    fn from(boundary: SiteBoundary) -> Self {
        let (radius_m, polygon_vertices) = match boundary.shape {
            BoundaryShape::Circle { radius_m } => (Some(radius_m), None),
            BoundaryShape::Polygon { vertices } => (
                None,
                Some(vertices.iter().map(|v| [v.lat, v.lon]).collect()),
            ),
        };
        SiteBoundaryRecord {
            name: boundary.name,
            center_lat: Some(boundary.center.lat),
            center_lon: Some(boundary.center.lon),
            radius_m,
            polygon_vertices,
            safety_buffer_m: boundary.safety_buffer_m,
        }
    }
}

fn check_distance(name: &str, field: &'static str, value: f64) -> Result<(), BoundaryError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(BoundaryError::InvalidDistance {
            name: name.to_string(),
            field,
            value,
        })
    }
}

fn centroid(ring: &[GeoPoint]) -> GeoPoint {
    let n = ring.len() as f64;
    let (lat_sum, lon_sum) = ring
        .iter()
        .fold((0.0, 0.0), |(lat, lon), v| (lat + v.lat, lon + v.lon));
    GeoPoint::new(lat_sum / n, lon_sum / n)
}

/// Even-odd ray cast over an open ring of vertices.
fn ring_contains(ring: &[GeoPoint], point: GeoPoint) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (yi, xi) = (ring[i].lat, ring[i].lon);
        let (yj, xj) = (ring[j].lat, ring[j].lon);

        if ((yi > point.lat) != (yj > point.lat))
            && (point.lon < (xj - xi) * (point.lat - yi) / (yj - yi) + xi)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

fn ring_edges(ring: &[GeoPoint]) -> impl Iterator<Item = (GeoPoint, GeoPoint)> + '_ {
    ring.iter()
        .enumerate()
        .map(move |(i, start)| (*start, ring[(i + 1) % ring.len()]))
}

fn distance_to_ring_m(ring: &[GeoPoint], point: GeoPoint) -> f64 {
    ring_edges(ring)
        .map(|(a, b)| spatial::distance_to_segment_m(point.lat, point.lon, a.lat, a.lon, b.lat, b.lon))
        .fold(f64::INFINITY, f64::min)
}

fn project_ring(ring: &[GeoPoint]) -> Vec<(f64, f64)> {
    let origin = ring[0];
    ring.iter()
        .map(|v| spatial::to_local_xy(v.lat, v.lon, origin.lat, origin.lon))
        .collect()
}

/// Shoelace area of the ring in the local tangent plane.
fn ring_area_m2(ring: &[GeoPoint]) -> f64 {
    let projected = project_ring(ring);
    let n = projected.len();
    let twice_area: f64 = (0..n)
        .map(|i| {
            let (x1, y1) = projected[i];
            let (x2, y2) = projected[(i + 1) % n];
            x1 * y2 - x2 * y1
        })
        .sum();
    (twice_area / 2.0).abs()
}

fn ring_self_intersects(ring: &[GeoPoint]) -> bool {
    let projected = project_ring(ring);
    let n = projected.len();

    for i in 0..n {
        let a1 = projected[i];
        let a2 = projected[(i + 1) % n];
        for j in (i + 1)..n {
            // Adjacent edges share a vertex by construction
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let b1 = projected[j];
            let b2 = projected[(j + 1) % n];
            if spatial::segments_intersect_2d(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

/// Name-keyed table of protected sites.
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    sites: BTreeMap<String, SiteBoundary>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the built-in known sites.
    pub fn with_known_sites() -> Self {
        let mut registry = Self::new();
        for (name, lat, lon, radius_m) in KNOWN_SITES {
            let result = SiteBoundary::circle(
                name,
                GeoPoint::new(lat, lon),
                radius_m,
                DEFAULT_SAFETY_BUFFER_M,
            )
            .and_then(|boundary| registry.insert(boundary));
            if let Err(err) = result {
                tracing::error!("Skipping built-in site '{}': {}", name, err);
            }
        }
        registry
    }

    pub fn insert(&mut self, boundary: SiteBoundary) -> Result<(), BoundaryError> {
        if self.sites.contains_key(boundary.name()) {
            return Err(BoundaryError::DuplicateSite(boundary.name.clone()));
        }
        tracing::debug!("Registered site boundary '{}'", boundary.name());
        self.sites.insert(boundary.name.clone(), boundary);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SiteBoundary> {
        self.sites.get(name)
    }

    /// Nearest site whose center lies within `radius_km` of `point`.
    pub fn find_nearest(&self, point: GeoPoint, radius_km: f64) -> Option<&SiteBoundary> {
        let radius_m = radius_km * 1000.0;
        let mut best: Option<(&SiteBoundary, f64)> = None;
        for site in self.sites.values() {
            let distance = site.center.distance_m(&point);
            if distance > radius_m {
                continue;
            }
            if best.map_or(true, |(_, best_distance)| distance < best_distance) {
                best = Some((site, distance));
            }
        }
        best.map(|(site, _)| site)
    }

    /// Every site whose zone (including buffer) contains the point.
    pub fn containing(&self, point: GeoPoint) -> Vec<&SiteBoundary> {
        self.sites
            .values()
            .filter(|site| site.is_inside(point))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SiteBoundary> {
        self.sites.values()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// Shared built-in registry.
pub fn known_sites() -> &'static SiteRegistry {
    static REGISTRY: OnceLock<SiteRegistry> = OnceLock::new();
    REGISTRY.get_or_init(SiteRegistry::with_known_sites)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(51.66, 5.70),
            GeoPoint::new(51.66, 5.72),
            GeoPoint::new(51.68, 5.72),
            GeoPoint::new(51.68, 5.70),
        ]
    }

    #[test]
    fn test_circle_buffer_edge() {
        let boundary =
            SiteBoundary::circle("Test Base", GeoPoint::new(51.6564, 5.7083), 1000.0, 200.0)
                .unwrap();
        // ~1100 m north: inside the buffer
        assert!(boundary.is_inside(GeoPoint::new(51.6663, 5.7083)));
        // ~1300 m north: outside
        assert!(!boundary.is_inside(GeoPoint::new(51.6681, 5.7083)));
        assert!(boundary.is_inside(boundary.center()));
    }

    #[test]
    fn test_polygon_containment_and_buffer() {
        let boundary = SiteBoundary::polygon("Square", square(), 100.0, None).unwrap();
        assert!(boundary.is_inside(GeoPoint::new(51.67, 5.71)));
        assert!(!boundary.is_inside(GeoPoint::new(51.65, 5.69)));
        assert!(!boundary.is_inside(GeoPoint::new(51.69, 5.73)));

        // 50 m south of the southern edge is within the 100 m buffer
        let just_outside = GeoPoint::new(51.66 - spatial::meters_to_lat(50.0, 51.66), 5.71);
        assert!(boundary.is_inside(just_outside));
        let further = GeoPoint::new(51.66 - spatial::meters_to_lat(150.0, 51.66), 5.71);
        assert!(!boundary.is_inside(further));
    }

    #[test]
    fn test_polygon_closing_vertex_dropped_and_centroid() {
        let mut closed = square();
        closed.push(GeoPoint::new(51.66, 5.70));
        let boundary = SiteBoundary::polygon("Closed", closed, 0.0, None).unwrap();
        match boundary.shape() {
            BoundaryShape::Polygon { vertices } => assert_eq!(vertices.len(), 4),
            other => panic!("unexpected shape {other:?}"),
        }
        assert!((boundary.center().lat - 51.67).abs() < 1e-9);
        assert!((boundary.center().lon - 5.71).abs() < 1e-9);
    }

    #[test]
    fn test_polygon_rejects_degenerate_rings() {
        let err = SiteBoundary::polygon(
            "Line",
            vec![GeoPoint::new(51.0, 5.0), GeoPoint::new(51.1, 5.0)],
            0.0,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, BoundaryError::TooFewVertices { count: 2, .. }));

        let bowtie = vec![
            GeoPoint::new(51.66, 5.70),
            GeoPoint::new(51.68, 5.72),
            GeoPoint::new(51.66, 5.72),
            GeoPoint::new(51.68, 5.70),
        ];
        assert_eq!(
            SiteBoundary::polygon("Bowtie", bowtie, 0.0, None).unwrap_err(),
            BoundaryError::SelfIntersecting("Bowtie".to_string())
        );

        let collinear = vec![
            GeoPoint::new(51.0, 5.0),
            GeoPoint::new(51.01, 5.0),
            GeoPoint::new(51.02, 5.0),
        ];
        assert_eq!(
            SiteBoundary::polygon("Fence", collinear, 50.0, None).unwrap_err(),
            BoundaryError::ZeroArea("Fence".to_string())
        );
    }

    #[test]
    fn test_record_requires_exactly_one_shape() {
        let neither = SiteBoundaryRecord {
            name: "Nothing".into(),
            center_lat: Some(51.0),
            center_lon: Some(5.0),
            radius_m: None,
            polygon_vertices: None,
            safety_buffer_m: 200.0,
        };
        assert!(matches!(
            SiteBoundary::try_from(neither),
            Err(BoundaryError::AmbiguousShape(_))
        ));

        let both = SiteBoundaryRecord {
            name: "Both".into(),
            center_lat: Some(51.0),
            center_lon: Some(5.0),
            radius_m: Some(100.0),
            polygon_vertices: Some(vec![[51.0, 5.0], [51.1, 5.0], [51.1, 5.1]]),
            safety_buffer_m: 200.0,
        };
        assert!(matches!(
            SiteBoundary::try_from(both),
            Err(BoundaryError::AmbiguousShape(_))
        ));
    }

    #[test]
    fn test_boundary_json_rejects_invalid_shape() {
        let parsed: Result<SiteBoundary, _> =
            serde_json::from_str(r#"{"name": "Bad", "center_lat": 51.0, "center_lon": 5.0}"#);
        assert!(parsed.is_err());

        let parsed: SiteBoundary = serde_json::from_str(
            r#"{"name": "Ok", "center_lat": 51.0, "center_lon": 5.0, "radius_m": 300}"#,
        )
        .unwrap();
        assert_eq!(parsed.safety_buffer_m(), DEFAULT_SAFETY_BUFFER_M);
    }

    #[test]
    fn test_negative_radius_rejected() {
        let err = SiteBoundary::circle("Neg", GeoPoint::new(51.0, 5.0), -5.0, 0.0).unwrap_err();
        assert!(matches!(
            err,
            BoundaryError::InvalidDistance {
                field: "radius_m",
                ..
            }
        ));
    }

    #[test]
    fn test_registry_lookup() {
        let registry = SiteRegistry::with_known_sites();
        assert_eq!(registry.len(), 3);

        let volkel = registry
            .find_nearest(GeoPoint::new(51.6564, 5.7083), 5.0)
            .unwrap();
        assert_eq!(volkel.name(), "Volkel Air Base");
        assert!(registry.get("Schiphol Airport").is_some());
        assert!(registry.find_nearest(GeoPoint::new(52.0, 3.0), 5.0).is_none());
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = SiteRegistry::with_known_sites();
        let duplicate =
            SiteBoundary::circle("Volkel Air Base", GeoPoint::new(51.0, 5.0), 100.0, 0.0).unwrap();
        assert_eq!(
            registry.insert(duplicate),
            Err(BoundaryError::DuplicateSite("Volkel Air Base".to_string()))
        );
    }

    #[test]
    fn test_distance_to_edge() {
        let boundary =
            SiteBoundary::circle("Edge", GeoPoint::new(51.0, 5.0), 1000.0, 200.0).unwrap();
        let point = GeoPoint::new(51.0, 5.0).destination(1500.0, 90.0);
        assert!((boundary.distance_to_edge_m(point) - 500.0).abs() < 0.01);
        assert_eq!(boundary.distance_to_edge_m(GeoPoint::new(51.0, 5.0)), 0.0);
    }
}
