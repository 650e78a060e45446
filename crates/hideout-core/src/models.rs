//! Core data models for hideout prediction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ScoringStrategy;
use crate::spatial;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and within latitude/longitude range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        spatial::haversine_distance(self.lat, self.lon, other.lat, other.lon)
    }

    /// Initial bearing towards `other`, degrees in `[0, 360)`.
    pub fn bearing_to_deg(&self, other: &GeoPoint) -> f64 {
        spatial::initial_bearing_deg(self.lat, self.lon, other.lat, other.lon)
    }

    pub fn destination(&self, distance_m: f64, bearing_deg: f64) -> GeoPoint {
        let (lat, lon) = spatial::destination_point(self.lat, self.lon, distance_m, bearing_deg);
        GeoPoint { lat, lon }
    }
}

/// Day/night context of the incident.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    #[default]
    Day,
    Night,
}

impl TimeOfDay {
    /// Lenient label parsing; anything other than "night" is treated as day.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("night") {
            TimeOfDay::Night
        } else {
            TimeOfDay::Day
        }
    }

    pub fn is_night(self) -> bool {
        matches!(self, TimeOfDay::Night)
    }
}

fn default_source_type() -> String {
    "unknown".to_string()
}

fn neutral_score() -> f64 {
    0.5
}

/// An intelligence item attached to an incident (witness statement, sensor hit, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    #[serde(default = "default_source_type")]
    pub source_type: String,
    /// How trustworthy the source is (0-1)
    #[serde(default = "neutral_score")]
    pub credibility_score: f64,
    /// How specific the item is about location (0-1)
    #[serde(default = "neutral_score")]
    pub locality_score: f64,
}

impl EvidenceItem {
    pub fn new(source_type: impl Into<String>, credibility_score: f64, locality_score: f64) -> Self {
        Self {
            source_type: source_type.into(),
            credibility_score,
            locality_score,
        }
    }
}

/// Input to a single prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(default)]
    pub incident_id: Option<i64>,
    pub target_lat: f64,
    pub target_lon: f64,
    /// e.g. "military", "airport", "infrastructure"
    #[serde(default)]
    pub site_type: Option<String>,
    #[serde(default)]
    pub drone_type: Option<String>,
    /// Compass label or full name, e.g. "NE" or "north-east"
    #[serde(default)]
    pub approach_vector: Option<String>,
    #[serde(default)]
    pub exit_vector: Option<String>,
    #[serde(default)]
    pub time_of_day: TimeOfDay,
    #[serde(default)]
    pub evidence_items: Vec<EvidenceItem>,
}

impl PredictionRequest {
    pub fn new(target_lat: f64, target_lon: f64) -> Self {
        Self {
            incident_id: None,
            target_lat,
            target_lon,
            site_type: None,
            drone_type: None,
            approach_vector: None,
            exit_vector: None,
            time_of_day: TimeOfDay::Day,
            evidence_items: Vec::new(),
        }
    }

    pub fn target(&self) -> GeoPoint {
        GeoPoint::new(self.target_lat, self.target_lon)
    }
}

/// A raw candidate position generated around the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateSite {
    pub latitude: f64,
    pub longitude: f64,
    /// Generation distance from target
    pub distance_km: f64,
    /// Generation bearing from target
    pub bearing_deg: f64,
    /// Position in the generation sequence, used as a stable tie-break
    pub generation_index: usize,
}

impl CandidateSite {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Per-factor scores of a candidate, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub cover: f64,
    pub concealment: f64,
    pub exfil: f64,
    pub range: f64,
    pub los: f64,
    pub vector_alignment: f64,
    pub locality_consistency: f64,
    /// 1.0 outside the operational perimeter, 0.0 inside
    pub opsec: f64,
}

impl ScoreComponents {
    /// Named view of every component, in a fixed order.
    pub fn named(&self) -> [(&'static str, f64); 8] {
        [
            ("cover", self.cover),
            ("concealment", self.concealment),
            ("exfil", self.exfil),
            ("range", self.range),
            ("los", self.los),
            ("vector_alignment", self.vector_alignment),
            ("locality_consistency", self.locality_consistency),
            ("opsec", self.opsec),
        ]
    }

    pub fn all_within_unit(&self) -> bool {
        self.named()
            .iter()
            .all(|(_, value)| value.is_finite() && (0.0..=1.0).contains(value))
    }
}

/// Dominant concealment category at a hotspot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverType {
    Forest,
    UrbanBuilding,
    OpenField,
    ParkingLot,
    RuralStructure,
    Unknown,
}

impl CoverType {
    pub fn as_str(self) -> &'static str {
        match self {
            CoverType::Forest => "forest",
            CoverType::UrbanBuilding => "urban_building",
            CoverType::OpenField => "open_field",
            CoverType::ParkingLot => "parking_lot",
            CoverType::RuralStructure => "rural_structure",
            CoverType::Unknown => "unknown",
        }
    }
}

/// Coarse label derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainSuitability {
    Excellent,
    Good,
    Moderate,
    Poor,
    Unsuitable,
}

impl TerrainSuitability {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.80 {
            TerrainSuitability::Excellent
        } else if score >= 0.65 {
            TerrainSuitability::Good
        } else if score >= 0.45 {
            TerrainSuitability::Moderate
        } else if score >= 0.25 {
            TerrainSuitability::Poor
        } else {
            TerrainSuitability::Unsuitable
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TerrainSuitability::Excellent => "excellent",
            TerrainSuitability::Good => "good",
            TerrainSuitability::Moderate => "moderate",
            TerrainSuitability::Poor => "poor",
            TerrainSuitability::Unsuitable => "unsuitable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            ConfidenceLevel::High
        } else if score >= 0.55 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceLevel::High => "HIGH",
            ConfidenceLevel::Medium => "MEDIUM",
            ConfidenceLevel::Low => "LOW",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceResult {
    pub level: ConfidenceLevel,
    pub score: f64,
    pub reasoning: String,
}

/// A ranked, scored candidate operator location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    /// 1-based position in the ranked output
    pub rank: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_to_target_m: f64,
    /// Generation distance from target
    pub distance_km: f64,
    /// Generation bearing from target
    pub bearing_deg: f64,
    pub scores: ScoreComponents,
    pub total_score: f64,
    pub confidence: ConfidenceResult,
    pub cover_type: CoverType,
    pub terrain_suitability: TerrainSuitability,
    #[serde(default)]
    pub landuse: Option<String>,
    #[serde(default)]
    pub nearest_road_type: Option<String>,
    #[serde(default)]
    pub nearest_road_distance_m: Option<f64>,
    pub reasoning: String,
    pub generation_index: usize,
}

impl Hotspot {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Aggregate locality signal from the evidence items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalityCues {
    pub avg_locality: f64,
    pub local_mentions: usize,
    pub reasoning: String,
}

/// Agreement between the approach and exit vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorConsistency {
    pub consistency_score: f64,
    #[serde(default)]
    pub angular_difference_deg: Option<f64>,
    pub reasoning: String,
}

/// Full result of one prediction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorAnalysis {
    #[serde(default)]
    pub incident_id: Option<i64>,
    pub target_latitude: f64,
    pub target_longitude: f64,
    pub predicted_hotspots: Vec<Hotspot>,
    pub analyzed_at: DateTime<Utc>,
    pub search_radius_m: f64,
    pub perimeter_radius_m: f64,
    #[serde(default)]
    pub site_type: Option<String>,
    #[serde(default)]
    pub site_boundary: Option<String>,
    pub drone_type: String,
    #[serde(default)]
    pub approach_vector: Option<String>,
    #[serde(default)]
    pub exit_vector: Option<String>,
    pub time_of_day: TimeOfDay,
    pub strategy: ScoringStrategy,
    pub evidence_weight: f64,
    pub locality: LocalityCues,
    pub vector_consistency: VectorConsistency,
    pub witness_confidence: f64,
    pub candidates_generated: usize,
    pub candidates_filtered: usize,
    /// Degradations and fallbacks applied while scoring
    #[serde(default)]
    pub notes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(51.6564, 5.7083).is_valid());
        assert!(!GeoPoint::new(91.0, 5.0).is_valid());
        assert!(!GeoPoint::new(51.0, -181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 5.0).is_valid());
    }

    #[test]
    fn test_suitability_thresholds() {
        assert_eq!(TerrainSuitability::from_score(0.85), TerrainSuitability::Excellent);
        assert_eq!(TerrainSuitability::from_score(0.80), TerrainSuitability::Excellent);
        assert_eq!(TerrainSuitability::from_score(0.70), TerrainSuitability::Good);
        assert_eq!(TerrainSuitability::from_score(0.50), TerrainSuitability::Moderate);
        assert_eq!(TerrainSuitability::from_score(0.30), TerrainSuitability::Poor);
        assert_eq!(TerrainSuitability::from_score(0.10), TerrainSuitability::Unsuitable);
    }

    #[test]
    fn test_time_of_day_label() {
        assert_eq!(TimeOfDay::from_label(" NIGHT "), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_label("dusk"), TimeOfDay::Day);
    }

    #[test]
    fn test_evidence_item_defaults() {
        let item: EvidenceItem = serde_json::from_str("{}").unwrap();
        assert_eq!(item.source_type, "unknown");
        assert_eq!(item.credibility_score, 0.5);
        assert_eq!(item.locality_score, 0.5);
    }

    #[test]
    fn test_prediction_request_minimal_json() {
        let request: PredictionRequest = serde_json::from_str(
            r#"{"target_lat": 51.6564, "target_lon": 5.7083, "time_of_day": "night"}"#,
        )
        .unwrap();
        assert_eq!(request.time_of_day, TimeOfDay::Night);
        assert!(request.evidence_items.is_empty());
        assert!(request.drone_type.is_none());
    }

    #[test]
    fn test_components_unit_check() {
        let mut components = ScoreComponents {
            cover: 0.5,
            concealment: 0.5,
            exfil: 0.5,
            range: 0.5,
            los: 0.5,
            vector_alignment: 0.5,
            locality_consistency: 0.5,
            opsec: 1.0,
        };
        assert!(components.all_within_unit());
        components.range = 1.2;
        assert!(!components.all_within_unit());
    }
}
