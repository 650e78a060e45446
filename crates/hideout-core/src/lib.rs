pub mod behaviour;
pub mod boundary;
pub mod candidates;
pub mod config;
pub mod engine;
pub mod models;
pub mod osint;
pub mod spatial;
pub mod terrain;

pub use behaviour::{
    apply_night_operation_rules, compute_composite_score, compute_range_score, opsec_gate,
    DroneType, RangeProfile, ScoringError,
};
pub use boundary::{known_sites, BoundaryError, BoundaryShape, SiteBoundary, SiteRegistry};
pub use candidates::generate_candidates;
pub use config::{EngineConfig, ScoreWeights, ScoringStrategy};
pub use engine::{EngineError, HideoutEngine};
pub use models::{
    CandidateSite, ConfidenceLevel, ConfidenceResult, CoverType, EvidenceItem, GeoPoint, Hotspot,
    LocalityCues, OperatorAnalysis, PredictionRequest, ScoreComponents, TerrainSuitability,
    TimeOfDay, VectorConsistency,
};
pub use spatial::haversine_distance;
pub use terrain::{
    Landuse, RegionSource, RoadKind, SyntheticTerrain, TerrainError, TerrainIntel, TerrainProvider,
    TerrainRegion,
};
