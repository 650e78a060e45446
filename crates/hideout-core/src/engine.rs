//! Hideout prediction engine.
//!
//! One call to [`HideoutEngine::predict`] generates the candidate grid around
//! the target, vetoes every candidate inside the nearest protected site,
//! scores the survivors and returns the best few as ranked hotspots.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::behaviour::{
    compute_composite_score, compute_range_score, opsec_gate, DroneType, RangeProfile, ScoringError,
};
use crate::boundary::{known_sites, SiteBoundary, SiteRegistry};
use crate::candidates::generate_candidates;
use crate::config::{EngineConfig, ScoringStrategy};
use crate::models::{
    CandidateSite, CoverType, GeoPoint, Hotspot, OperatorAnalysis, PredictionRequest,
    ScoreComponents, TerrainSuitability, TimeOfDay,
};
use crate::osint::{
    compute_confidence, compute_evidence_weight, compute_vector_consistency,
    compute_witness_confidence, extract_locality_cues, parse_direction, score_exit_alignment,
    score_vector_alignment, NEUTRAL_ALIGNMENT,
};
use crate::terrain::cover::assess_cover;
use crate::terrain::exfil::{compute_exfil_routes, score_exfil_routes};
use crate::terrain::los::compute_line_of_sight;
use crate::terrain::{TerrainError, TerrainIntel, TerrainRegion};

const NEUTRAL_TERRAIN_SCORE: f64 = 0.5;
const BASIC_NIGHT_CONCEALMENT_BONUS: f64 = 0.20;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid target coordinates ({lat}, {lon})")]
    InvalidTarget { lat: f64, lon: f64 },
    #[error("invalid engine configuration: {0}")]
    Config(#[from] ScoringError),
    #[error("terrain unavailable and basic fallback disabled: {0}")]
    TerrainUnavailable(#[from] TerrainError),
}

/// Per-request inputs shared by every candidate.
struct ScoringContext<'a> {
    target: GeoPoint,
    time_of_day: TimeOfDay,
    profile: RangeProfile,
    perimeter_m: f64,
    evidence_weight: f64,
    locality: f64,
    approach_vector: Option<&'a str>,
    exit_vector: Option<&'a str>,
    region: Option<&'a TerrainRegion>,
}

/// Terrain-derived part of a candidate's score.
struct TerrainScores {
    cover: f64,
    concealment: f64,
    exfil: f64,
    los: f64,
    cover_type: CoverType,
    landuse: Option<String>,
    nearest_road: Option<(String, f64)>,
}

/// Operator hideout predictor.
///
/// Holds no per-request state; the terrain cache is the only shared mutable
/// resource, so one engine can serve concurrent requests behind an `Arc`.
#[derive(Debug, Clone)]
pub struct HideoutEngine {
    config: EngineConfig,
    registry: Arc<SiteRegistry>,
    terrain: Arc<TerrainIntel>,
}

impl HideoutEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            registry: Arc::new(known_sites().clone()),
            terrain: Arc::new(TerrainIntel::synthetic()),
        })
    }

    pub fn with_registry(mut self, registry: Arc<SiteRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_terrain(mut self, terrain: Arc<TerrainIntel>) -> Self {
        self.terrain = terrain;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    pub fn terrain(&self) -> &TerrainIntel {
        &self.terrain
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<OperatorAnalysis, EngineError> {
        let target = request.target();
        if !target.is_valid() {
            return Err(EngineError::InvalidTarget {
                lat: request.target_lat,
                lon: request.target_lon,
            });
        }

        let mut notes = Vec::new();

        let boundary = self
            .registry
            .find_nearest(target, self.config.boundary_lookup_radius_km);
        if let Some(site) = boundary {
            tracing::info!(
                "Site boundary '{}' detected within {:.1} km of target",
                site.name(),
                self.config.boundary_lookup_radius_km
            );
        }

        let candidates = generate_candidates(target);
        let candidates_generated = candidates.len();
        let survivors: Vec<CandidateSite> = candidates
            .into_iter()
            .filter(|candidate| !boundary.is_some_and(|site| site.is_inside(candidate.point())))
            .collect();
        let candidates_filtered = candidates_generated - survivors.len();
        if let Some(site) = boundary {
            tracing::info!(
                "Filtered {} of {} candidates inside '{}'",
                candidates_filtered,
                candidates_generated,
                site.name()
            );
        }

        let drone_type = match request.drone_type.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => DroneType::parse(label).unwrap_or_else(|| {
                tracing::warn!("Unknown drone type '{}', using unknown profile", label);
                notes.push(format!("Unrecognized drone type '{label}'; unknown range profile used"));
                DroneType::Unknown
            }),
            _ => {
                notes.push("Drone type not reported; unknown range profile used".to_string());
                DroneType::Unknown
            }
        };

        self.note_vector(&mut notes, "approach", request.approach_vector.as_deref());
        self.note_vector(&mut notes, "exit", request.exit_vector.as_deref());

        let evidence = compute_evidence_weight(&request.evidence_items);
        if evidence.num_sources == 0 {
            notes.push("No evidence items; evidence weight 0.0".to_string());
        }
        let locality = extract_locality_cues(&request.evidence_items);
        let witness_confidence = compute_witness_confidence(&request.evidence_items);
        let vector_consistency = compute_vector_consistency(
            request.approach_vector.as_deref(),
            request.exit_vector.as_deref(),
        );
        let perimeter_m = self.config.perimeter_for_site(request.site_type.as_deref());

        let mut strategy = self.config.strategy;
        let region = match strategy {
            ScoringStrategy::Basic => None,
            ScoringStrategy::TerrainAware => {
                match self.terrain.region(target, self.config.search_radius_m / 1000.0) {
                    Ok(region) => Some(region),
                    Err(err) if self.config.allow_basic_fallback => {
                        tracing::warn!("Terrain unavailable, falling back to basic scoring: {}", err);
                        notes.push(format!("Terrain unavailable ({err}); basic scoring used"));
                        strategy = ScoringStrategy::Basic;
                        None
                    }
                    Err(err) => return Err(EngineError::TerrainUnavailable(err)),
                }
            }
        };

        let ctx = ScoringContext {
            target,
            time_of_day: request.time_of_day,
            profile: drone_type.profile(),
            perimeter_m,
            evidence_weight: evidence.total_weight,
            locality: locality.avg_locality,
            approach_vector: request.approach_vector.as_deref(),
            exit_vector: request.exit_vector.as_deref(),
            region: region.as_deref(),
        };

        let mut scored: Vec<Hotspot> = survivors
            .iter()
            .map(|candidate| self.score_candidate(&ctx, candidate, &notes))
            .collect();

        // Stable: equal scores keep generation order
        scored.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));

        if let Some(site) = boundary {
            enforce_boundary(&mut scored, site);
        }

        scored.truncate(self.config.max_hotspots);
        for (i, hotspot) in scored.iter_mut().enumerate() {
            hotspot.rank = i + 1;
            hotspot.reasoning = format!("Rank #{}: {}", hotspot.rank, hotspot.reasoning);
        }

        tracing::info!(
            "Predicted {} hotspots from {} scored candidates ({})",
            scored.len(),
            survivors.len(),
            strategy
        );

        Ok(OperatorAnalysis {
            incident_id: request.incident_id,
            target_latitude: target.lat,
            target_longitude: target.lon,
            predicted_hotspots: scored,
            analyzed_at: Utc::now(),
            search_radius_m: self.config.search_radius_m,
            perimeter_radius_m: perimeter_m,
            site_type: request.site_type.clone(),
            site_boundary: boundary.map(|site| site.name().to_string()),
            drone_type: drone_type.as_str().to_string(),
            approach_vector: request.approach_vector.clone(),
            exit_vector: request.exit_vector.clone(),
            time_of_day: request.time_of_day,
            strategy,
            evidence_weight: evidence.total_weight,
            locality,
            vector_consistency,
            witness_confidence,
            candidates_generated,
            candidates_filtered,
            notes,
        })
    }

    fn note_vector(&self, notes: &mut Vec<String>, kind: &str, direction: Option<&str>) {
        let Some(direction) = direction.map(str::trim).filter(|d| !d.is_empty()) else {
            return;
        };
        if parse_direction(direction).is_none() {
            tracing::warn!("Could not parse {} vector '{}'", kind, direction);
            notes.push(format!("Could not parse {kind} vector '{direction}'; alignment neutral"));
        }
    }

    fn score_candidate(
        &self,
        ctx: &ScoringContext<'_>,
        candidate: &CandidateSite,
        notes: &[String],
    ) -> Hotspot {
        let point = candidate.point();
        let distance_to_target_m = point.distance_m(&ctx.target);

        let terrain = match ctx.region {
            Some(region) => self.terrain_scores(region, point, ctx),
            None => basic_terrain_scores(ctx.time_of_day),
        };

        let conf = self.config.vector_confidence_weight;
        let approach = score_vector_alignment(point, ctx.target, ctx.approach_vector, conf);
        let exit = score_exit_alignment(point, ctx.target, ctx.exit_vector, conf);
        let vector_alignment = match (approach.parsed, exit.parsed) {
            (true, true) => (approach.alignment_score + exit.alignment_score) / 2.0,
            (true, false) => approach.alignment_score,
            (false, true) => exit.alignment_score,
            (false, false) => NEUTRAL_ALIGNMENT,
        };

        let scores = ScoreComponents {
            cover: terrain.cover,
            concealment: terrain.concealment,
            exfil: terrain.exfil,
            range: compute_range_score(distance_to_target_m, &ctx.profile),
            los: terrain.los,
            vector_alignment,
            locality_consistency: ctx.locality.clamp(0.0, 1.0),
            opsec: opsec_gate(distance_to_target_m, ctx.perimeter_m),
        };
        let total_score = compute_composite_score(&scores, &self.config.weights, ctx.time_of_day);
        let confidence = compute_confidence(&scores, ctx.evidence_weight);
        let terrain_suitability = TerrainSuitability::from_score(total_score);

        tracing::debug!(
            "Candidate {} ({:.0} m @ {:.0}°): total {:.3}",
            candidate.generation_index,
            distance_to_target_m,
            candidate.bearing_deg,
            total_score
        );

        let mut reasoning = describe(
            distance_to_target_m,
            &scores,
            terrain.cover_type,
            terrain_suitability,
            ctx.perimeter_m,
        );
        reasoning.push_str(&format!(
            " [{} confidence: {}]",
            confidence.level.as_str(),
            confidence.reasoning
        ));
        if !notes.is_empty() {
            reasoning.push_str(&format!(" Notes: {}.", notes.join("; ")));
        }

        let (nearest_road_type, nearest_road_distance_m) = match terrain.nearest_road {
            Some((kind, distance)) => (Some(kind), Some(distance)),
            None => (None, None),
        };

        Hotspot {
            rank: 0,
            latitude: candidate.latitude,
            longitude: candidate.longitude,
            distance_to_target_m,
            distance_km: candidate.distance_km,
            bearing_deg: candidate.bearing_deg,
            scores,
            total_score,
            confidence,
            cover_type: terrain.cover_type,
            terrain_suitability,
            landuse: terrain.landuse,
            nearest_road_type,
            nearest_road_distance_m,
            reasoning,
            generation_index: candidate.generation_index,
        }
    }

    fn terrain_scores(
        &self,
        region: &TerrainRegion,
        point: GeoPoint,
        ctx: &ScoringContext<'_>,
    ) -> TerrainScores {
        let cover = assess_cover(region, point, ctx.time_of_day);
        let routes = compute_exfil_routes(region, point);
        let los = compute_line_of_sight(region, point, ctx.target, self.config.los_samples);

        TerrainScores {
            cover: cover.cover,
            concealment: cover.concealment,
            exfil: score_exfil_routes(&routes),
            los: los.quality,
            cover_type: cover.cover_type,
            landuse: Some(cover.landuse.as_str().to_string()),
            nearest_road: routes
                .first()
                .map(|route| (route.kind.as_str().to_string(), route.distance_m)),
        }
    }
}

fn basic_terrain_scores(time_of_day: TimeOfDay) -> TerrainScores {
    let mut concealment = NEUTRAL_TERRAIN_SCORE;
    if time_of_day.is_night() {
        concealment += BASIC_NIGHT_CONCEALMENT_BONUS;
    }
    TerrainScores {
        cover: NEUTRAL_TERRAIN_SCORE,
        concealment,
        exfil: NEUTRAL_TERRAIN_SCORE,
        los: NEUTRAL_TERRAIN_SCORE,
        cover_type: CoverType::Unknown,
        landuse: None,
        nearest_road: None,
    }
}

/// Drop any hotspot inside the site. Reaching this is a bug in filtering.
fn enforce_boundary(hotspots: &mut Vec<Hotspot>, site: &SiteBoundary) {
    let before = hotspots.len();
    hotspots.retain(|hotspot| !site.is_inside(hotspot.point()));
    let violations = before - hotspots.len();
    if violations > 0 {
        tracing::warn!(
            "Removed {} scored hotspots inside '{}' after filtering",
            violations,
            site.name()
        );
    }
    debug_assert_eq!(violations, 0, "hotspot inside site boundary '{}'", site.name());
}

fn describe(
    distance_m: f64,
    scores: &ScoreComponents,
    cover_type: CoverType,
    suitability: TerrainSuitability,
    perimeter_m: f64,
) -> String {
    let mut reasons = Vec::new();

    let meters = distance_m.trunc() as i64;
    if distance_m < 500.0 {
        reasons.push(format!("Very close ({meters}m) - high risk"));
    } else if distance_m < 1500.0 {
        reasons.push(format!("Close range ({meters}m)"));
    } else if distance_m < 2500.0 {
        reasons.push(format!("Optimal distance ({meters}m)"));
    } else {
        reasons.push(format!("Long range ({meters}m)"));
    }

    if scores.opsec <= 0.0 {
        reasons.push(format!("inside {perimeter_m:.0}m OPSEC perimeter"));
    }

    let cover = cover_type.as_str();
    if scores.cover > 0.75 {
        reasons.push(format!("excellent {cover} cover"));
    } else if scores.cover > 0.55 {
        reasons.push(format!("good {cover} cover"));
    } else {
        reasons.push(format!("limited {cover} cover"));
    }

    if scores.exfil > 0.75 {
        reasons.push("good escape routes".to_string());
    } else if scores.exfil < 0.40 {
        reasons.push("limited escape routes".to_string());
    }

    if scores.los > 0.75 {
        reasons.push("clear line-of-sight".to_string());
    } else if scores.los < 0.40 {
        reasons.push("obstructed LOS".to_string());
    }

    if scores.vector_alignment > 0.75 {
        reasons.push("strong vector alignment".to_string());
    }

    reasons.push(format!("{} terrain", suitability.as_str()));
    format!("{}.", reasons.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TerrainProvider;

    struct FailingProvider;

    impl TerrainProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn load_region(&self, _center: GeoPoint, _radius_km: f64) -> Result<TerrainRegion, TerrainError> {
            Err(TerrainError::Request("connection refused".to_string()))
        }
    }

    fn failing_terrain() -> Arc<TerrainIntel> {
        Arc::new(TerrainIntel::new(Arc::new(FailingProvider)).without_fallback())
    }

    #[test]
    fn test_rejects_invalid_target() {
        let engine = HideoutEngine::new(EngineConfig::default()).unwrap();
        let err = engine.predict(&PredictionRequest::new(f64::NAN, 5.0)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTarget { .. }));
        let err = engine.predict(&PredictionRequest::new(91.0, 5.0)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTarget { .. }));
    }

    #[test]
    fn test_rejects_invalid_weights() {
        let mut config = EngineConfig::default();
        config.weights.cover = 0.5;
        assert!(matches!(
            HideoutEngine::new(config),
            Err(EngineError::Config(ScoringError::WeightSum(_)))
        ));
    }

    #[test]
    fn test_terrain_failure_falls_back_to_basic() {
        let engine = HideoutEngine::new(EngineConfig::default())
            .unwrap()
            .with_terrain(failing_terrain());
        let analysis = engine.predict(&PredictionRequest::new(51.6564, 5.7083)).unwrap();
        assert_eq!(analysis.strategy, ScoringStrategy::Basic);
        assert!(analysis.notes.iter().any(|n| n.contains("basic scoring used")));
        assert_eq!(analysis.predicted_hotspots.len(), 3);
        assert!(analysis
            .predicted_hotspots
            .iter()
            .all(|h| h.distance_to_target_m > 1700.0 && h.cover_type == CoverType::Unknown));
    }

    #[test]
    fn test_terrain_failure_without_fallback_errors() {
        let config = EngineConfig {
            allow_basic_fallback: false,
            ..EngineConfig::default()
        };
        let engine = HideoutEngine::new(config).unwrap().with_terrain(failing_terrain());
        let err = engine.predict(&PredictionRequest::new(51.6564, 5.7083)).unwrap_err();
        assert!(matches!(err, EngineError::TerrainUnavailable(_)));
    }

    #[test]
    fn test_basic_strategy_uses_neutral_terrain() {
        let config = EngineConfig {
            strategy: ScoringStrategy::Basic,
            ..EngineConfig::default()
        };
        let engine = HideoutEngine::new(config).unwrap();
        let mut request = PredictionRequest::new(51.6564, 5.7083);
        request.time_of_day = TimeOfDay::Night;
        let analysis = engine.predict(&request).unwrap();
        for hotspot in &analysis.predicted_hotspots {
            assert_eq!(hotspot.scores.cover, 0.5);
            assert!((hotspot.scores.concealment - 0.7).abs() < 1e-9);
            assert!(hotspot.nearest_road_type.is_none());
        }
    }

    #[test]
    fn test_degradations_are_noted() {
        let engine = HideoutEngine::new(EngineConfig::default()).unwrap();
        let mut request = PredictionRequest::new(51.6564, 5.7083);
        request.drone_type = Some("hovercraft".to_string());
        request.approach_vector = Some("overhead".to_string());
        let analysis = engine.predict(&request).unwrap();
        assert_eq!(analysis.drone_type, "unknown");
        assert!(analysis.notes.iter().any(|n| n.contains("hovercraft")));
        assert!(analysis.notes.iter().any(|n| n.contains("approach vector 'overhead'")));
        assert!(analysis.notes.iter().any(|n| n.contains("evidence weight 0.0")));
        let top = &analysis.predicted_hotspots[0];
        assert!(top.reasoning.starts_with("Rank #1: "));
        assert!(top.reasoning.contains("Notes:"));
        assert_eq!(top.scores.vector_alignment, 0.5);
    }

    #[test]
    fn test_describe_buckets() {
        let scores = ScoreComponents {
            cover: 0.9,
            concealment: 0.8,
            exfil: 0.3,
            range: 0.9,
            los: 0.8,
            vector_alignment: 0.9,
            locality_consistency: 0.5,
            opsec: 1.0,
        };
        let text = describe(
            2000.0,
            &scores,
            CoverType::Forest,
            TerrainSuitability::Good,
            500.0,
        );
        assert_eq!(
            text,
            "Optimal distance (2000m); excellent forest cover; limited escape routes; \
             clear line-of-sight; strong vector alignment; good terrain."
        );
    }

    #[test]
    fn test_describe_truncates_distance() {
        let scores = ScoreComponents {
            cover: 0.5,
            concealment: 0.5,
            exfil: 0.5,
            range: 0.5,
            los: 0.5,
            vector_alignment: 0.5,
            locality_consistency: 0.5,
            opsec: 0.0,
        };
        let text = describe(
            1999.6,
            &scores,
            CoverType::OpenField,
            TerrainSuitability::Poor,
            500.0,
        );
        assert!(text.starts_with("Optimal distance (1999m); inside 500m OPSEC perimeter;"), "{text}");
    }
}
