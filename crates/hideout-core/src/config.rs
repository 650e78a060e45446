//! Engine configuration and scoring weights.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::behaviour::ScoringError;
use crate::models::ScoreComponents;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// How candidates are scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// Geometry and evidence only; terrain factors are neutral.
    Basic,
    /// Full terrain intelligence: cover, concealment, line-of-sight, exfil.
    #[default]
    TerrainAware,
}

impl ScoringStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoringStrategy::Basic => "basic",
            ScoringStrategy::TerrainAware => "terrain_aware",
        }
    }
}

impl fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "basic" => Ok(ScoringStrategy::Basic),
            "terrain_aware" | "terrain" => Ok(ScoringStrategy::TerrainAware),
            other => Err(format!("unknown scoring strategy '{other}'")),
        }
    }
}

/// Composite score weights. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub cover: f64,
    pub concealment: f64,
    pub exfil: f64,
    pub range: f64,
    pub los: f64,
    pub vector_alignment: f64,
    pub locality_consistency: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            cover: 0.20,
            concealment: 0.15,
            exfil: 0.15,
            range: 0.15,
            los: 0.10,
            vector_alignment: 0.15,
            locality_consistency: 0.10,
        }
    }
}

impl ScoreWeights {
    fn values(&self) -> [f64; 7] {
        [
            self.cover,
            self.concealment,
            self.exfil,
            self.range,
            self.los,
            self.vector_alignment,
            self.locality_consistency,
        ]
    }

    pub fn sum(&self) -> f64 {
        self.values().iter().sum()
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        if let Some(bad) = self
            .values()
            .into_iter()
            .find(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(ScoringError::InvalidWeight(bad));
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoringError::WeightSum(sum));
        }
        Ok(())
    }

    /// Weighted sum of the seven scored components (OPSEC gate excluded).
    pub fn weighted_sum(&self, components: &ScoreComponents) -> f64 {
        components.cover * self.cover
            + components.concealment * self.concealment
            + components.exfil * self.exfil
            + components.range * self.range
            + components.los * self.los
            + components.vector_alignment * self.vector_alignment
            + components.locality_consistency * self.locality_consistency
    }
}

/// Configuration for a [`crate::engine::HideoutEngine`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Radius of the terrain region loaded around the target (meters)
    pub search_radius_m: f64,
    /// OPSEC gate perimeter for ordinary sites (meters)
    pub perimeter_radius_m: f64,
    /// OPSEC gate perimeter for military sites and airports (meters)
    pub high_security_perimeter_m: f64,
    /// Radius for the nearest-boundary lookup around the target (km)
    pub boundary_lookup_radius_km: f64,
    pub max_hotspots: usize,
    /// Confidence applied to vector alignment (0 = ignore vectors, 1 = trust fully)
    pub vector_confidence_weight: f64,
    /// Samples along the operator-target path for line-of-sight
    pub los_samples: usize,
    pub strategy: ScoringStrategy,
    pub weights: ScoreWeights,
    /// Degrade to basic scoring when terrain cannot be loaded
    pub allow_basic_fallback: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_radius_m: 4000.0,
            perimeter_radius_m: 500.0,
            high_security_perimeter_m: 1000.0,
            boundary_lookup_radius_km: 5.0,
            max_hotspots: 3,
            vector_confidence_weight: 0.8,
            los_samples: 10,
            strategy: ScoringStrategy::TerrainAware,
            weights: ScoreWeights::default(),
            allow_basic_fallback: true,
        }
    }
}

impl EngineConfig {
    /// Perimeter used by the OPSEC gate for the given site type.
    pub fn perimeter_for_site(&self, site_type: Option<&str>) -> f64 {
        match site_type.map(|s| s.trim().to_ascii_lowercase()) {
            Some(kind) if kind == "military" || kind == "airport" => {
                self.high_security_perimeter_m
            }
            _ => self.perimeter_radius_m,
        }
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        self.weights.validate()?;
        for (field, value) in [
            ("search_radius_m", self.search_radius_m),
            ("perimeter_radius_m", self.perimeter_radius_m),
            ("high_security_perimeter_m", self.high_security_perimeter_m),
            ("boundary_lookup_radius_km", self.boundary_lookup_radius_km),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ScoringError::InvalidParameter { field, value });
            }
        }
        if !(0.0..=1.0).contains(&self.vector_confidence_weight) {
            return Err(ScoringError::InvalidParameter {
                field: "vector_confidence_weight",
                value: self.vector_confidence_weight,
            });
        }
        Ok(())
    }
}
