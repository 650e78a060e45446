//! Drone range and operator behaviour model.
//!
//! Maps a drone category to a range profile, scores operator distance against
//! it, and combines the per-factor scores into the composite used for ranking.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ScoreWeights;
use crate::models::{ScoreComponents, TimeOfDay};

const NIGHT_CONCEALMENT_FACTOR: f64 = 0.15;
const NIGHT_LOW_COVER_BONUS: f64 = 0.10;
const NIGHT_LOW_COVER_THRESHOLD: f64 = 0.5;

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("score weight {0} is negative or not finite")]
    InvalidWeight(f64),
    #[error("score weights must sum to 1.0, got {0:.6}")]
    WeightSum(f64),
    #[error("invalid engine parameter {field}: {value}")]
    InvalidParameter { field: &'static str, value: f64 },
}

/// Drone categories with distinct operating ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroneType {
    ConsumerDji,
    ConsumerOther,
    RacingFpv,
    MilitarySmall,
    MilitaryMedium,
    DiyCustom,
    Commercial,
    Unknown,
}

/// How the operator controls the aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMethod {
    Radio,
    Fpv,
    EncryptedRadio,
    Satellite,
    Custom,
}

/// Operating range envelope of a drone category, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeProfile {
    pub min_range_m: f64,
    pub optimal_range_m: f64,
    pub max_range_m: f64,
    pub control_method: ControlMethod,
}

impl DroneType {
    /// Resolve a free-form drone type label.
    ///
    /// Returns `None` for labels that match no category; callers fall back
    /// to [`DroneType::Unknown`] and note the degradation.
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let drone = match normalized.as_str() {
            "consumer_dji" | "dji" | "consumer" => DroneType::ConsumerDji,
            "consumer_other" => DroneType::ConsumerOther,
            "racing_fpv" | "racing" | "fpv" => DroneType::RacingFpv,
            "military_small" => DroneType::MilitarySmall,
            "military_medium" | "military" => DroneType::MilitaryMedium,
            "diy_custom" | "diy" | "custom" => DroneType::DiyCustom,
            "commercial" => DroneType::Commercial,
            "unknown" => DroneType::Unknown,
            _ => return None,
        };
        Some(drone)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DroneType::ConsumerDji => "consumer_dji",
            DroneType::ConsumerOther => "consumer_other",
            DroneType::RacingFpv => "racing_fpv",
            DroneType::MilitarySmall => "military_small",
            DroneType::MilitaryMedium => "military_medium",
            DroneType::DiyCustom => "diy_custom",
            DroneType::Commercial => "commercial",
            DroneType::Unknown => "unknown",
        }
    }

    pub fn profile(self) -> RangeProfile {
        let (min, opt, max, control) = match self {
            DroneType::ConsumerDji => (100.0, 800.0, 4000.0, ControlMethod::Radio),
            DroneType::ConsumerOther => (100.0, 600.0, 3000.0, ControlMethod::Radio),
            DroneType::RacingFpv => (50.0, 400.0, 2000.0, ControlMethod::Fpv),
            DroneType::MilitarySmall => (200.0, 2000.0, 10000.0, ControlMethod::EncryptedRadio),
            DroneType::MilitaryMedium => (500.0, 5000.0, 25000.0, ControlMethod::Satellite),
            DroneType::DiyCustom => (100.0, 1000.0, 5000.0, ControlMethod::Custom),
            DroneType::Commercial => (100.0, 1500.0, 8000.0, ControlMethod::Radio),
            DroneType::Unknown => (100.0, 1000.0, 4000.0, ControlMethod::Radio),
        };
        RangeProfile {
            min_range_m: min,
            optimal_range_m: opt,
            max_range_m: max,
            control_method: control,
        }
    }
}

/// Score how plausible an operator distance is for a range profile.
///
/// Ramps 0 → 0.3 up to `min_range`, 0.3 → 1.0 up to `optimal_range`,
/// decays 1.0 → 0.3 up to `max_range`, then keeps decaying toward 0.
pub fn compute_range_score(distance_m: f64, profile: &RangeProfile) -> f64 {
    let RangeProfile {
        min_range_m: min,
        optimal_range_m: opt,
        max_range_m: max,
        ..
    } = *profile;

    if !distance_m.is_finite() || distance_m <= 0.0 {
        return 0.0;
    }

    let score = if distance_m < min {
        0.3 * (distance_m / min)
    } else if distance_m <= opt {
        0.3 + 0.7 * ((distance_m - min) / (opt - min).max(f64::EPSILON))
    } else if distance_m <= max {
        1.0 - 0.7 * ((distance_m - opt) / (max - opt).max(f64::EPSILON))
    } else {
        0.3 - ((distance_m - max) / max) * 0.3
    };

    score.clamp(0.0, 1.0)
}

/// Darkness substitutes for physical cover: boost with concealment at night.
pub fn apply_night_operation_rules(
    score: f64,
    time_of_day: TimeOfDay,
    cover_score: f64,
    concealment_score: f64,
) -> f64 {
    if !time_of_day.is_night() {
        return score;
    }

    let mut adjusted = score + NIGHT_CONCEALMENT_FACTOR * concealment_score;
    if cover_score < NIGHT_LOW_COVER_THRESHOLD {
        adjusted += NIGHT_LOW_COVER_BONUS;
    }
    adjusted.min(1.0)
}

/// 1.0 when the candidate is outside the operational perimeter, else 0.0.
pub fn opsec_gate(distance_to_target_m: f64, perimeter_m: f64) -> f64 {
    if distance_to_target_m < perimeter_m {
        0.0
    } else {
        1.0
    }
}

/// Weighted composite of the components, gated by OPSEC, then adjusted for night.
pub fn compute_composite_score(
    components: &ScoreComponents,
    weights: &ScoreWeights,
    time_of_day: TimeOfDay,
) -> f64 {
    let gated = weights.weighted_sum(components) * components.opsec;
    apply_night_operation_rules(gated, time_of_day, components.cover, components.concealment)
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(opsec: f64) -> ScoreComponents {
        ScoreComponents {
            cover: 0.4,
            concealment: 0.6,
            exfil: 0.5,
            range: 0.8,
            los: 0.7,
            vector_alignment: 0.5,
            locality_consistency: 0.5,
            opsec,
        }
    }

    #[test]
    fn test_range_curve_anchor_points() {
        let profile = DroneType::Unknown.profile();
        assert!((compute_range_score(50.0, &profile) - 0.15).abs() < 1e-9);
        assert!((compute_range_score(100.0, &profile) - 0.3).abs() < 1e-9);
        assert!((compute_range_score(1000.0, &profile) - 1.0).abs() < 1e-9);
        assert!((compute_range_score(4000.0, &profile) - 0.3).abs() < 1e-9);
        assert!((compute_range_score(6000.0, &profile) - 0.15).abs() < 1e-9);
        assert_eq!(compute_range_score(50_000.0, &profile), 0.0);
    }

    #[test]
    fn test_range_score_bounded_for_all_profiles() {
        let drones = [
            DroneType::ConsumerDji,
            DroneType::ConsumerOther,
            DroneType::RacingFpv,
            DroneType::MilitarySmall,
            DroneType::MilitaryMedium,
            DroneType::DiyCustom,
            DroneType::Commercial,
            DroneType::Unknown,
        ];
        for drone in drones {
            let profile = drone.profile();
            for distance in [0.0, 10.0, 200.0, 1500.0, 4000.0, 30_000.0] {
                let score = compute_range_score(distance, &profile);
                assert!((0.0..=1.0).contains(&score), "{drone:?} at {distance}: {score}");
            }
        }
    }

    #[test]
    fn test_drone_type_parsing() {
        assert_eq!(DroneType::parse("Consumer-DJI"), Some(DroneType::ConsumerDji));
        assert_eq!(DroneType::parse("racing fpv"), Some(DroneType::RacingFpv));
        assert_eq!(DroneType::parse("military_small"), Some(DroneType::MilitarySmall));
        assert_eq!(DroneType::parse("hovercraft"), None);
    }

    #[test]
    fn test_night_adjustment_only_at_night() {
        assert_eq!(apply_night_operation_rules(0.5, TimeOfDay::Day, 0.2, 0.8), 0.5);
        let night = apply_night_operation_rules(0.5, TimeOfDay::Night, 0.2, 0.8);
        assert!((night - (0.5 + 0.12 + 0.10)).abs() < 1e-9);
        let covered = apply_night_operation_rules(0.5, TimeOfDay::Night, 0.9, 0.8);
        assert!((covered - 0.62).abs() < 1e-9);
        assert_eq!(apply_night_operation_rules(0.95, TimeOfDay::Night, 0.1, 1.0), 1.0);
    }

    #[test]
    fn test_opsec_gate() {
        assert_eq!(opsec_gate(499.0, 500.0), 0.0);
        assert_eq!(opsec_gate(500.0, 500.0), 1.0);
        assert_eq!(opsec_gate(2000.0, 1000.0), 1.0);
    }

    #[test]
    fn test_composite_night_adjusts_gated_total() {
        let weights = ScoreWeights::default();
        assert_eq!(
            compute_composite_score(&components(0.0), &weights, TimeOfDay::Day),
            0.0
        );
        // 0.15 * 0.6 concealment + 0.10 for cover below 0.5
        let night = compute_composite_score(&components(0.0), &weights, TimeOfDay::Night);
        assert!((night - 0.19).abs() < 1e-9, "{night}");
        let open = compute_composite_score(&components(1.0), &weights, TimeOfDay::Day);
        assert!((open - weights.weighted_sum(&components(1.0))).abs() < 1e-12);
    }
}
