//! Approach/exit vector parsing and alignment scoring.

use crate::models::{GeoPoint, VectorConsistency};
use crate::spatial::angular_difference_deg;

pub const NEUTRAL_ALIGNMENT: f64 = 0.5;

const COMPASS_POINTS: [(&str, f64); 16] = [
    ("N", 0.0),
    ("NNE", 22.5),
    ("NE", 45.0),
    ("ENE", 67.5),
    ("E", 90.0),
    ("ESE", 112.5),
    ("SE", 135.0),
    ("SSE", 157.5),
    ("S", 180.0),
    ("SSW", 202.5),
    ("SW", 225.0),
    ("WSW", 247.5),
    ("W", 270.0),
    ("WNW", 292.5),
    ("NW", 315.0),
    ("NNW", 337.5),
];

const COMPASS_NAMES: [(&str, f64); 8] = [
    ("NORTH", 0.0),
    ("NORTHEAST", 45.0),
    ("EAST", 90.0),
    ("SOUTHEAST", 135.0),
    ("SOUTH", 180.0),
    ("SOUTHWEST", 225.0),
    ("WEST", 270.0),
    ("NORTHWEST", 315.0),
];

fn lookup(token: &str) -> Option<f64> {
    COMPASS_POINTS
        .iter()
        .chain(COMPASS_NAMES.iter())
        .find(|(label, _)| *label == token)
        .map(|(_, degrees)| *degrees)
}

/// Parse a direction such as `"NE"`, `"north-east"` or `"from the SW"` to degrees.
///
/// Words are matched whole, and adjacent words are joined first so that
/// `"north east"` reads as north-east rather than north.
pub fn parse_direction(input: &str) -> Option<f64> {
    let normalized = input.to_ascii_uppercase().replace(['-', '\''], "");
    let tokens: Vec<&str> = normalized
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|token| !token.is_empty())
        .collect();

    for (i, token) in tokens.iter().enumerate() {
        if let Some(next) = tokens.get(i + 1) {
            if let Some(degrees) = lookup(&format!("{token}{next}")) {
                return Some(degrees);
            }
        }
        if let Some(degrees) = lookup(token) {
            return Some(degrees);
        }
    }
    None
}

/// Piecewise mapping from angular difference to alignment in `[0, 1]`.
pub fn alignment_curve(diff_deg: f64) -> f64 {
    let diff = diff_deg.abs().min(180.0);
    if diff <= 30.0 {
        1.0
    } else if diff <= 60.0 {
        1.0 - (diff - 30.0) / 30.0 * 0.3
    } else if diff <= 90.0 {
        0.7 - (diff - 60.0) / 30.0 * 0.4
    } else {
        0.3 - (diff - 90.0) / 90.0 * 0.3
    }
}

/// Pull a raw alignment toward the neutral midpoint by `confidence`.
pub fn weight_alignment(raw: f64, confidence: f64) -> f64 {
    let confidence = confidence.clamp(0.0, 1.0);
    (NEUTRAL_ALIGNMENT + (raw - NEUTRAL_ALIGNMENT) * confidence).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorAlignment {
    pub alignment_score: f64,
    pub expected_bearing_deg: Option<f64>,
    pub actual_bearing_deg: Option<f64>,
    pub bearing_diff_deg: Option<f64>,
    /// Whether a direction was supplied and understood
    pub parsed: bool,
    pub reasoning: String,
}

impl VectorAlignment {
    fn neutral(reasoning: String) -> Self {
        Self {
            alignment_score: NEUTRAL_ALIGNMENT,
            expected_bearing_deg: None,
            actual_bearing_deg: None,
            bearing_diff_deg: None,
            parsed: false,
            reasoning,
        }
    }
}

/// Compare the hotspot→target bearing with a reported direction.
pub fn score_vector_alignment(
    hotspot: GeoPoint,
    target: GeoPoint,
    direction: Option<&str>,
    confidence: f64,
) -> VectorAlignment {
    let Some(raw_direction) = direction.map(str::trim).filter(|d| !d.is_empty()) else {
        return VectorAlignment::neutral("No vector data".to_string());
    };
    let Some(expected) = parse_direction(raw_direction) else {
        return VectorAlignment::neutral(format!("Could not parse direction '{raw_direction}'"));
    };

    let actual = hotspot.bearing_to_deg(&target);
    let diff = angular_difference_deg(expected, actual);
    let alignment_score = weight_alignment(alignment_curve(diff), confidence);

    let reasoning = if diff <= 30.0 {
        format!("Strong alignment with {raw_direction} vector ({diff:.0}° off)")
    } else if diff <= 60.0 {
        format!("Moderate alignment with {raw_direction} vector ({diff:.0}° off)")
    } else if diff <= 90.0 {
        format!("Weak alignment with {raw_direction} vector ({diff:.0}° off)")
    } else {
        format!("Opposes {raw_direction} vector ({diff:.0}° off)")
    };

    VectorAlignment {
        alignment_score,
        expected_bearing_deg: Some(expected),
        actual_bearing_deg: Some(actual),
        bearing_diff_deg: Some(diff),
        parsed: true,
        reasoning,
    }
}

/// Exit vectors are scored on the same curve as approach vectors.
pub fn score_exit_alignment(
    hotspot: GeoPoint,
    target: GeoPoint,
    exit_vector: Option<&str>,
    confidence: f64,
) -> VectorAlignment {
    score_vector_alignment(hotspot, target, exit_vector, confidence)
}

/// How well approach and exit agree; a diagnostic, not a scored component.
pub fn compute_vector_consistency(approach: Option<&str>, exit: Option<&str>) -> VectorConsistency {
    let parsed = (approach.and_then(parse_direction), exit.and_then(parse_direction));
    let (Some(approach_deg), Some(exit_deg)) = parsed else {
        return VectorConsistency {
            consistency_score: NEUTRAL_ALIGNMENT,
            angular_difference_deg: None,
            reasoning: "Insufficient vector data".to_string(),
        };
    };

    let diff = angular_difference_deg(approach_deg, exit_deg);
    let (consistency_score, reasoning) = if diff <= 45.0 {
        (1.0, "Approach and exit vectors consistent - same operator location likely")
    } else if diff <= 90.0 {
        (0.7, "Approach and exit vectors moderately consistent")
    } else if diff <= 135.0 {
        (0.4, "Approach and exit vectors diverge - operator may have moved")
    } else {
        (0.2, "Approach and exit vectors opposite - multiple operators or relocation")
    };

    VectorConsistency {
        consistency_score,
        angular_difference_deg: Some(diff),
        reasoning: reasoning.to_string(),
    }
}
