//! Confidence classification of scored hotspots.

use crate::models::{ConfidenceLevel, ConfidenceResult, Hotspot, ScoreComponents};

const STRONG_FACTOR: f64 = 0.7;
const WEAK_FACTOR: f64 = 0.4;

/// (label, weight) of each factor in the confidence blend.
const CONFIDENCE_WEIGHTS: [(&str, f64); 6] = [
    ("cover", 0.25),
    ("exfil", 0.20),
    ("range", 0.15),
    ("line-of-sight", 0.15),
    ("evidence", 0.15),
    ("vector alignment", 0.10),
];

fn factors(components: &ScoreComponents, evidence_weight: f64) -> [(&'static str, f64); 6] {
    let values = [
        components.cover,
        components.exfil,
        components.range,
        components.los,
        evidence_weight.clamp(0.0, 1.0),
        components.vector_alignment,
    ];
    let mut out = [("", 0.0); 6];
    for (slot, ((label, _), value)) in out.iter_mut().zip(CONFIDENCE_WEIGHTS.iter().zip(values)) {
        *slot = (*label, value);
    }
    out
}

/// Blend the key factors into a HIGH / MEDIUM / LOW label.
///
/// The reasoning names up to two strongest and two weakest factors.
pub fn compute_confidence(components: &ScoreComponents, evidence_weight: f64) -> ConfidenceResult {
    let factors = factors(components, evidence_weight);
    let score = factors
        .iter()
        .zip(CONFIDENCE_WEIGHTS.iter())
        .map(|((_, value), (_, weight))| value * weight)
        .sum::<f64>()
        .clamp(0.0, 1.0);
    let level = ConfidenceLevel::from_score(score);

    // Stable sort keeps the fixed factor order on ties
    let mut ranked = factors.to_vec();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut strengths: Vec<&str> = ranked
        .iter()
        .filter(|(_, value)| *value >= STRONG_FACTOR)
        .take(2)
        .map(|(label, _)| *label)
        .collect();
    if strengths.is_empty() {
        strengths.extend(ranked.first().map(|(label, _)| *label));
    }

    let mut weaknesses: Vec<&str> = ranked
        .iter()
        .rev()
        .filter(|(_, value)| *value < WEAK_FACTOR)
        .take(2)
        .map(|(label, _)| *label)
        .collect();
    if weaknesses.is_empty() {
        weaknesses.extend(
            ranked
                .last()
                .map(|(label, _)| *label)
                .filter(|label| !strengths.contains(label)),
        );
    }

    let mut reasoning = format!("strongest: {}", strengths.join(", "));
    if !weaknesses.is_empty() {
        reasoning.push_str(&format!("; weakest: {}", weaknesses.join(", ")));
    }

    ConfidenceResult {
        level,
        score,
        reasoning,
    }
}

/// Order hotspots by confidence level, then confidence score, highest first.
pub fn rank_by_confidence(hotspots: &mut [Hotspot]) {
    hotspots.sort_by(|a, b| {
        b.confidence
            .level
            .cmp(&a.confidence.level)
            .then_with(|| b.confidence.score.total_cmp(&a.confidence.score))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(value: f64) -> ScoreComponents {
        ScoreComponents {
            cover: value,
            concealment: value,
            exfil: value,
            range: value,
            los: value,
            vector_alignment: value,
            locality_consistency: value,
            opsec: 1.0,
        }
    }

    #[test]
    fn test_levels_follow_thresholds() {
        assert_eq!(compute_confidence(&components(0.9), 0.9).level, ConfidenceLevel::High);
        assert_eq!(compute_confidence(&components(0.6), 0.6).level, ConfidenceLevel::Medium);
        assert_eq!(compute_confidence(&components(0.3), 0.3).level, ConfidenceLevel::Low);
    }

    #[test]
    fn test_score_is_weighted_blend() {
        let mut c = components(0.5);
        c.cover = 1.0;
        let result = compute_confidence(&c, 0.0);
        let expected = 0.25 * 1.0 + 0.20 * 0.5 + 0.15 * 0.5 + 0.15 * 0.5 + 0.15 * 0.0 + 0.10 * 0.5;
        assert!((result.score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_reasoning_names_extremes() {
        let mut c = components(0.5);
        c.cover = 0.95;
        c.exfil = 0.9;
        c.los = 0.1;
        let result = compute_confidence(&c, 0.2);
        assert!(result.reasoning.contains("strongest: cover, exfil"));
        assert!(result.reasoning.contains("weakest: line-of-sight, evidence"));
    }

    #[test]
    fn test_flat_scores_still_name_factors() {
        let result = compute_confidence(&components(0.5), 0.5);
        assert!(result.reasoning.starts_with("strongest: cover"));
        assert!(result.reasoning.contains("weakest: vector alignment"));
    }
}
