//! Evidence weighting, locality cues and witness corroboration.

use std::collections::BTreeSet;

use crate::models::{EvidenceItem, LocalityCues};

const DIVERSITY_WEIGHT: f64 = 0.2;
const DIVERSITY_MIN_DENOMINATOR: usize = 5;
const HIGH_LOCALITY: f64 = 0.7;
const WITNESS_SOURCES: [&str; 2] = ["witness_statement", "witness"];

/// Aggregate weight of an incident's evidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvidenceWeight {
    pub total_weight: f64,
    pub avg_credibility: f64,
    pub source_diversity: f64,
    pub num_sources: usize,
}

fn unit_or_neutral(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.5
    }
}

fn source_key(item: &EvidenceItem) -> String {
    let key = item.source_type.trim().to_ascii_lowercase();
    if key.is_empty() {
        "unknown".to_string()
    } else {
        key
    }
}

/// Diminishing returns for corroborating sources.
pub fn count_factor(count: usize) -> f64 {
    match count {
        0 => 0.0,
        1 => 0.70,
        2..=3 => 0.85,
        4..=5 => 0.95,
        _ => 1.0,
    }
}

/// Credibility × corroboration × diversity, clamped to `[0, 1]`.
///
/// No evidence weighs exactly zero.
pub fn compute_evidence_weight(items: &[EvidenceItem]) -> EvidenceWeight {
    if items.is_empty() {
        return EvidenceWeight {
            total_weight: 0.0,
            avg_credibility: 0.0,
            source_diversity: 0.0,
            num_sources: 0,
        };
    }

    let count = items.len();
    let avg_credibility = items
        .iter()
        .map(|item| unit_or_neutral(item.credibility_score))
        .sum::<f64>()
        / count as f64;

    let distinct: BTreeSet<String> = items.iter().map(source_key).collect();
    let source_diversity = distinct.len() as f64 / count.max(DIVERSITY_MIN_DENOMINATOR) as f64;

    let total_weight = (avg_credibility * count_factor(count) * (1.0 + DIVERSITY_WEIGHT * source_diversity))
        .clamp(0.0, 1.0);

    EvidenceWeight {
        total_weight,
        avg_credibility,
        source_diversity,
        num_sources: count,
    }
}

/// Average locality of the evidence; 0.5 when there is none.
pub fn extract_locality_cues(items: &[EvidenceItem]) -> LocalityCues {
    if items.is_empty() {
        return LocalityCues {
            avg_locality: 0.5,
            local_mentions: 0,
            reasoning: "No locality data".to_string(),
        };
    }

    let scores: Vec<f64> = items
        .iter()
        .map(|item| unit_or_neutral(item.locality_score))
        .collect();
    let avg_locality = scores.iter().sum::<f64>() / scores.len() as f64;
    let local_mentions = scores.iter().filter(|score| **score > HIGH_LOCALITY).count();

    LocalityCues {
        avg_locality,
        local_mentions,
        reasoning: format!(
            "{} of {} sources highly local (avg locality {:.2})",
            local_mentions,
            items.len(),
            avg_locality
        ),
    }
}

/// Corroboration from eyewitnesses; 0.5 when there are none.
pub fn compute_witness_confidence(items: &[EvidenceItem]) -> f64 {
    let witnesses: Vec<f64> = items
        .iter()
        .filter(|item| WITNESS_SOURCES.contains(&source_key(item).as_str()))
        .map(|item| unit_or_neutral(item.credibility_score))
        .collect();

    if witnesses.is_empty() {
        return 0.5;
    }

    let mut confidence = witnesses.iter().sum::<f64>() / witnesses.len() as f64;
    if witnesses.len() >= 3 {
        confidence += 0.15;
    } else if witnesses.len() >= 2 {
        confidence += 0.10;
    }
    confidence.min(1.0)
}
