//! OSINT fusion: reported directions, evidence quality and confidence.

pub mod confidence;
pub mod evidence;
pub mod vector;

pub use confidence::{compute_confidence, rank_by_confidence};
pub use evidence::{
    compute_evidence_weight, compute_witness_confidence, extract_locality_cues, EvidenceWeight,
};
pub use vector::{
    compute_vector_consistency, parse_direction, score_exit_alignment, score_vector_alignment,
    VectorAlignment, NEUTRAL_ALIGNMENT,
};
