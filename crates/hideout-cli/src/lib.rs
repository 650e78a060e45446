//! Hideout CLI - command line front end for operator hideout prediction.
//!
//! Predictions run in-process by default, or against a running
//! `hideout-server` when a URL is given.

use std::time::Duration;

use hideout_core::{EvidenceItem, OperatorAnalysis, PredictionRequest};
use thiserror::Error;

const NEUTRAL_LOCALITY: f64 = 0.5;

#[derive(Debug, Error, PartialEq)]
pub enum EvidenceParseError {
    #[error("evidence '{0}' must look like source_type:credibility[:locality]")]
    Format(String),
    #[error("evidence '{input}' has invalid {field} '{value}'")]
    Score {
        input: String,
        field: &'static str,
        value: String,
    },
}

fn parse_score(input: &str, field: &'static str, value: &str) -> Result<f64, EvidenceParseError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|score| (0.0..=1.0).contains(score))
        .ok_or_else(|| EvidenceParseError::Score {
            input: input.to_string(),
            field,
            value: value.to_string(),
        })
}

/// Parse `source_type:credibility[:locality]`, e.g. `witness_statement:0.9:0.8`.
pub fn parse_evidence(input: &str) -> Result<EvidenceItem, EvidenceParseError> {
    let parts: Vec<&str> = input.split(':').collect();
    let (source, credibility, locality) = match parts.as_slice() {
        [source, credibility] => (*source, *credibility, None),
        [source, credibility, locality] => (*source, *credibility, Some(*locality)),
        _ => return Err(EvidenceParseError::Format(input.to_string())),
    };
    if source.trim().is_empty() {
        return Err(EvidenceParseError::Format(input.to_string()));
    }

    let credibility = parse_score(input, "credibility", credibility)?;
    let locality = match locality {
        Some(value) => parse_score(input, "locality", value)?,
        None => NEUTRAL_LOCALITY,
    };
    Ok(EvidenceItem::new(source.trim(), credibility, locality))
}

/// POST a request to a running server's analysis endpoint.
pub fn predict_remote(
    base_url: &str,
    request: &PredictionRequest,
    timeout: Duration,
) -> anyhow::Result<OperatorAnalysis> {
    let url = format!("{}/v1/operator-analysis", base_url.trim_end_matches('/'));
    tracing::debug!("POST {}", url);
    let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
    let response = client.post(&url).json(request).send()?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        anyhow::bail!("server returned {}: {}", status, body);
    }
    Ok(response.json()?)
}
