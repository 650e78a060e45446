//! Predict likely drone operator positions around an incident.
//!
//! Runs the engine locally unless `--url` points at a hideout server.

use std::time::Duration;

use clap::Parser;
use hideout_cli::{parse_evidence, predict_remote};
use hideout_core::osint::rank_by_confidence;
use hideout_core::{
    EngineConfig, EvidenceItem, HideoutEngine, PredictionRequest, ScoringStrategy, TimeOfDay,
};

/// Predict drone operator hideouts for an incident
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Target latitude
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Target longitude
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Site type hint (military/airport widen the OPSEC perimeter)
    #[arg(long)]
    site_type: Option<String>,

    /// Drone category, e.g. consumer_dji, racing_fpv, military_small
    #[arg(long)]
    drone_type: Option<String>,

    /// Reported approach direction, e.g. NE or north-east
    #[arg(long)]
    approach: Option<String>,

    /// Reported exit direction
    #[arg(long)]
    exit: Option<String>,

    /// Incident happened at night
    #[arg(long)]
    night: bool,

    /// Evidence as source_type:credibility[:locality] (repeatable)
    #[arg(long, value_parser = parse_evidence)]
    evidence: Vec<EvidenceItem>,

    /// Scoring strategy (basic or terrain-aware)
    #[arg(long, default_value = "terrain-aware")]
    strategy: ScoringStrategy,

    /// List hotspots by confidence level instead of composite rank
    #[arg(long)]
    by_confidence: bool,

    /// Hideout server URL; runs locally when omitted
    #[arg(long)]
    url: Option<String>,

    /// Server request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let request = PredictionRequest {
        site_type: args.site_type,
        drone_type: args.drone_type,
        approach_vector: args.approach,
        exit_vector: args.exit,
        time_of_day: if args.night {
            TimeOfDay::Night
        } else {
            TimeOfDay::Day
        },
        evidence_items: args.evidence,
        ..PredictionRequest::new(args.lat, args.lon)
    };

    let mut analysis = match args.url {
        Some(url) => {
            tracing::info!("Requesting analysis from {}", url);
            predict_remote(&url, &request, Duration::from_secs(args.timeout))?
        }
        None => {
            let engine = HideoutEngine::new(EngineConfig {
                strategy: args.strategy,
                ..EngineConfig::default()
            })?;
            engine.predict(&request)?
        }
    };

    if args.by_confidence {
        rank_by_confidence(&mut analysis.predicted_hotspots);
    }

    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
