//! Server configuration from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use hideout_core::{EngineConfig, ScoringStrategy};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub scoring_strategy: ScoringStrategy,
    pub search_radius_m: f64,
    pub perimeter_radius_m: f64,
    /// Elevation service base URL; empty means synthetic terrain only.
    pub terrain_provider_url: String,
    pub terrain_request_timeout_s: u64,
    pub terrain_retries: u32,
    pub terrain_max_points_per_request: usize,
    pub terrain_sample_spacing_m: f64,
    pub terrain_max_grid_points: usize,
    pub terrain_cache_ttl_s: u64,
    pub terrain_cache_max_entries: usize,
}

impl Default for Config {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            server_port: 3000,
            scoring_strategy: engine.strategy,
            search_radius_m: engine.search_radius_m,
            perimeter_radius_m: engine.perimeter_radius_m,
            terrain_provider_url: String::new(),
            terrain_request_timeout_s: 5,
            terrain_retries: 2,
            terrain_max_points_per_request: 100,
            terrain_sample_spacing_m: 250.0,
            terrain_max_grid_points: 1024,
            terrain_cache_ttl_s: 3600,
            terrain_cache_max_entries: 256,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("HIDEOUT_PORT", defaults.server_port),
            scoring_strategy: env_or("HIDEOUT_SCORING_STRATEGY", defaults.scoring_strategy),
            search_radius_m: env_or("HIDEOUT_SEARCH_RADIUS_M", defaults.search_radius_m),
            perimeter_radius_m: env_or("HIDEOUT_PERIMETER_RADIUS_M", defaults.perimeter_radius_m),
            terrain_provider_url: env::var("HIDEOUT_TERRAIN_PROVIDER_URL")
                .map(|url| url.trim().to_string())
                .unwrap_or_default(),
            terrain_request_timeout_s: env_or(
                "HIDEOUT_TERRAIN_TIMEOUT_S",
                defaults.terrain_request_timeout_s,
            ),
            terrain_retries: env_or("HIDEOUT_TERRAIN_RETRIES", defaults.terrain_retries),
            terrain_max_points_per_request: env_or(
                "HIDEOUT_TERRAIN_MAX_POINTS_PER_REQUEST",
                defaults.terrain_max_points_per_request,
            ),
            terrain_sample_spacing_m: env_or(
                "HIDEOUT_TERRAIN_SAMPLE_SPACING_M",
                defaults.terrain_sample_spacing_m,
            ),
            terrain_max_grid_points: env_or(
                "HIDEOUT_TERRAIN_MAX_GRID_POINTS",
                defaults.terrain_max_grid_points,
            ),
            terrain_cache_ttl_s: env_or("HIDEOUT_TERRAIN_CACHE_TTL_S", defaults.terrain_cache_ttl_s),
            terrain_cache_max_entries: env_or(
                "HIDEOUT_TERRAIN_CACHE_MAX_ENTRIES",
                defaults.terrain_cache_max_entries,
            ),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            strategy: self.scoring_strategy,
            search_radius_m: self.search_radius_m,
            perimeter_radius_m: self.perimeter_radius_m,
            ..EngineConfig::default()
        }
    }

    pub fn terrain_timeout(&self) -> Duration {
        Duration::from_secs(self.terrain_request_timeout_s.max(1))
    }

    pub fn terrain_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.terrain_cache_ttl_s.max(30))
    }
}
