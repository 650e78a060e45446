//! Elevation from an Open-Meteo compatible HTTP service.
//!
//! Land use and roads still come from the synthetic model; only the elevation
//! grid is replaced with real samples. Failures surface as [`TerrainError`]
//! and [`TerrainIntel`] answers them with synthetic terrain.

use std::sync::Arc;
use std::time::Duration;

use hideout_core::terrain::{ElevationGrid, GridLayout};
use hideout_core::{
    GeoPoint, RegionSource, SyntheticTerrain, TerrainError, TerrainIntel, TerrainProvider,
    TerrainRegion,
};
use reqwest::Client;
use serde::Deserialize;
use tokio::runtime::Handle;

use crate::backoff::Backoff;
use crate::config::Config;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct OpenMeteoElevationResponse {
    elevation: Option<Vec<f64>>,
}

pub struct RemoteElevationProvider {
    client: Client,
    runtime: Handle,
    base_url: String,
    timeout: Duration,
    retries: u32,
    max_points_per_request: usize,
    sample_spacing_m: f64,
    max_grid_points: usize,
}

impl RemoteElevationProvider {
    /// Must be created inside a Tokio runtime; requests are driven on it.
    pub fn from_config(config: &Config) -> Result<Self, TerrainError> {
        if config.terrain_provider_url.trim().is_empty() {
            return Err(TerrainError::Request("terrain provider URL is empty".to_string()));
        }
        let runtime = Handle::try_current()
            .map_err(|err| TerrainError::Request(format!("no async runtime: {err}")))?;
        let client = Client::builder()
            .timeout(config.terrain_timeout())
            .build()
            .map_err(|err| TerrainError::Request(err.to_string()))?;

        Ok(Self {
            client,
            runtime,
            base_url: config.terrain_provider_url.trim().to_string(),
            timeout: config.terrain_timeout(),
            retries: config.terrain_retries,
            max_points_per_request: config.terrain_max_points_per_request.max(1),
            sample_spacing_m: config.terrain_sample_spacing_m,
            max_grid_points: config.terrain_max_grid_points.max(4),
        })
    }

    /// Wall-clock limit for one region: every allowed attempt at the request
    /// timeout plus the longest backoff between them.
    fn fetch_budget(&self) -> Duration {
        self.timeout * (self.retries + 1) + RETRY_MAX_DELAY * self.retries
    }

    async fn fetch_region_elevations(&self, points: &[GeoPoint]) -> Result<Vec<f64>, TerrainError> {
        let budget = self.fetch_budget();
        tokio::time::timeout(budget, self.fetch_elevations(points))
            .await
            .map_err(|_| TerrainError::Timeout(budget))?
    }

    /// Retries are shared by every chunk of the region.
    async fn fetch_elevations(&self, points: &[GeoPoint]) -> Result<Vec<f64>, TerrainError> {
        let mut elevations = Vec::with_capacity(points.len());
        let mut backoff = Backoff::new(RETRY_BASE_DELAY, RETRY_MAX_DELAY);
        let mut retries_used = 0;

        for chunk in points.chunks(self.max_points_per_request) {
            let latitudes: Vec<f64> = chunk.iter().map(|p| p.lat).collect();
            let longitudes: Vec<f64> = chunk.iter().map(|p| p.lon).collect();
            let url = build_provider_url(
                &self.base_url,
                &join_params(&latitudes),
                &join_params(&longitudes),
            );

            let values = loop {
                match self.fetch_chunk(&url, chunk.len()).await {
                    Ok(values) => break values,
                    Err(err) if retries_used < self.retries => {
                        retries_used += 1;
                        let delay = backoff.next_delay();
                        tracing::warn!(
                            "Elevation request failed (retry {}/{}), retrying in {:?}: {}",
                            retries_used,
                            self.retries,
                            delay,
                            err
                        );
                        tokio::time::sleep(delay).await;
                    }
                    Err(err) => return Err(err),
                }
            };
            elevations.extend(values);
        }

        Ok(elevations)
    }

    async fn fetch_chunk(&self, url: &str, expected: usize) -> Result<Vec<f64>, TerrainError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| TerrainError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(TerrainError::Http(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|err| TerrainError::Request(err.to_string()))?;
        parse_elevation_response(&body, expected)
    }
}

impl TerrainProvider for RemoteElevationProvider {
    fn name(&self) -> &str {
        "open-meteo"
    }

    /// Blocks on the HTTP requests; call from a blocking thread.
    fn load_region(&self, center: GeoPoint, radius_km: f64) -> Result<TerrainRegion, TerrainError> {
        let mut region = SyntheticTerrain.load_region(center, radius_km)?;
        let layout = GridLayout::resolve(
            region.elevation.layout().bounds,
            self.sample_spacing_m,
            self.max_grid_points,
        );
        let points = layout.points();
        tracing::debug!(
            "Fetching {} elevation samples around ({:.4}, {:.4})",
            points.len(),
            center.lat,
            center.lon
        );

        let elevations = self.runtime.block_on(self.fetch_region_elevations(&points))?;
        region.elevation = ElevationGrid::from_samples(layout, elevations)?;
        region.source = RegionSource::Remote;
        Ok(region)
    }
}

/// Terrain intelligence for the server: remote elevation when configured,
/// synthetic otherwise, with the configured cache limits.
pub fn build_terrain_intel(config: &Config) -> TerrainIntel {
    let intel = if config.terrain_provider_url.is_empty() {
        tracing::info!("No elevation provider configured, using synthetic terrain");
        TerrainIntel::synthetic()
    } else {
        match RemoteElevationProvider::from_config(config) {
            Ok(provider) => {
                tracing::info!("Using elevation provider at {}", config.terrain_provider_url);
                TerrainIntel::new(Arc::new(provider))
            }
            Err(err) => {
                tracing::warn!("Elevation provider unavailable, using synthetic terrain: {}", err);
                TerrainIntel::synthetic()
            }
        }
    };
    intel.with_cache(config.terrain_cache_ttl(), config.terrain_cache_max_entries)
}

fn parse_elevation_response(body: &str, expected: usize) -> Result<Vec<f64>, TerrainError> {
    let payload: OpenMeteoElevationResponse =
        serde_json::from_str(body).map_err(|err| TerrainError::Malformed(err.to_string()))?;
    let elevation = payload
        .elevation
        .ok_or_else(|| TerrainError::Malformed("missing elevation".to_string()))?;
    if elevation.len() != expected {
        return Err(TerrainError::SampleCount {
            expected,
            actual: elevation.len(),
        });
    }
    Ok(elevation)
}

fn join_params(values: &[f64]) -> String {
    values
        .iter()
        .map(|value| format!("{value:.6}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn build_provider_url(base: &str, latitudes: &str, longitudes: &str) -> String {
    let separator = if base.contains('?') { "&" } else { "?" };
    format!("{base}{separator}latitude={latitudes}&longitude={longitudes}")
}
