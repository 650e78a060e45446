//! Protected-site registry endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use hideout_core::{GeoPoint, SiteBoundary};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// List all known sites.
pub async fn list_sites(State(state): State<Arc<AppState>>) -> Json<Vec<SiteBoundary>> {
    Json(state.engine.registry().iter().cloned().collect())
}

/// Get a site by exact name.
pub async fn get_site(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<SiteBoundary>, StatusCode> {
    state
        .engine
        .registry()
        .get(&name)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Deserialize)]
pub struct NearestQuery {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: Option<f64>,
}

/// Nearest site whose center is within `radius_km` (default: the engine's lookup radius).
pub async fn nearest_site(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearestQuery>,
) -> Result<Json<SiteBoundary>, StatusCode> {
    let point = GeoPoint::new(query.lat, query.lon);
    let radius_km = query
        .radius_km
        .unwrap_or(state.engine.config().boundary_lookup_radius_km);
    if !point.is_valid() || !radius_km.is_finite() || radius_km < 0.0 {
        return Err(StatusCode::BAD_REQUEST);
    }
    state
        .engine
        .registry()
        .find_nearest(point, radius_km)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Deserialize)]
pub struct PointCheckQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Serialize)]
pub struct PointCheckResponse {
    pub inside: bool,
    pub site_names: Vec<String>,
}

/// Check whether a point falls inside any site (including its safety buffer).
pub async fn check_point(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PointCheckQuery>,
) -> Result<Json<PointCheckResponse>, StatusCode> {
    let point = GeoPoint::new(query.lat, query.lon);
    if !point.is_valid() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let site_names: Vec<String> = state
        .engine
        .registry()
        .containing(point)
        .into_iter()
        .map(|site| site.name().to_string())
        .collect();
    Ok(Json(PointCheckResponse {
        inside: !site_names.is_empty(),
        site_names,
    }))
}
