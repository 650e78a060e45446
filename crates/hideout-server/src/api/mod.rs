//! HTTP API for hideout prediction.

pub mod analysis;
pub mod request_id;
pub mod sites;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/v1/operator-analysis", post(analysis::create_operator_analysis))
        .route("/v1/sites", get(sites::list_sites))
        .route("/v1/sites/nearest", get(sites::nearest_site))
        .route("/v1/sites/check", get(sites::check_point))
        .route("/v1/sites/:name", get(sites::get_site))
        .layer(middleware::from_fn(request_id::ensure_request_id))
}
