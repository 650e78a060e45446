//! Operator hideout analysis endpoint.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use hideout_core::{EngineError, OperatorAnalysis, PredictionRequest};
use serde_json::{json, Value};

use crate::api::request_id::RequestId;
use crate::state::AppState;

type ApiError = (StatusCode, Json<Value>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

/// Run a prediction for one incident.
///
/// Scoring is CPU-bound and may block on the elevation provider, so it runs
/// on the blocking pool.
pub async fn create_operator_analysis(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<OperatorAnalysis>, ApiError> {
    if !request.target().is_valid() {
        return Err(error(
            StatusCode::BAD_REQUEST,
            format!(
                "target coordinates ({}, {}) are out of range",
                request.target_lat, request.target_lon
            ),
        ));
    }

    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || engine.predict(&request))
        .await
        .map_err(|err| {
            tracing::error!("Prediction task {} failed: {}", request_id, err);
            error(StatusCode::INTERNAL_SERVER_ERROR, "prediction failed")
        })?;

    match result {
        Ok(analysis) => {
            tracing::info!(
                "Operator analysis {} for ({:.4}, {:.4}): {} hotspots, {} candidates filtered",
                request_id,
                analysis.target_latitude,
                analysis.target_longitude,
                analysis.predicted_hotspots.len(),
                analysis.candidates_filtered
            );
            Ok(Json(analysis))
        }
        Err(err @ EngineError::InvalidTarget { .. }) => {
            Err(error(StatusCode::BAD_REQUEST, err.to_string()))
        }
        Err(err @ EngineError::TerrainUnavailable(_)) => {
            tracing::warn!("Prediction abstained: {}", err);
            Err(error(StatusCode::SERVICE_UNAVAILABLE, err.to_string()))
        }
        Err(err) => {
            tracing::error!("Prediction failed: {}", err);
            Err(error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
        }
    }
}
