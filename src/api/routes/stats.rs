use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::Value;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::StatsReport;

/// Compute a report from a posted series document.
pub async fn compute_stats(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<StatsReport>, ApiError> {
    let Json(document) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let report = state.service.compute(&document)?;
    Ok(Json(report))
}
