use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::SeriesListing;
use crate::source::StatsOutcome;

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub first: Option<u32>,
}

impl ListParams {
    fn page_size(&self) -> u32 {
        self.first
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

pub async fn list_series(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<SeriesListing>>, ApiError> {
    let listings = state.service.list_series(params.page_size()).await?;
    Ok(Json(listings))
}

pub async fn series_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatsOutcome>, ApiError> {
    let outcome = state.service.series_stats(&id).await?;
    info!(
        "Served stats for series {} from {}{}",
        id,
        outcome.source,
        if outcome.fallback { " (fallback)" } else { "" }
    );
    Ok(Json(outcome))
}

/// Raw series document, passed through untouched.
pub async fn proxy_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let document = state.service.raw_series(&id).await?;
    Ok(Json(document))
}
