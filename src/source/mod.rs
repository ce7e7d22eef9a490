//! Series data sources and the stats service.
//!
//! The data mode picks the source:
//! - Live: GRID downloads via [`GridClient`]
//! - Mock: a bundled sample series
//!
//! In live mode a failed download or an unreadable document falls back to the
//! mock report so dashboards always have something to render.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calculate::{compute_stats_from_value, EngineError};
use crate::config::{AppConfig, DataMode};
use crate::fetch::{FetchError, GridClient, GridClientConfig};
use crate::models::{ListingTeam, SeriesListing, StatsReport};

const MOCK_SERIES_JSON: &str = include_str!("mock_series.json");

/// Errors from series sources and the stats service.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Bundled mock series is invalid: {0}")]
    MockData(#[source] serde_json::Error),
}

/// Something that can supply raw series documents.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    /// Source name for logging and responses.
    fn name(&self) -> &'static str;

    /// Fetch the raw document for a series.
    async fn fetch_series(&self, series_id: &str) -> Result<Value, SourceError>;

    /// List series available to pick from.
    async fn list_series(&self, first: u32) -> Result<Vec<SeriesListing>, SourceError>;
}

/// GRID-backed source.
pub struct GridSource {
    client: GridClient,
}

impl GridSource {
    pub fn new(client: GridClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SeriesSource for GridSource {
    fn name(&self) -> &'static str {
        "grid"
    }

    async fn fetch_series(&self, series_id: &str) -> Result<Value, SourceError> {
        let download = self.client.download_series(series_id).await?;
        Ok(download.document)
    }

    async fn list_series(&self, first: u32) -> Result<Vec<SeriesListing>, SourceError> {
        Ok(self.client.live_series(first).await?)
    }
}

/// Bundled sample data.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockSource;

impl MockSource {
    /// The bundled mock series document.
    pub fn document() -> Result<Value, SourceError> {
        serde_json::from_str(MOCK_SERIES_JSON).map_err(SourceError::MockData)
    }

    /// The bundled document stamped with `series_id`.
    pub fn document_for(series_id: &str) -> Result<Value, SourceError> {
        let mut doc = Self::document()?;
        if let Some(obj) = doc.as_object_mut() {
            obj.insert("id".to_string(), Value::String(series_id.to_string()));
        }
        Ok(doc)
    }

    /// Report computed from the bundled document.
    pub fn report() -> Result<StatsReport, SourceError> {
        Ok(compute_stats_from_value(&Self::document()?)?)
    }

    /// Mock report carrying `series_id` as its overview id.
    pub fn report_for(series_id: &str) -> Result<StatsReport, SourceError> {
        Ok(compute_stats_from_value(&Self::document_for(series_id)?)?)
    }
}

#[async_trait]
impl SeriesSource for MockSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch_series(&self, series_id: &str) -> Result<Value, SourceError> {
        Self::document_for(series_id)
    }

    async fn list_series(&self, first: u32) -> Result<Vec<SeriesListing>, SourceError> {
        let report = Self::report()?;
        let listing = SeriesListing {
            id: report
                .overview
                .series_id
                .clone()
                .unwrap_or_else(|| "mock-series-1".to_string()),
            title: Some(report.overview.title.clone()),
            tournament: Some("LIVEWIRE Scrims".to_string()),
            start_time_scheduled: Self::document()?
                .get("startedAt")
                .and_then(Value::as_str)
                .map(str::to_string),
            format: report.overview.format.clone(),
            teams: report
                .teams
                .iter()
                .map(|t| ListingTeam {
                    name: Some(t.name.clone()),
                    score_advantage: 0,
                })
                .collect(),
        };
        Ok(std::iter::once(listing).take(first as usize).collect())
    }
}

/// A stats report together with where it came from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOutcome {
    pub series_id: String,
    pub source: &'static str,

    /// True when the live path failed and the mock report was substituted
    pub fallback: bool,

    pub report: StatsReport,
}

/// Fetches series documents per data mode and runs the analytics engine.
#[derive(Clone)]
pub struct StatsService {
    mode: DataMode,
    source: Arc<dyn SeriesSource>,
}

impl StatsService {
    pub fn new(mode: DataMode, source: Arc<dyn SeriesSource>) -> Self {
        Self { mode, source }
    }

    /// Build the service for the configured data mode.
    pub fn from_config(config: &AppConfig) -> Result<Self, SourceError> {
        let source: Arc<dyn SeriesSource> = match config.mode {
            DataMode::Live => {
                let client = GridClient::new(GridClientConfig::from_app_config(config)?)?;
                if !client.has_api_key() {
                    warn!(
                        "Live mode without {} set; requests will fall back to mock data",
                        config.grid.api_key_env
                    );
                }
                Arc::new(GridSource::new(client))
            }
            DataMode::Mock => Arc::new(MockSource),
        };

        info!("Stats service using {} source ({} mode)", source.name(), config.mode);
        Ok(Self::new(config.mode, source))
    }

    pub fn mode(&self) -> DataMode {
        self.mode
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Run the engine on a caller-supplied document.
    pub fn compute(&self, document: &Value) -> Result<StatsReport, EngineError> {
        let report = compute_stats_from_value(document)?;
        debug!(
            "Computed stats: {} teams, {} players, {} games",
            report.teams.len(),
            report.players.len(),
            report.games.len()
        );
        Ok(report)
    }

    /// Raw document for a series, straight from the source.
    pub async fn raw_series(&self, series_id: &str) -> Result<Value, SourceError> {
        self.source.fetch_series(series_id).await
    }

    pub async fn list_series(&self, first: u32) -> Result<Vec<SeriesListing>, SourceError> {
        self.source.list_series(first).await
    }

    /// Fetch a series and compute its report.
    ///
    /// In live mode any failure yields the mock report with `fallback` set.
    pub async fn series_stats(&self, series_id: &str) -> Result<StatsOutcome, SourceError> {
        match self.fetch_and_compute(series_id).await {
            Ok(report) => Ok(StatsOutcome {
                series_id: series_id.to_string(),
                source: self.source.name(),
                fallback: false,
                report,
            }),
            Err(e) if self.mode == DataMode::Live => {
                warn!(
                    "Stats for series {} unavailable ({}); using mock report",
                    series_id, e
                );
                Ok(StatsOutcome {
                    series_id: series_id.to_string(),
                    source: MockSource.name(),
                    fallback: true,
                    report: MockSource::report_for(series_id)?,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_and_compute(&self, series_id: &str) -> Result<StatsReport, SourceError> {
        let document = self.source.fetch_series(series_id).await?;
        Ok(self.compute(&document)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StaticSource(Value);

    #[async_trait]
    impl SeriesSource for StaticSource {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn fetch_series(&self, _series_id: &str) -> Result<Value, SourceError> {
            Ok(self.0.clone())
        }

        async fn list_series(&self, _first: u32) -> Result<Vec<SeriesListing>, SourceError> {
            Ok(vec![])
        }
    }

    struct FailingSource;

    #[async_trait]
    impl SeriesSource for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch_series(&self, _series_id: &str) -> Result<Value, SourceError> {
            Err(FetchError::HttpStatus {
                status: 503,
                message: "Service Unavailable".to_string(),
            }
            .into())
        }

        async fn list_series(&self, _first: u32) -> Result<Vec<SeriesListing>, SourceError> {
            Err(FetchError::MissingApiKey("GRID_API_KEY".to_string()).into())
        }
    }

    #[test]
    fn test_mock_document_is_valid() {
        let report = MockSource::report().unwrap();

        assert_eq!(report.overview.series_id.as_deref(), Some("mock-series-1"));
        assert_eq!(report.overview.total_games, 3);
        assert_eq!(report.overview.total_segments, 6);
        assert_eq!(report.players.len(), 6);
        assert_eq!(report.winner().map(|t| t.name.as_str()), Some("LIVEWIRE"));
    }

    #[test]
    fn test_mock_report_metrics() {
        let report = MockSource::report().unwrap();
        let livewire = report.team_metrics("livewire").unwrap();

        assert_eq!(livewire.total_rounds, 6);
        assert_eq!(livewire.total_objectives, 3);
        assert_eq!(livewire.round_timing_efficiency, "86.7");
        assert_eq!(livewire.ope, "25.0");
        assert_eq!(livewire.dsv, "1.15");
        assert_eq!(livewire.tempo_leak, "40.0");
        assert_eq!(livewire.pace_deviation, "18.17");
    }

    #[tokio::test]
    async fn test_mock_source_uses_requested_id() {
        let doc = MockSource.fetch_series("abc").await.unwrap();
        assert_eq!(doc["id"], "abc");
    }

    #[tokio::test]
    async fn test_mock_source_listing() {
        let listings = MockSource.list_series(10).await.unwrap();

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].matchup(), "LIVEWIRE vs Phantom Esports");
        assert!(MockSource.list_series(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_series_stats_from_source() {
        let service = StatsService::new(
            DataMode::Live,
            Arc::new(StaticSource(json!({ "seriesState": { "id": "9", "teams": [] } }))),
        );

        let outcome = service.series_stats("9").await.unwrap();

        assert!(!outcome.fallback);
        assert_eq!(outcome.source, "static");
        assert_eq!(outcome.report.overview.series_id.as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn test_live_failure_falls_back_to_mock() {
        let service = StatsService::new(DataMode::Live, Arc::new(FailingSource));

        let outcome = service.series_stats("9").await.unwrap();

        assert!(outcome.fallback);
        assert_eq!(outcome.source, "mock");
        assert_eq!(outcome.series_id, "9");
        assert_eq!(outcome.report.overview.series_id.as_deref(), Some("9"));
        assert_eq!(outcome.report, MockSource::report_for("9").unwrap());
    }

    #[tokio::test]
    async fn test_live_malformed_document_falls_back_to_mock() {
        let service = StatsService::new(
            DataMode::Live,
            Arc::new(StaticSource(json!({ "teams": "broken" }))),
        );

        let outcome = service.series_stats("9").await.unwrap();
        assert!(outcome.fallback);
    }

    #[tokio::test]
    async fn test_mock_mode_failure_is_an_error() {
        let service = StatsService::new(DataMode::Mock, Arc::new(FailingSource));

        let result = service.series_stats("9").await;
        assert!(matches!(result, Err(SourceError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_list_series_propagates_errors() {
        let service = StatsService::new(DataMode::Live, Arc::new(FailingSource));
        assert!(service.list_series(5).await.is_err());
    }

    #[test]
    fn test_from_config_mock_mode() {
        let service = StatsService::from_config(&AppConfig::default()).unwrap();

        assert_eq!(service.mode(), DataMode::Mock);
        assert_eq!(service.source_name(), "mock");
    }

    #[test]
    fn test_from_config_live_mode() {
        let mut config = AppConfig::default();
        config.mode = DataMode::Live;

        let service = StatsService::from_config(&config).unwrap();
        assert_eq!(service.source_name(), "grid");
    }
}
