//! GRID API client with local caching.
//!
//! Downloads series end-state documents and lists scheduled series from the
//! Central Data GraphQL API. Downloaded documents are cached in the raw data
//! directory so repeated stats requests do not hit GRID.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use crate::config::AppConfig;
use crate::models::{ListingTeam, SeriesListing};

/// Errors that can occur while talking to GRID.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid series id: '{0}'")]
    InvalidSeriesId(String),

    #[error("GRID API key is missing (set {0})")]
    MissingApiKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rate limited by {host}, retry after {retry_after_secs}s")]
    RateLimited { host: String, retry_after_secs: u64 },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Content too large: {size} bytes (max {max_size})")]
    ContentTooLarge { size: usize, max_size: usize },

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A downloaded series document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesDownload {
    pub series_id: String,

    /// Raw document as returned by GRID
    pub document: Value,

    /// When the document was fetched from GRID
    pub fetched_at: DateTime<Utc>,

    /// Whether this was served from cache
    pub from_cache: bool,
}

/// Metadata stored alongside cached documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub url: String,
    pub series_id: String,
    pub fetched_at: DateTime<Utc>,
    pub content_length: usize,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Configuration for the GRID client.
#[derive(Debug, Clone)]
pub struct GridClientConfig {
    /// Directory to cache downloaded documents
    pub cache_dir: PathBuf,

    /// How long cached documents are considered fresh
    pub cache_ttl: Duration,

    /// Maximum document size to accept (default 50MB)
    pub max_content_size: usize,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// GRID API key, if configured
    pub api_key: Option<String>,

    /// Name of the env var the key is read from, for error messages
    pub api_key_env: String,

    pub central_data_url: Url,

    /// Base URL; the series id is appended as the last path segment
    pub file_download_url: Url,
}

impl Default for GridClientConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./data/raw"),
            cache_ttl: Duration::from_secs(3600), // 1 hour
            max_content_size: 50 * 1024 * 1024,   // 50MB
            timeout: Duration::from_secs(30),
            user_agent: format!("livewire-analytics/{}", env!("CARGO_PKG_VERSION")),
            api_key: None,
            api_key_env: "GRID_API_KEY".to_string(),
            central_data_url: Url::parse("https://api-op.grid.gg/central-data/graphql")
                .expect("static URL"),
            file_download_url: Url::parse(
                "https://api.grid.gg/file-download/end-state/grid/series",
            )
            .expect("static URL"),
        }
    }
}

impl GridClientConfig {
    /// Build client settings from the application config.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, FetchError> {
        let grid = &config.grid;
        let parse = |s: &str| Url::parse(s).map_err(|e| FetchError::InvalidUrl(format!("{s}: {e}")));

        Ok(Self {
            cache_dir: config.cache_dir(),
            cache_ttl: grid.cache_ttl().unwrap_or(Duration::from_secs(3600)),
            max_content_size: grid.max_content_size,
            timeout: Duration::from_secs(grid.timeout_seconds),
            api_key: grid.api_key(),
            api_key_env: grid.api_key_env.clone(),
            central_data_url: parse(&grid.central_data_url)?,
            file_download_url: parse(&grid.file_download_url)?,
            ..Default::default()
        })
    }
}

const LIVE_SERIES_QUERY: &str = "query GetAllSeriesInWindow($first: Int, $filter: SeriesFilter) { allSeries(first: $first, filter: $filter, orderBy: StartTimeScheduled) { totalCount edges { node { id title { nameShortened } tournament { nameShortened } startTimeScheduled format { name nameShortened } teams { baseInfo { name } scoreAdvantage } } } } }";

/// Hours either side of now covered by the live series listing.
const LIVE_WINDOW_HOURS: i64 = 12;

/// GRID API client with local caching.
pub struct GridClient {
    client: Client,
    config: GridClientConfig,
}

impl GridClient {
    /// Create a new client with the given configuration.
    pub fn new(config: GridClientConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("livewire-analytics")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Download a series document, using cache if available and fresh.
    pub async fn download_series(&self, series_id: &str) -> Result<SeriesDownload, FetchError> {
        let url = self.series_url(series_id)?;

        if let Some(download) = self.check_cache(series_id, &url).await? {
            return Ok(download);
        }

        self.download_and_cache(series_id, &url).await
    }

    /// Force download from GRID, ignoring cache.
    pub async fn download_series_fresh(
        &self,
        series_id: &str,
    ) -> Result<SeriesDownload, FetchError> {
        let url = self.series_url(series_id)?;
        self.download_and_cache(series_id, &url).await
    }

    /// List series scheduled within twelve hours of now.
    pub async fn live_series(&self, first: u32) -> Result<Vec<SeriesListing>, FetchError> {
        let api_key = self.api_key()?;
        let now = Utc::now();
        let window = chrono::Duration::hours(LIVE_WINDOW_HOURS);

        let body = json!({
            "query": LIVE_SERIES_QUERY,
            "variables": {
                "first": first,
                "filter": {
                    "startTimeScheduled": {
                        "gte": (now - window).to_rfc3339(),
                        "lte": (now + window).to_rfc3339(),
                    }
                }
            }
        });

        info!("Fetching live series from GRID (first={})", first);

        let response = self
            .client
            .post(self.config.central_data_url.as_str())
            .header("x-api-key", api_key)
            .header(AUTHORIZATION, format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await?;

        let response = Self::check_status(&self.config.central_data_url, response)?;
        let payload: Value = response.json().await?;
        let listings = parse_series_page(&payload)?;

        info!("Retrieved {} series from GRID", listings.len());
        Ok(listings)
    }

    fn api_key(&self) -> Result<&str, FetchError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| FetchError::MissingApiKey(self.config.api_key_env.clone()))
    }

    /// Build the download URL for a series id.
    fn series_url(&self, series_id: &str) -> Result<Url, FetchError> {
        let valid = !series_id.is_empty()
            && series_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(FetchError::InvalidSeriesId(series_id.to_string()));
        }

        let mut url = self.config.file_download_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.config.file_download_url.to_string()))?
            .pop_if_empty()
            .push(series_id);
        Ok(url)
    }

    /// Check if a series document is cached and fresh.
    async fn check_cache(
        &self,
        series_id: &str,
        url: &Url,
    ) -> Result<Option<SeriesDownload>, FetchError> {
        let cache_path = self.cache_path_for_url(url);
        let meta_path = self.meta_path_for_url(url);

        if !cache_path.exists() || !meta_path.exists() {
            return Ok(None);
        }

        let meta_content = fs::read_to_string(&meta_path).await?;
        let meta: CacheMetadata = match serde_json::from_str(&meta_content) {
            Ok(m) => m,
            Err(_) => return Ok(None),
        };

        // Check if cache has expired
        let age = Utc::now().signed_duration_since(meta.fetched_at);
        if age.num_seconds() > self.config.cache_ttl.as_secs() as i64 {
            debug!("Cache expired for series {}", series_id);
            return Ok(None);
        }

        let content = fs::read(&cache_path).await?;
        let document: Value = match serde_json::from_slice(&content) {
            Ok(doc) => doc,
            Err(_) => {
                debug!("Discarding unreadable cache entry for series {}", series_id);
                return Ok(None);
            }
        };

        info!("Serving series {} from cache", series_id);
        Ok(Some(SeriesDownload {
            series_id: series_id.to_string(),
            document,
            fetched_at: meta.fetched_at,
            from_cache: true,
        }))
    }

    /// Download from GRID and cache the result.
    async fn download_and_cache(
        &self,
        series_id: &str,
        url: &Url,
    ) -> Result<SeriesDownload, FetchError> {
        let api_key = self.api_key()?;

        info!("Downloading series {} from {}", series_id, url);

        let response = self
            .client
            .get(url.as_str())
            .header("x-api-key", api_key)
            .send()
            .await?;

        let response = Self::check_status(url, response)?;
        let content = response.bytes().await?;

        if content.len() > self.config.max_content_size {
            return Err(FetchError::ContentTooLarge {
                size: content.len(),
                max_size: self.config.max_content_size,
            });
        }

        let document: Value = serde_json::from_slice(&content)?;
        let fetched_at = self.write_cache(series_id, url, &content).await?;

        info!(
            "Downloaded series {} ({} bytes)",
            series_id,
            content.len()
        );

        Ok(SeriesDownload {
            series_id: series_id.to_string(),
            document,
            fetched_at,
            from_cache: false,
        })
    }

    /// Write a document and its metadata sidecar to the cache.
    async fn write_cache(
        &self,
        series_id: &str,
        url: &Url,
        content: &[u8],
    ) -> Result<DateTime<Utc>, FetchError> {
        let cache_path = self.cache_path_for_url(url);
        let meta_path = self.meta_path_for_url(url);

        // Ensure cache directory exists
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&cache_path).await?;
        file.write_all(content).await?;
        file.flush().await?;

        let fetched_at = Utc::now();

        let meta = CacheMetadata {
            url: url.to_string(),
            series_id: series_id.to_string(),
            fetched_at,
            content_length: content.len(),
            expires_at: Some(
                fetched_at + chrono::Duration::seconds(self.config.cache_ttl.as_secs() as i64),
            ),
        };

        let meta_json = serde_json::to_string_pretty(&meta)?;
        fs::write(meta_path, meta_json).await?;

        Ok(fetched_at)
    }

    /// Map rate limiting and non-2xx responses to errors.
    fn check_status(url: &Url, response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(FetchError::RateLimited {
                host: url.host_str().unwrap_or("unknown").to_string(),
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response)
    }

    /// Generate a cache path for a URL.
    fn cache_path_for_url(&self, url: &Url) -> PathBuf {
        let hash = Self::url_hash(url);
        let host = url.host_str().unwrap_or("unknown");

        self.config
            .cache_dir
            .join(host)
            .join(format!("{}.json", hash))
    }

    /// Generate a metadata path for a URL.
    fn meta_path_for_url(&self, url: &Url) -> PathBuf {
        let hash = Self::url_hash(url);
        let host = url.host_str().unwrap_or("unknown");

        self.config
            .cache_dir
            .join(host)
            .join(format!("{}.meta.json", hash))
    }

    /// Hash a URL to a short string.
    fn url_hash(url: &Url) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_str().as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..8])
    }
}

// ── GraphQL response shapes ─────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<AllSeriesData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AllSeriesData {
    all_series: SeriesConnection,
}

#[derive(Debug, Deserialize)]
struct SeriesConnection {
    #[serde(default)]
    edges: Vec<SeriesEdge>,
}

#[derive(Debug, Deserialize)]
struct SeriesEdge {
    node: SeriesNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShortName {
    name: Option<String>,
    name_shortened: Option<String>,
}

impl ShortName {
    fn resolve(self) -> Option<String> {
        self.name_shortened.or(self.name)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesNode {
    id: String,
    title: Option<ShortName>,
    tournament: Option<ShortName>,
    start_time_scheduled: Option<String>,
    format: Option<ShortName>,
    #[serde(default)]
    teams: Vec<SeriesNodeTeam>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesNodeTeam {
    base_info: Option<ShortName>,
    score_advantage: Option<i64>,
}

impl From<SeriesNode> for SeriesListing {
    fn from(node: SeriesNode) -> Self {
        SeriesListing {
            id: node.id,
            title: node.title.and_then(ShortName::resolve),
            tournament: node.tournament.and_then(ShortName::resolve),
            start_time_scheduled: node.start_time_scheduled,
            format: node.format.and_then(ShortName::resolve),
            teams: node
                .teams
                .into_iter()
                .map(|t| ListingTeam {
                    name: t.base_info.and_then(|b| b.name),
                    score_advantage: t.score_advantage.unwrap_or(0),
                })
                .collect(),
        }
    }
}

/// Extract series listings from an `allSeries` GraphQL response.
pub fn parse_series_page(payload: &Value) -> Result<Vec<SeriesListing>, FetchError> {
    let response = GraphQlResponse::deserialize(payload)?;

    if let Some(err) = response.errors.as_deref().and_then(|errs| errs.first()) {
        return Err(FetchError::GraphQl(err.message.clone()));
    }

    let data = response
        .data
        .ok_or_else(|| FetchError::GraphQl("response contained no data".to_string()))?;

    Ok(data
        .all_series
        .edges
        .into_iter()
        .map(|edge| edge.node.into())
        .collect())
}
