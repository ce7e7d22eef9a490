//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::parse_duration;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Where series data comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    /// Bundled sample data, no network access
    #[default]
    Mock,
    /// GRID APIs
    Live,
}

impl DataMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataMode::Mock => "mock",
            DataMode::Live => "live",
        }
    }
}

impl std::fmt::Display for DataMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(DataMode::Mock),
            "live" => Ok(DataMode::Live),
            other => Err(ConfigError::ValidationError(format!(
                "Unknown data mode '{}' (expected 'live' or 'mock')",
                other
            ))),
        }
    }
}

/// GRID API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Central Data GraphQL endpoint
    #[serde(default = "default_central_data_url")]
    pub central_data_url: String,

    /// Series end-state download endpoint (series id is appended)
    #[serde(default = "default_file_download_url")]
    pub file_download_url: String,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// How long downloaded series stay fresh (e.g. "1h", "30m")
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: String,

    /// Maximum accepted document size in bytes
    #[serde(default = "default_max_content_size")]
    pub max_content_size: usize,
}

fn default_api_key_env() -> String {
    "GRID_API_KEY".to_string()
}

fn default_central_data_url() -> String {
    "https://api-op.grid.gg/central-data/graphql".to_string()
}

fn default_file_download_url() -> String {
    "https://api.grid.gg/file-download/end-state/grid/series".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_cache_ttl() -> String {
    "1h".to_string()
}

fn default_max_content_size() -> usize {
    50 * 1024 * 1024
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            central_data_url: default_central_data_url(),
            file_download_url: default_file_download_url(),
            timeout_seconds: default_timeout(),
            cache_ttl: default_cache_ttl(),
            max_content_size: default_max_content_size(),
        }
    }
}

impl GridConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty() && k != "placeholder")
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        parse_duration(&self.cache_ttl)
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub mode: DataMode,

    #[serde(default)]
    pub grid: GridConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            mode: DataMode::default(),
            grid: GridConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Directory for cached GRID downloads.
    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "GRID timeout must be greater than 0".to_string(),
            ));
        }

        if self.grid.cache_ttl().is_none() {
            return Err(ConfigError::ValidationError(format!(
                "Invalid GRID cache TTL: '{}'",
                self.grid.cache_ttl
            )));
        }

        for (name, value) in [
            ("central_data_url", &self.grid.central_data_url),
            ("file_download_url", &self.grid.file_download_url),
        ] {
            if url::Url::parse(value).is_err() {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid GRID {}: '{}'",
                    name, value
                )));
            }
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.mode, DataMode::Mock);
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.cache_dir(), PathBuf::from("./data/raw"));
    }

    #[test]
    fn test_grid_config_default() {
        let grid = GridConfig::default();

        assert_eq!(grid.api_key_env, "GRID_API_KEY");
        assert!(grid.central_data_url.contains("central-data"));
        assert_eq!(grid.timeout_seconds, 30);
        assert_eq!(grid.cache_ttl(), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_data_mode_parse() {
        assert_eq!("live".parse::<DataMode>().unwrap(), DataMode::Live);
        assert_eq!(" MOCK ".parse::<DataMode>().unwrap(), DataMode::Mock);
        assert!("offline".parse::<DataMode>().is_err());
        assert_eq!(DataMode::Live.to_string(), "live");
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_timeout() {
        let mut config = AppConfig::default();
        config.grid.timeout_seconds = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_ttl() {
        let mut config = AppConfig::default();
        config.grid.cache_ttl = "soon".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = AppConfig::default();
        config.grid.file_download_url = "not a url".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            mode = "live"

            [grid]
            cache_ttl = "30m"
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, DataMode::Live);
        assert_eq!(config.grid.cache_ttl(), Some(Duration::from_secs(1800)));
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.mode, DataMode::Mock);
    }

    #[test]
    fn test_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "log_level = \"debug\"\n[server]\nport = 8088\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.server.port, 8088);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
        assert_eq!(config.mode, parsed.mode);
    }
}
