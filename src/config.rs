//! Configuration management for podnotes.
//!
//! The config file is discovered with the prefer crate (`podnotes.toml`,
//! `podnotes.yaml`, ... in the standard locations) or passed with `--config`,
//! then parsed with serde according to its extension. Every field has a
//! default, so running without a config file is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::scrapers::browser::BrowserEngineConfig;
use crate::scrapers::config::{DetailSelectors, ListingSelectors, WalkerConfig};

/// Environment variable overriding [`Config::base_url`].
pub const BASE_URL_ENV: &str = "PODNOTES_BASE_URL";
/// Environment variable holding the YouTube Data API key.
pub const YOUTUBE_API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {format} config: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// YouTube Data API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// API root, e.g. `https://www.googleapis.com/youtube/v3`.
    pub api_base: String,
    /// API key. Usually supplied via `YOUTUBE_API_KEY` rather than the file.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Channel username used by `stats --channel` when none is given.
    pub channel_username: Option<String>,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            api_key: None,
            channel_username: None,
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site root; episode links are relative to it.
    pub base_url: String,
    /// Path of the paginated episode listing.
    pub listing_path: String,
    /// Directory for output files.
    pub output_dir: PathBuf,
    /// Output file name inside `output_dir`.
    pub output_file: String,
    /// User agent for detail requests (`"impersonate"` for a browser UA).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Delay between detail requests in milliseconds.
    pub request_delay_ms: u64,
    pub browser: BrowserEngineConfig,
    pub walker: WalkerConfig,
    pub listing: ListingSelectors,
    pub detail: DetailSelectors,
    pub youtube: YoutubeConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://www.hubermanlab.com".to_string(),
            listing_path: "/all-episodes".to_string(),
            output_dir: PathBuf::from("data"),
            output_file: "video_metadata.csv".to_string(),
            user_agent: None,
            request_timeout: 30,
            request_delay_ms: 0,
            browser: BrowserEngineConfig::default(),
            walker: WalkerConfig::default(),
            listing: ListingSelectors::default(),
            detail: DetailSelectors::default(),
            youtube: YoutubeConfig::default(),
            source_path: None,
        }
    }
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults when no config file is found.
    pub async fn load() -> Self {
        let config = match prefer::load("podnotes").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        warn!("Ignoring config file {}: {}", path.display(), e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            Err(_) => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };
        config.with_env_overrides()
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML, and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse config text in the format implied by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, ConfigError> {
        match ext {
            "toml" => toml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            }),
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "YAML",
                message: e.to_string(),
            }),
            _ => serde_json::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            }),
        }
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base_url) = get(BASE_URL_ENV) {
            self.base_url = base_url;
        }
        if let Some(key) = get(YOUTUBE_API_KEY_ENV) {
            self.youtube.api_key = Some(key);
        }
        self
    }

    /// Full URL of the paginated listing page.
    pub fn listing_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.listing_path
        )
    }

    /// Site root without a trailing slash, for joining episode links.
    pub fn site_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Default output file path.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
