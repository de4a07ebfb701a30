//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Upper bound for `feeds.max_age_days` (ten years).
pub const MAX_AGE_DAYS_LIMIT: u64 = 3650;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API access settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Feed generation and update cycle settings
    #[serde(default)]
    pub feeds: FeedsConfig,

    /// HTTP front end settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Saved query file and hot-reload settings
    #[serde(default)]
    pub watch: WatchConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        if self.api.signing_key.is_empty() {
            return Err(AppError::validation("api.signing_key is empty"));
        }
        if self.feeds.max_concurrent == 0 {
            return Err(AppError::validation("feeds.max_concurrent must be > 0"));
        }
        if self.feeds.update_interval_mins == 0 {
            return Err(AppError::validation(
                "feeds.update_interval_mins must be > 0",
            ));
        }
        self.feeds.max_age()?;
        if self.watch.queries_file.as_os_str().is_empty() {
            return Err(AppError::validation("watch.queries_file is empty"));
        }
        Ok(())
    }
}

/// Upstream API access settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// User-Agent header for every upstream call
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Base URL of the versioned API (search and item endpoints)
    #[serde(default = "defaults::api_url")]
    pub api_url: String,

    /// Host prefix removed from URLs before signing
    #[serde(default = "defaults::api_host")]
    pub api_host: String,

    /// Public web site, used for geocoding and item links
    #[serde(default = "defaults::web_url")]
    pub web_url: String,

    /// `language` parameter sent with every search
    #[serde(default = "defaults::language")]
    pub language: String,

    /// Pre-shared HMAC key
    #[serde(default = "defaults::signing_key")]
    pub signing_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            api_url: defaults::api_url(),
            api_host: defaults::api_host(),
            web_url: defaults::web_url(),
            language: defaults::language(),
            signing_key: defaults::signing_key(),
        }
    }
}

/// Feed generation and update cycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsConfig {
    /// Lifetime of cached item details, in hours
    #[serde(default = "defaults::cache_ttl_hours")]
    pub cache_ttl_hours: u64,

    /// Delay between dispatching two query rebuilds, in seconds
    #[serde(default = "defaults::update_delay_secs")]
    pub update_delay_secs: u64,

    /// Interval between update cycles, in minutes
    #[serde(default = "defaults::update_interval_mins")]
    pub update_interval_mins: u64,

    /// Pagination stops once results are older than this many days
    #[serde(default = "defaults::max_age_days")]
    pub max_age_days: u64,

    /// Maximum number of query rebuilds in flight
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Appended to the keyword list to form the feed title
    #[serde(default = "defaults::title_suffix")]
    pub title_suffix: String,

    /// Channel description
    #[serde(default = "defaults::description")]
    pub description: String,

    /// Channel author name
    #[serde(default = "defaults::author_name")]
    pub author_name: String,

    /// Channel author e-mail
    #[serde(default)]
    pub author_email: Option<String>,
}

impl FeedsConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours * 3600)
    }

    pub fn update_delay(&self) -> Duration {
        Duration::from_secs(self.update_delay_secs)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_mins * 60)
    }

    /// Search age cutoff. Fails above `MAX_AGE_DAYS_LIMIT`.
    pub fn max_age(&self) -> Result<chrono::Duration> {
        if self.max_age_days > MAX_AGE_DAYS_LIMIT {
            return Err(AppError::validation(format!(
                "feeds.max_age_days must be <= {MAX_AGE_DAYS_LIMIT}, got {}",
                self.max_age_days
            )));
        }
        i64::try_from(self.max_age_days)
            .ok()
            .and_then(chrono::TimeDelta::try_days)
            .ok_or_else(|| {
                AppError::validation(format!(
                    "feeds.max_age_days out of range: {}",
                    self.max_age_days
                ))
            })
    }
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_hours: defaults::cache_ttl_hours(),
            update_delay_secs: defaults::update_delay_secs(),
            update_interval_mins: defaults::update_interval_mins(),
            max_age_days: defaults::max_age_days(),
            max_concurrent: defaults::max_concurrent(),
            title_suffix: defaults::title_suffix(),
            description: defaults::description(),
            author_name: defaults::author_name(),
            author_email: None,
        }
    }
}

/// HTTP front end settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening address
    #[serde(default = "defaults::addr")]
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: defaults::addr(),
        }
    }
}

/// Saved query file and hot-reload settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Path of the saved queries TOML file
    #[serde(default = "defaults::queries_file")]
    pub queries_file: PathBuf,

    /// How often the file is polled for changes, in seconds
    #[serde(default = "defaults::poll_secs")]
    pub poll_secs: u64,
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs.max(1))
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            queries_file: defaults::queries_file(),
            poll_secs: defaults::poll_secs(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Api defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (X11; Linux x86_64; rv:67.0) Gecko/20100101 Firefox/67.0".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn api_url() -> String {
        "https://api.wallapop.com/api/v3".into()
    }
    pub fn api_host() -> String {
        "https://api.wallapop.com".into()
    }
    pub fn web_url() -> String {
        "https://es.wallapop.com".into()
    }
    pub fn language() -> String {
        "es_ES".into()
    }
    pub fn signing_key() -> String {
        "Tm93IHRoYXQgeW91J3ZlIGZvdW5kIHRoaXMsIGFyZSB5b3UgcmVhZHkgdG8gam9pbiB1cz8gam9ic0B3YWxsYXBvcC5jb20=="
            .into()
    }

    // Feed defaults
    pub fn cache_ttl_hours() -> u64 {
        12
    }
    pub fn update_delay_secs() -> u64 {
        1
    }
    pub fn update_interval_mins() -> u64 {
        15
    }
    pub fn max_age_days() -> u64 {
        15
    }
    pub fn max_concurrent() -> usize {
        8
    }
    pub fn title_suffix() -> String {
        "Wallapop RSS".into()
    }
    pub fn description() -> String {
        "Wallapop RSS feed.".into()
    }
    pub fn author_name() -> String {
        "market-feeds".into()
    }

    // Server defaults
    pub fn addr() -> String {
        "127.0.0.1:8080".into()
    }

    // Watch defaults
    pub fn queries_file() -> PathBuf {
        PathBuf::from("./queries.toml")
    }
    pub fn poll_secs() -> u64 {
        4
    }
}
