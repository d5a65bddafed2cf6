use serde::Deserialize;

/// Main configuration structure for Search-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    #[serde(rename = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
}

/// Search API endpoint and query shape
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Full URL of the search endpoint; the query string is appended to it
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Name of the environment variable holding a pre-issued bearer token
    #[serde(rename = "bearer-token-env", default)]
    pub bearer_token_env: Option<String>,

    /// Prefix prepended to every term before escaping (e.g. "#" for hashtags)
    #[serde(rename = "term-prefix", default)]
    pub term_prefix: String,

    /// Value of the `result_type` query parameter
    #[serde(rename = "result-type", default = "default_result_type")]
    pub result_type: String,

    /// Value of the `count` query parameter
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Sliding-window quota for outbound queries
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum number of queries per window
    pub quota: u32,

    /// Window length in minutes
    #[serde(rename = "window-minutes")]
    pub window_minutes: u64,

    /// Seconds to wait before re-checking a saturated limiter
    #[serde(rename = "throttle-backoff-secs", default = "default_backoff_secs")]
    pub throttle_backoff_secs: u64,
}

/// Shared state store location
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Sources for the list of terms to search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    /// Path to a file with one term per line
    #[serde(default)]
    pub path: Option<String>,

    /// Terms listed inline
    #[serde(default)]
    pub terms: Vec<String>,
}

/// Collection loop tuning
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// Number of collected cycles between progress log lines
    #[serde(rename = "progress-interval", default = "default_progress_interval")]
    pub progress_interval: u64,

    /// Seconds to wait after a failed iteration
    #[serde(rename = "error-backoff-secs", default = "default_backoff_secs")]
    pub error_backoff_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            progress_interval: default_progress_interval(),
            error_backoff_secs: default_backoff_secs(),
        }
    }
}

fn default_result_type() -> String {
    "recent".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_backoff_secs() -> u64 {
    5
}

fn default_progress_interval() -> u64 {
    50
}
