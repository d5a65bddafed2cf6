//! Search-Harvest: a rate-respecting continuous search collector
//!
//! This crate polls a third-party search API for a rotating set of terms,
//! staying inside a fixed query quota per time window, and keeps per-term
//! pagination cursors in a shared store so that collection resumes exactly
//! where it left off after a restart.

pub mod collector;
pub mod config;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Search-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("Search error: {0}")]
    Search(#[from] collector::SearchError),

    #[error("Term catalog error: {0}")]
    Catalog(#[from] collector::CatalogError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Result encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Environment variable {0} is not set")]
    MissingEnv(String),
}

/// Result type alias for Search-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use state::{derive_cursor, score_for, Scenario, TermCursor, Transition};
pub use storage::{MemoryStore, SharedState, SqliteStore};
