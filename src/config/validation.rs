use crate::config::types::{
    CatalogConfig, CollectorConfig, Config, RateLimitConfig, SearchConfig, StorageConfig,
};
use crate::ConfigError;
use url::Url;

/// Longest accepted rate-limit window (one week)
pub const MAX_WINDOW_MINUTES: u64 = 7 * 24 * 60;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_search_config(&config.search)?;
    validate_rate_limit_config(&config.rate_limit)?;
    validate_storage_config(&config.storage)?;
    validate_catalog_config(&config.catalog)?;
    validate_collector_config(&config.collector)?;
    Ok(())
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if url.query().is_some() {
        return Err(ConfigError::InvalidUrl(
            "base-url must not carry a query string".to_string(),
        ));
    }

    if config.term_prefix.chars().count() > 1 {
        return Err(ConfigError::Validation(format!(
            "term-prefix must be at most one character, got '{}'",
            config.term_prefix
        )));
    }

    if config.result_type.trim().is_empty() {
        return Err(ConfigError::Validation(
            "result-type cannot be empty".to_string(),
        ));
    }

    if config.page_size < 1 || config.page_size > 100 {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and 100, got {}",
            config.page_size
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if let Some(var) = &config.bearer_token_env {
        if var.trim().is_empty() {
            return Err(ConfigError::Validation(
                "bearer-token-env cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.quota < 1 {
        return Err(ConfigError::Validation(format!(
            "quota must be >= 1, got {}",
            config.quota
        )));
    }

    if config.window_minutes < 1 || config.window_minutes > MAX_WINDOW_MINUTES {
        return Err(ConfigError::Validation(format!(
            "window-minutes must be between 1 and {}, got {}",
            MAX_WINDOW_MINUTES, config.window_minutes
        )));
    }

    if config.throttle_backoff_secs < 1 {
        return Err(ConfigError::Validation(
            "throttle-backoff-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    let has_file = config
        .path
        .as_deref()
        .is_some_and(|p| !p.trim().is_empty());

    if !has_file && config.terms.is_empty() {
        return Err(ConfigError::Validation(
            "catalog needs a path or at least one inline term".to_string(),
        ));
    }

    if let Some(term) = config.terms.iter().find(|t| t.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "catalog term cannot be blank: {:?}",
            term
        )));
    }

    Ok(())
}

fn validate_collector_config(config: &CollectorConfig) -> Result<(), ConfigError> {
    if config.progress_interval < 1 {
        return Err(ConfigError::Validation(
            "progress-interval must be >= 1".to_string(),
        ));
    }

    if config.error_backoff_secs < 1 {
        return Err(ConfigError::Validation(
            "error-backoff-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_config() -> SearchConfig {
        SearchConfig {
            base_url: "https://api.example.com/search".to_string(),
            bearer_token_env: None,
            term_prefix: "#".to_string(),
            result_type: "recent".to_string(),
            page_size: 100,
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_validate_search_config() {
        assert!(validate_search_config(&search_config()).is_ok());

        let mut bad = search_config();
        bad.base_url = "ftp://api.example.com/search".to_string();
        assert!(validate_search_config(&bad).is_err());

        let mut bad = search_config();
        bad.base_url = "https://api.example.com/search?q=x".to_string();
        assert!(validate_search_config(&bad).is_err());

        let mut bad = search_config();
        bad.page_size = 101;
        assert!(validate_search_config(&bad).is_err());

        let mut bad = search_config();
        bad.term_prefix = "##".to_string();
        assert!(validate_search_config(&bad).is_err());
    }

    #[test]
    fn test_validate_rate_limit_config() {
        let ok = RateLimitConfig {
            quota: 2,
            window_minutes: 15,
            throttle_backoff_secs: 5,
        };
        assert!(validate_rate_limit_config(&ok).is_ok());

        let zero_window = RateLimitConfig {
            window_minutes: 0,
            ..ok.clone()
        };
        assert!(validate_rate_limit_config(&zero_window).is_err());

        let week = RateLimitConfig {
            window_minutes: MAX_WINDOW_MINUTES,
            ..ok.clone()
        };
        assert!(validate_rate_limit_config(&week).is_ok());

        let huge_window = RateLimitConfig {
            window_minutes: 1_000_000_000_000_000,
            ..ok.clone()
        };
        assert!(validate_rate_limit_config(&huge_window).is_err());
    }

    #[test]
    fn test_validate_catalog_config() {
        assert!(validate_catalog_config(&CatalogConfig::default()).is_err());

        let inline = CatalogConfig {
            path: None,
            terms: vec!["rust".to_string()],
        };
        assert!(validate_catalog_config(&inline).is_ok());

        let file = CatalogConfig {
            path: Some("./terms.txt".to_string()),
            terms: vec![],
        };
        assert!(validate_catalog_config(&file).is_ok());

        let blank = CatalogConfig {
            path: None,
            terms: vec!["  ".to_string()],
        };
        assert!(validate_catalog_config(&blank).is_err());
    }
}
