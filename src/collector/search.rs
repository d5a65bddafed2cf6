//! Search API client
//!
//! This module handles all HTTP requests to the search service, including:
//! - Building the HTTP client with the configured timeout and credentials
//! - Issuing one search per collection cycle
//! - Turning the response body into items ordered newest-first

use crate::config::SearchConfig;
use crate::state::ItemId;
use crate::ConfigError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a search call
///
/// None of them is fatal: the cycle that hit one is abandoned and retried.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed search response: {0}")]
    MalformedResponse(String),
}

/// One search result
#[derive(Debug, Clone, PartialEq)]
pub struct SearchItem {
    /// Identifier assigned by the service
    pub id: ItemId,

    /// The item as returned, field by field
    pub payload: Map<String, Value>,
}

/// The search capability the collector depends on
#[async_trait]
pub trait SearchClient {
    /// Runs one search and returns its items newest-first
    async fn search(&self, query: &str) -> Result<Vec<SearchItem>, SearchError>;
}

/// `SearchClient` over HTTP
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    client: Client,
    base_url: String,
}

impl HttpSearchClient {
    /// Creates a client for the configured endpoint
    ///
    /// When `bearer-token-env` is set, the named variable must hold a token
    /// issued out of band; it is sent on every request.
    pub fn new(config: &SearchConfig) -> Result<Self, crate::HarvestError> {
        let token = match &config.bearer_token_env {
            Some(var) => Some(
                std::env::var(var).map_err(|_| ConfigError::MissingEnv(var.clone()))?,
            ),
            None => None,
        };

        let client = build_http_client(config, token.as_deref())?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchItem>, SearchError> {
        let url = format!("{}?{}", self.base_url, query);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let body: Value = response.json().await?;
        parse_search_response(&body)
    }
}

/// Builds an HTTP client with the configured timeout and optional bearer token
pub fn build_http_client(
    config: &SearchConfig,
    bearer_token: Option<&str>,
) -> Result<Client, crate::HarvestError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = bearer_token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            ConfigError::Validation("bearer token contains invalid characters".to_string())
        })?;
        headers.insert(AUTHORIZATION, value);
    }

    let client = Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Extracts items from a `{"statuses": [...]}` response body
///
/// Each element must be an object with a numeric `id` (or a decimal
/// `id_str`); order is kept as returned.
pub fn parse_search_response(body: &Value) -> Result<Vec<SearchItem>, SearchError> {
    let statuses = body
        .get("statuses")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchError::MalformedResponse("missing `statuses` array".to_string()))?;

    statuses
        .iter()
        .enumerate()
        .map(|(i, status)| {
            let payload = status.as_object().ok_or_else(|| {
                SearchError::MalformedResponse(format!("item {} is not an object", i))
            })?;

            let id = payload
                .get("id")
                .and_then(Value::as_u64)
                .or_else(|| {
                    payload
                        .get("id_str")
                        .and_then(Value::as_str)
                        .and_then(|s| s.parse().ok())
                })
                .ok_or_else(|| {
                    SearchError::MalformedResponse(format!("item {} has no numeric id", i))
                })?;

            Ok(SearchItem {
                id,
                payload: payload.clone(),
            })
        })
        .collect()
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
