//! Outbound query construction
//!
//! A query always names the term and the fixed result shape. Its bounds come
//! from the term's cursor:
//! - no `newest_id`: unbounded, the most recent page
//! - drained, or no gap recorded: `since_id=newest_id`
//! - resuming into a gap: `max_id=oldest_id&since_id=newest_id`

use crate::config::SearchConfig;
use crate::state::TermCursor;
use url::form_urlencoded;

/// Builds query strings for the search endpoint
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    term_prefix: String,
    result_type: String,
    page_size: u32,
}

impl QueryBuilder {
    pub fn new(term_prefix: &str, result_type: &str, page_size: u32) -> Self {
        Self {
            term_prefix: term_prefix.to_string(),
            result_type: result_type.to_string(),
            page_size,
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(&config.term_prefix, &config.result_type, config.page_size)
    }

    /// Query string (without leading `?`) for `term` given its prior cursor
    pub fn build(&self, term: &str, cursor: &TermCursor) -> String {
        let q: String =
            form_urlencoded::byte_serialize(format!("{}{}", self.term_prefix, term).as_bytes())
                .collect();

        let mut query = format!(
            "q={}&result_type={}&count={}",
            q, self.result_type, self.page_size
        );

        if let Some(newest_id) = cursor.newest_id {
            match cursor.oldest_id {
                Some(oldest_id) if oldest_id > newest_id && !cursor.previous_succeeded() => {
                    query.push_str(&format!("&max_id={}&since_id={}", oldest_id, newest_id));
                }
                _ => query.push_str(&format!("&since_id={}", newest_id)),
            }
        }

        query
    }
}
