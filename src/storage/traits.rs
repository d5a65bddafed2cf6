//! Shared state trait and error types
//!
//! The collector only ever talks to its store through the key/value
//! operations below. Each call is atomic on its own; no operation spans keys
//! of different kinds, and the collector never needs a multi-call transaction.

use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Key/value store holding every piece of state the collector shares across restarts
///
/// Three kinds of values live under string keys:
/// - sets of member strings
/// - hashes of field -> value strings
/// - lists of strings with O(1) access at both ends
pub trait SharedState {
    // ===== Sets =====

    /// Number of members in the set at `key` (0 if absent)
    fn set_cardinality(&self, key: &str) -> StoreResult<u64>;

    /// Adds members to the set, returning how many were not already present
    fn set_add(&mut self, key: &str, members: &[String]) -> StoreResult<u64>;

    /// Members of the set, sorted by member string
    fn set_members(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Members of the set ordered by a numeric field of a linked hash
    ///
    /// The hash linked to `member` lives at `hash_prefix + member`. Ordering is
    /// ascending by the value of `score_field` parsed as an unsigned integer;
    /// a missing or non-numeric value sorts as 0. Ties are broken by member string.
    fn sort_set_by_hash_score(
        &self,
        key: &str,
        hash_prefix: &str,
        score_field: &str,
    ) -> StoreResult<Vec<String>>;

    // ===== Hashes =====

    /// Values of the requested fields, `None` where a field is absent
    fn hash_get_fields(&self, key: &str, fields: &[&str]) -> StoreResult<Vec<Option<String>>>;

    /// Sets several fields in one atomic write
    fn hash_set_fields(&mut self, key: &str, fields: &[(&str, String)]) -> StoreResult<()>;

    /// Sets a single field
    fn hash_set_field(&mut self, key: &str, field: &str, value: &str) -> StoreResult<()>;

    // ===== Lists =====

    /// Length of the list at `key` (0 if absent)
    fn list_len(&self, key: &str) -> StoreResult<u64>;

    /// Removes and returns the first element
    fn list_pop_head(&mut self, key: &str) -> StoreResult<Option<String>>;

    /// Inserts an element before the first one
    fn list_push_head(&mut self, key: &str, value: &str) -> StoreResult<()>;

    /// Appends an element after the last one
    fn list_push_tail(&mut self, key: &str, value: &str) -> StoreResult<()>;

    /// Up to `limit` elements starting at index `start` from the head
    fn list_range(&self, key: &str, start: u64, limit: u64) -> StoreResult<Vec<String>>;
}

/// Parses a linked score the way `sort_set_by_hash_score` orders it
pub(crate) fn sort_score(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(0)
}
