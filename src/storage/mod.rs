//! Storage module for the collector's shared state
//!
//! This module handles everything that must survive a restart:
//! - the candidate set of search terms
//! - per-term cursor hashes and scores
//! - the rate-limit ledger
//! - the appended results list

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{SharedState, StoreError, StoreResult};

use crate::state::{TermCursor, CURSOR_FIELDS};
use std::path::Path;

/// Set holding every known search term
pub const TERMS_KEY: &str = "search_terms";

/// List of query timestamps used as the sliding rate-limit window
pub const LEDGER_KEY: &str = "query_counter";

/// List receiving every collected item
pub const RESULTS_KEY: &str = "results";

/// Prefix of the per-term cursor hash; the term itself follows
pub const TERM_HASH_PREFIX: &str = "term:";

/// Hash field holding a term's scheduling score
pub const SCORE_FIELD: &str = "score";

/// Key of the cursor hash for `term`
pub fn term_key(term: &str) -> String {
    format!("{}{}", TERM_HASH_PREFIX, term)
}

/// Reads the stored cursor of `term`; a term never written yields a blank cursor
pub fn load_cursor(store: &dyn SharedState, term: &str) -> StoreResult<TermCursor> {
    let values = store.hash_get_fields(&term_key(term), &CURSOR_FIELDS)?;
    Ok(TermCursor::from_fields(&values))
}

/// Writes every cursor field of `term` in one multi-field update
pub fn save_cursor(
    store: &mut dyn SharedState,
    term: &str,
    cursor: &TermCursor,
) -> StoreResult<()> {
    store.hash_set_fields(&term_key(term), &cursor.to_fields())
}

/// Opens the SQLite store at `path`
pub fn open_store(path: &Path) -> StoreResult<SqliteStore> {
    SqliteStore::new(path)
}
