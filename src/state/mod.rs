//! State module for tracking per-term collection progress
//!
//! # Components
//!
//! - `TermCursor`: the persisted pagination cursor of one search term
//! - `Scenario`: classification of one fetch against the prior cursor
//! - `derive_cursor`: the pure `(prior cursor, fetch outcome) -> next cursor` step
//! - `score_for`: the scheduling priority of a cursor

mod cursor;
mod pagination;
mod score;

// Re-export main types
pub use cursor::{ItemId, TermCursor, CURSOR_FIELDS};
pub use pagination::{derive_cursor, FetchOutcome, Scenario, Transition};
pub use score::{score_for, DRAINED_SCORE};
