//! Scheduling priority of a term
//!
//! Lower scores are queried sooner. A drained term sorts last; a term with an
//! open gap sorts by its `last_success`, so the oldest unresolved gap wins.

use crate::state::cursor::TermCursor;

/// Score of a term with nothing left to catch up on
pub const DRAINED_SCORE: u64 = u64::MAX;

/// Computes the score of a freshly derived cursor
pub fn score_for(cursor: &TermCursor) -> u64 {
    if cursor.success.unwrap_or(true) {
        return DRAINED_SCORE;
    }
    // A gap with no known baseline cannot be ranked against the others yet.
    cursor.last_success.unwrap_or(DRAINED_SCORE)
}
