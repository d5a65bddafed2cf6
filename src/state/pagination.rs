//! Resumable pagination for one search term
//!
//! Every fetch is classified against the term's prior cursor into one of five
//! scenarios. The scenario alone determines the next cursor, so the whole
//! state machine is a single pure function of its inputs.
//!
//! | Scenario                        | oldest_id        | newest_id        | last_success     | success |
//! |---------------------------------|------------------|------------------|------------------|---------|
//! | `Base`                          | fetch newest     | fetch newest     | fetch newest     | true    |
//! | `CurrentFailLastSuccess`        | fetch oldest     | previous newest  | fetch newest     | false   |
//! | `CurrentFailLastFail`           | fetch oldest     | previous newest  | unchanged        | false   |
//! | `CurrentSuccessLastSuccess`     | fetch oldest     | fetch newest     | fetch newest     | true    |
//! | `CurrentSuccessLastFail`        | old last_success | old last_success | previous newest  | true    |

use crate::state::cursor::{ItemId, TermCursor};
use crate::state::score::score_for;
use std::fmt;

/// What a single fetch returned, reduced to the bounds the cursor cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The search returned no items
    Empty,

    /// The search returned at least one item
    Items {
        /// Identifier of the first (most recent) item
        newest_id: ItemId,
        /// Identifier of the last (oldest) item
        oldest_id: ItemId,
    },
}

impl FetchOutcome {
    /// Builds an outcome from identifiers ordered newest-first
    pub fn from_ids(ids: &[ItemId]) -> Self {
        match (ids.first(), ids.last()) {
            (Some(&newest_id), Some(&oldest_id)) => Self::Items {
                newest_id,
                oldest_id,
            },
            _ => Self::Empty,
        }
    }

    pub fn newest_id(&self) -> Option<ItemId> {
        match self {
            Self::Empty => None,
            Self::Items { newest_id, .. } => Some(*newest_id),
        }
    }

    pub fn oldest_id(&self) -> Option<ItemId> {
        match self {
            Self::Empty => None,
            Self::Items { oldest_id, .. } => Some(*oldest_id),
        }
    }
}

/// Classification of one fetch against the prior cursor
///
/// Each variant carries exactly the values its next cursor is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// First fetch ever, or an empty fetch: resync from whatever was returned
    Base { newest_id: Option<ItemId> },

    /// The fetch did not reach back to the previous high-water mark and the
    /// term was drained before: a new gap opens just below this fetch
    CurrentFailLastSuccess {
        previous_newest_id: ItemId,
        current_newest_id: ItemId,
        current_oldest_id: ItemId,
    },

    /// The fetch did not reach the previous high-water mark while an older gap
    /// is still open: keep the original `last_success`
    CurrentFailLastFail {
        previous_newest_id: ItemId,
        current_oldest_id: ItemId,
        last_success: Option<ItemId>,
    },

    /// The fetch overlapped the previous high-water mark and the term was drained
    CurrentSuccessLastSuccess {
        current_newest_id: ItemId,
        current_oldest_id: ItemId,
    },

    /// The fetch overlapped the previous high-water mark while a gap was open
    ///
    /// The cursor is rewound to the old `last_success` and marked drained even
    /// though no fetch ever spanned the gap, so the items between the two
    /// positions are never requested again.
    CurrentSuccessLastFail {
        previous_newest_id: ItemId,
        last_success: Option<ItemId>,
    },
}

impl Scenario {
    /// Classifies a fetch; the first matching row of the table wins
    pub fn classify(prior: &TermCursor, fetch: &FetchOutcome) -> Self {
        let (previous_newest_id, current_newest_id, current_oldest_id) =
            match (prior.newest_id, fetch) {
                (
                    Some(previous),
                    FetchOutcome::Items {
                        newest_id,
                        oldest_id,
                    },
                ) => (previous, *newest_id, *oldest_id),
                _ => {
                    return Self::Base {
                        newest_id: fetch.newest_id(),
                    }
                }
            };

        let gap = current_oldest_id > previous_newest_id;

        match (gap, prior.previous_succeeded()) {
            (true, true) => Self::CurrentFailLastSuccess {
                previous_newest_id,
                current_newest_id,
                current_oldest_id,
            },
            (true, false) => Self::CurrentFailLastFail {
                previous_newest_id,
                current_oldest_id,
                last_success: prior.last_success,
            },
            (false, true) => Self::CurrentSuccessLastSuccess {
                current_newest_id,
                current_oldest_id,
            },
            (false, false) => Self::CurrentSuccessLastFail {
                previous_newest_id,
                last_success: prior.last_success,
            },
        }
    }

    /// The cursor this scenario leaves behind
    pub fn next_cursor(&self) -> TermCursor {
        match *self {
            Self::Base { newest_id } => TermCursor {
                newest_id,
                oldest_id: newest_id,
                last_success: newest_id,
                success: Some(true),
            },
            Self::CurrentFailLastSuccess {
                previous_newest_id,
                current_newest_id,
                current_oldest_id,
            } => TermCursor {
                newest_id: Some(previous_newest_id),
                oldest_id: Some(current_oldest_id),
                last_success: Some(current_newest_id),
                success: Some(false),
            },
            Self::CurrentFailLastFail {
                previous_newest_id,
                current_oldest_id,
                last_success,
            } => TermCursor {
                newest_id: Some(previous_newest_id),
                oldest_id: Some(current_oldest_id),
                last_success,
                success: Some(false),
            },
            Self::CurrentSuccessLastSuccess {
                current_newest_id,
                current_oldest_id,
            } => TermCursor {
                newest_id: Some(current_newest_id),
                oldest_id: Some(current_oldest_id),
                last_success: Some(current_newest_id),
                success: Some(true),
            },
            Self::CurrentSuccessLastFail {
                previous_newest_id,
                last_success,
            } => TermCursor {
                newest_id: last_success,
                oldest_id: last_success,
                last_success: Some(previous_newest_id),
                success: Some(true),
            },
        }
    }

    /// Stable snake_case name used in logs and statistics
    pub fn name(&self) -> &'static str {
        match self {
            Self::Base { .. } => "base",
            Self::CurrentFailLastSuccess { .. } => "current_fail_last_success",
            Self::CurrentFailLastFail { .. } => "current_fail_last_fail",
            Self::CurrentSuccessLastSuccess { .. } => "current_success_last_success",
            Self::CurrentSuccessLastFail { .. } => "current_success_last_fail",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of running one fetch through the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub scenario: Scenario,
    pub cursor: TermCursor,
    pub score: u64,
}

/// Derives the next cursor and score for a term from its prior cursor and a fetch
pub fn derive_cursor(prior: &TermCursor, fetch: &FetchOutcome) -> Transition {
    let scenario = Scenario::classify(prior, fetch);
    let cursor = scenario.next_cursor();
    Transition {
        scenario,
        cursor,
        score: score_for(&cursor),
    }
}
