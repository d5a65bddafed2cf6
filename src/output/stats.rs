//! Statistics read back from the shared store
//!
//! This module provides functionality for inspecting what a collector has
//! persisted: the candidate set, per-term cursors and scores, the rate-limit
//! ledger and the results list.

use crate::collector::parse_timestamp;
use crate::state::{TermCursor, DRAINED_SCORE};
use crate::storage::{
    load_cursor, term_key, SharedState, LEDGER_KEY, RESULTS_KEY, SCORE_FIELD, TERMS_KEY,
    TERM_HASH_PREFIX,
};
use crate::HarvestError;
use chrono::{DateTime, Utc};

/// Scheduling state of one term as stored
#[derive(Debug, Clone, PartialEq)]
pub struct TermReport {
    pub term: String,

    /// Stored score; `None` if the term was never scored
    pub score: Option<u64>,

    pub cursor: TermCursor,
}

impl TermReport {
    /// Whether the term has an open gap waiting to be filled
    pub fn has_gap(&self) -> bool {
        self.score.is_some_and(|s| s != DRAINED_SCORE)
    }
}

/// Snapshot of everything in the shared store
#[derive(Debug, Clone, PartialEq)]
pub struct StoreReport {
    /// Terms in the order the scheduler would pick them
    pub terms: Vec<TermReport>,

    /// Entries currently in the rate-limit ledger
    pub ledger_len: u64,

    /// Earliest and latest recorded query times
    pub ledger_oldest: Option<DateTime<Utc>>,
    pub ledger_newest: Option<DateTime<Utc>>,

    /// Items appended to the results list
    pub results: u64,
}

impl StoreReport {
    pub fn candidates(&self) -> usize {
        self.terms.len()
    }

    pub fn gapped_terms(&self) -> usize {
        self.terms.iter().filter(|t| t.has_gap()).count()
    }

    pub fn unscored_terms(&self) -> usize {
        self.terms.iter().filter(|t| t.score.is_none()).count()
    }
}

/// Loads a report from the store without modifying it
pub fn load_report(store: &dyn SharedState) -> Result<StoreReport, HarvestError> {
    let ranked = store.sort_set_by_hash_score(TERMS_KEY, TERM_HASH_PREFIX, SCORE_FIELD)?;

    let mut terms = Vec::with_capacity(ranked.len());
    for term in ranked {
        let score = store
            .hash_get_fields(&term_key(&term), &[SCORE_FIELD])?
            .into_iter()
            .next()
            .flatten()
            .and_then(|raw| raw.parse().ok());
        let cursor = load_cursor(store, &term)?;
        terms.push(TermReport {
            term,
            score,
            cursor,
        });
    }

    let ledger_len = store.list_len(LEDGER_KEY)?;
    let ledger_oldest = ledger_entry(store, 0)?;
    let ledger_newest = match ledger_len {
        0 => None,
        len => ledger_entry(store, len - 1)?,
    };

    Ok(StoreReport {
        terms,
        ledger_len,
        ledger_oldest,
        ledger_newest,
        results: store.list_len(RESULTS_KEY)?,
    })
}

fn ledger_entry(
    store: &dyn SharedState,
    index: u64,
) -> Result<Option<DateTime<Utc>>, HarvestError> {
    Ok(store
        .list_range(LEDGER_KEY, index, 1)?
        .first()
        .and_then(|raw| parse_timestamp(raw)))
}

/// Prints a report to stdout in a formatted manner
pub fn print_report(report: &StoreReport) {
    println!("=== Collection Statistics ===\n");

    println!("Overview:");
    println!("  Candidate terms: {}", report.candidates());
    println!("  Terms with open gaps: {}", report.gapped_terms());
    println!("  Terms never collected: {}", report.unscored_terms());
    println!("  Results stored: {}", report.results);
    println!();

    println!("Rate-Limit Ledger:");
    println!("  Entries: {}", report.ledger_len);
    if let Some(oldest) = report.ledger_oldest {
        println!("  Oldest query: {}", oldest.to_rfc3339());
    }
    if let Some(newest) = report.ledger_newest {
        println!("  Newest query: {}", newest.to_rfc3339());
    }
    println!();

    if !report.terms.is_empty() {
        println!("Terms (in scheduling order):");
        for t in &report.terms {
            let score = match t.score {
                None => "unscored".to_string(),
                Some(DRAINED_SCORE) => "drained".to_string(),
                Some(s) => s.to_string(),
            };
            println!(
                "  {}: score={} newest={} oldest={} last_success={} success={}",
                t.term,
                score,
                display_id(t.cursor.newest_id),
                display_id(t.cursor.oldest_id),
                display_id(t.cursor.last_success),
                t.cursor
                    .success
                    .map_or_else(|| "-".to_string(), |s| s.to_string())
            );
        }
    }
}

fn display_id(id: Option<u64>) -> String {
    id.map_or_else(|| "-".to_string(), |id| id.to_string())
}
