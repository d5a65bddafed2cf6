//! Term scheduler
//!
//! Picks the term to query next from the candidate set. Terms are ranked by
//! the score stored in their cursor hash, lowest first:
//! - a term never scored ranks first
//! - a term with an open gap ranks by its `last_success`, oldest first
//! - a drained term ranks last

use crate::collector::catalog::{CatalogError, TermCatalog};
use crate::storage::{term_key, SharedState, SCORE_FIELD, TERMS_KEY, TERM_HASH_PREFIX};
use crate::HarvestError;

/// Scheduler over the shared candidate set
pub struct TermScheduler {
    catalog: Box<dyn TermCatalog>,
}

impl TermScheduler {
    pub fn new(catalog: Box<dyn TermCatalog>) -> Self {
        Self { catalog }
    }

    /// Seeds the candidate set from the catalog if it is empty
    ///
    /// # Returns
    ///
    /// The number of terms added (0 if the set was already populated)
    pub fn ensure_candidates(&self, store: &mut dyn SharedState) -> Result<u64, HarvestError> {
        if store.set_cardinality(TERMS_KEY)? > 0 {
            return Ok(0);
        }
        tracing::info!("Candidate set is empty, seeding it from the term catalog");
        self.seed(store)
    }

    /// Adds every catalog term to the candidate set
    ///
    /// Terms already present keep their cursor and score.
    pub fn seed(&self, store: &mut dyn SharedState) -> Result<u64, HarvestError> {
        let terms = self.catalog.load_terms()?;
        let added = store.set_add(TERMS_KEY, &terms)?;
        tracing::info!(
            "Seeded {} new terms ({} in catalog)",
            added,
            terms.len()
        );
        Ok(added)
    }

    /// Returns the candidate with the lowest score
    ///
    /// An empty candidate set is seeded once before giving up.
    pub fn next_term(&self, store: &mut dyn SharedState) -> Result<String, HarvestError> {
        if let Some(term) = lowest_scored(store)? {
            return Ok(term);
        }

        self.ensure_candidates(store)?;
        lowest_scored(store)?.ok_or(HarvestError::Catalog(CatalogError::Empty))
    }

    /// Stores a term's new score and (re-)inserts it into the candidate set
    pub fn reschedule(
        &self,
        store: &mut dyn SharedState,
        term: &str,
        score: u64,
    ) -> Result<(), HarvestError> {
        store.hash_set_field(&term_key(term), SCORE_FIELD, &score.to_string())?;
        store.set_add(TERMS_KEY, &[term.to_string()])?;
        Ok(())
    }
}

/// Sorts the whole candidate set on every pick: O(n log n) per iteration
fn lowest_scored(store: &dyn SharedState) -> Result<Option<String>, HarvestError> {
    let ranked = store.sort_set_by_hash_score(TERMS_KEY, TERM_HASH_PREFIX, SCORE_FIELD)?;
    Ok(ranked.into_iter().next())
}
