//! In-memory store
//!
//! Non-durable implementation of `SharedState`, used by tests and for
//! exercising the collector without a database file.

use crate::storage::traits::{sort_score, SharedState, StoreResult};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// `SharedState` held entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    sets: HashMap<String, BTreeSet<String>>,
    hashes: HashMap<String, HashMap<String, String>>,
    lists: HashMap<String, VecDeque<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SharedState for MemoryStore {
    fn set_cardinality(&self, key: &str) -> StoreResult<u64> {
        Ok(self.sets.get(key).map_or(0, |s| s.len() as u64))
    }

    fn set_add(&mut self, key: &str, members: &[String]) -> StoreResult<u64> {
        let set = self.sets.entry(key.to_string()).or_default();
        let added = members
            .iter()
            .filter(|m| set.insert((*m).clone()))
            .count();
        Ok(added as u64)
    }

    fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn sort_set_by_hash_score(
        &self,
        key: &str,
        hash_prefix: &str,
        score_field: &str,
    ) -> StoreResult<Vec<String>> {
        let Some(set) = self.sets.get(key) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<(u64, &String)> = set
            .iter()
            .map(|member| {
                let raw = self
                    .hashes
                    .get(&format!("{}{}", hash_prefix, member))
                    .and_then(|h| h.get(score_field))
                    .map(String::as_str);
                (sort_score(raw), member)
            })
            .collect();

        scored.sort();
        Ok(scored.into_iter().map(|(_, m)| m.clone()).collect())
    }

    fn hash_get_fields(&self, key: &str, fields: &[&str]) -> StoreResult<Vec<Option<String>>> {
        let hash = self.hashes.get(key);
        Ok(fields
            .iter()
            .map(|f| hash.and_then(|h| h.get(*f)).cloned())
            .collect())
    }

    fn hash_set_fields(&mut self, key: &str, fields: &[(&str, String)]) -> StoreResult<()> {
        let hash = self.hashes.entry(key.to_string()).or_default();
        for (field, value) in fields {
            hash.insert((*field).to_string(), value.clone());
        }
        Ok(())
    }

    fn hash_set_field(&mut self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        self.hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    fn list_len(&self, key: &str) -> StoreResult<u64> {
        Ok(self.lists.get(key).map_or(0, |l| l.len() as u64))
    }

    fn list_pop_head(&mut self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.lists.get_mut(key).and_then(VecDeque::pop_front))
    }

    fn list_push_head(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.lists
            .entry(key.to_string())
            .or_default()
            .push_front(value.to_string());
        Ok(())
    }

    fn list_push_tail(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.lists
            .entry(key.to_string())
            .or_default()
            .push_back(value.to_string());
        Ok(())
    }

    fn list_range(&self, key: &str, start: u64, limit: u64) -> StoreResult<Vec<String>> {
        Ok(self
            .lists
            .get(key)
            .map(|l| {
                l.iter()
                    .skip(start as usize)
                    .take(limit as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
