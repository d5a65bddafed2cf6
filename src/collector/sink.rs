//! Result sink
//!
//! Collected items are appended, tagged with their term, to the results list
//! of the shared store for downstream consumers. Nothing here deduplicates:
//! an item fetched twice is appended twice.

use crate::collector::search::SearchItem;
use crate::storage::{SharedState, RESULTS_KEY};
use crate::HarvestError;
use serde_json::Value;
use std::collections::BTreeMap;

/// Field added to every stored item naming the term it was collected for
pub const TERM_FIELD: &str = "search_term";

/// Encodes one item as a self-describing JSON record with sorted keys
pub fn encode_result(term: &str, item: &SearchItem) -> Result<String, serde_json::Error> {
    let term = Value::String(term.to_string());
    let mut record: BTreeMap<&str, &Value> =
        item.payload.iter().map(|(k, v)| (k.as_str(), v)).collect();
    record.insert(TERM_FIELD, &term);
    serde_json::to_string(&record)
}

/// Appends every item to the results list, returning how many were stored
pub fn append_results(
    store: &mut dyn SharedState,
    term: &str,
    items: &[SearchItem],
) -> Result<usize, HarvestError> {
    for item in items {
        store.list_push_tail(RESULTS_KEY, &encode_result(term, item)?)?;
    }
    Ok(items.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn item(id: u64, text: &str) -> SearchItem {
        let payload = json!({"text": text, "id": id});
        SearchItem {
            id,
            payload: payload.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn test_encode_adds_term_and_sorts_keys() {
        let encoded = encode_result("rust", &item(7, "hello")).unwrap();
        assert_eq!(encoded, r#"{"id":7,"search_term":"rust","text":"hello"}"#);
    }

    #[test]
    fn test_append_preserves_fetch_order() {
        let mut store = MemoryStore::new();
        let stored = append_results(&mut store, "rust", &[item(2, "b"), item(1, "a")]).unwrap();

        assert_eq!(stored, 2);
        let records = store.list_range(RESULTS_KEY, 0, 10).unwrap();
        let ids: Vec<u64> = records
            .iter()
            .map(|r| serde_json::from_str::<Value>(r).unwrap()["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
