//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the SharedState trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{sort_score, SharedState, StoreResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path`
    pub fn new(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl SharedState for SqliteStore {
    // ===== Sets =====

    fn set_cardinality(&self, key: &str) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM set_members WHERE set_key = ?1",
            params![key],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn set_add(&mut self, key: &str, members: &[String]) -> StoreResult<u64> {
        let tx = self.conn.transaction()?;
        let mut added = 0u64;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO set_members (set_key, member) VALUES (?1, ?2)")?;
            for member in members {
                added += stmt.execute(params![key, member])? as u64;
            }
        }
        tx.commit()?;
        Ok(added)
    }

    fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT member FROM set_members WHERE set_key = ?1 ORDER BY member")?;
        let members = stmt
            .query_map(params![key], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(members)
    }

    fn sort_set_by_hash_score(
        &self,
        key: &str,
        hash_prefix: &str,
        score_field: &str,
    ) -> StoreResult<Vec<String>> {
        // Scores may exceed i64, so ordering happens here rather than in SQL.
        let mut stmt = self.conn.prepare(
            "SELECT m.member, h.value
             FROM set_members m
             LEFT JOIN hash_fields h
               ON h.hash_key = ?2 || m.member AND h.field = ?3
             WHERE m.set_key = ?1",
        )?;

        let mut scored = stmt
            .query_map(params![key, hash_prefix, score_field], |row| {
                let member: String = row.get(0)?;
                let score: Option<String> = row.get(1)?;
                Ok((sort_score(score.as_deref()), member))
            })?
            .collect::<Result<Vec<(u64, String)>, _>>()?;

        scored.sort();
        Ok(scored.into_iter().map(|(_, m)| m).collect())
    }

    // ===== Hashes =====

    fn hash_get_fields(&self, key: &str, fields: &[&str]) -> StoreResult<Vec<Option<String>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM hash_fields WHERE hash_key = ?1 AND field = ?2")?;

        let mut values = Vec::with_capacity(fields.len());
        for field in fields {
            let value: Option<String> = stmt
                .query_row(params![key, field], |row| row.get(0))
                .optional()?;
            values.push(value);
        }
        Ok(values)
    }

    fn hash_set_fields(&mut self, key: &str, fields: &[(&str, String)]) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO hash_fields (hash_key, field, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(hash_key, field) DO UPDATE SET value = excluded.value",
            )?;
            for (field, value) in fields {
                stmt.execute(params![key, field, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn hash_set_field(&mut self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO hash_fields (hash_key, field, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(hash_key, field) DO UPDATE SET value = excluded.value",
            params![key, field, value],
        )?;
        Ok(())
    }

    // ===== Lists =====

    fn list_len(&self, key: &str) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM list_items WHERE list_key = ?1",
            params![key],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn list_pop_head(&mut self, key: &str) -> StoreResult<Option<String>> {
        let tx = self.conn.transaction()?;
        let head: Option<(i64, String)> = tx
            .query_row(
                "SELECT id, value FROM list_items WHERE list_key = ?1 ORDER BY position LIMIT 1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        if let Some((id, _)) = &head {
            tx.execute("DELETE FROM list_items WHERE id = ?1", params![id])?;
        }
        tx.commit()?;

        Ok(head.map(|(_, value)| value))
    }

    fn list_push_head(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO list_items (list_key, position, value)
             SELECT ?1, COALESCE(MIN(position), 1) - 1, ?2 FROM list_items WHERE list_key = ?1",
            params![key, value],
        )?;
        Ok(())
    }

    fn list_push_tail(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO list_items (list_key, position, value)
             SELECT ?1, COALESCE(MAX(position), -1) + 1, ?2 FROM list_items WHERE list_key = ?1",
            params![key, value],
        )?;
        Ok(())
    }

    fn list_range(&self, key: &str, start: u64, limit: u64) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT value FROM list_items WHERE list_key = ?1
             ORDER BY position LIMIT ?2 OFFSET ?3",
        )?;
        let values = stmt
            .query_map(params![key, limit as i64, start as i64], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_in_memory() {
        let store = SqliteStore::new_in_memory();
        assert!(store.is_ok());
    }

    #[test]
    fn test_set_operations() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let terms = vec!["rust".to_string(), "tokio".to_string()];

        assert_eq!(store.set_add("terms", &terms).unwrap(), 2);
        assert_eq!(store.set_add("terms", &terms[..1]).unwrap(), 0);
        assert_eq!(store.set_cardinality("terms").unwrap(), 2);
        assert_eq!(store.set_members("terms").unwrap(), terms);
    }

    #[test]
    fn test_hash_upsert_replaces_existing() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        store
            .hash_set_fields("h", &[("a", "1".to_string()), ("b", "2".to_string())])
            .unwrap();
        store.hash_set_field("h", "a", "10").unwrap();

        let values = store.hash_get_fields("h", &["a", "b", "c"]).unwrap();
        assert_eq!(
            values,
            vec![Some("10".to_string()), Some("2".to_string()), None]
        );
    }

    #[test]
    fn test_list_head_and_tail() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        store.list_push_tail("l", "b").unwrap();
        store.list_push_tail("l", "c").unwrap();
        store.list_push_head("l", "a").unwrap();
        assert_eq!(store.list_range("l", 0, 10).unwrap(), vec!["a", "b", "c"]);
        assert_eq!(store.list_range("l", 1, 1).unwrap(), vec!["b"]);

        assert_eq!(store.list_pop_head("l").unwrap().as_deref(), Some("a"));
        assert_eq!(store.list_pop_head("l").unwrap().as_deref(), Some("b"));
        assert_eq!(store.list_len("l").unwrap(), 1);

        store.list_pop_head("l").unwrap();
        assert_eq!(store.list_pop_head("l").unwrap(), None);

        // An emptied list restarts cleanly at both ends
        store.list_push_head("l", "x").unwrap();
        store.list_push_tail("l", "y").unwrap();
        assert_eq!(store.list_range("l", 0, 10).unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn test_sort_by_linked_score_handles_u64_range() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let terms: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        store.set_add("terms", &terms).unwrap();

        store.hash_set_field("term:a", "score", "50").unwrap();
        store
            .hash_set_field("term:b", "score", &u64::MAX.to_string())
            .unwrap();
        store.hash_set_field("term:c", "score", "30").unwrap();

        let order = store
            .sort_set_by_hash_score("terms", "term:", "score")
            .unwrap();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvest.db");

        {
            let mut store = SqliteStore::new(&path).unwrap();
            store.list_push_tail("ledger", "1.5").unwrap();
            store.hash_set_field("term:rust", "newest_id", "100").unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(store.list_len("ledger").unwrap(), 1);
        assert_eq!(
            store.hash_get_fields("term:rust", &["newest_id"]).unwrap(),
            vec![Some("100".to_string())]
        );
    }
}
