//! Database schema definitions
//!
//! The shared state is modelled as three generic tables, one per value kind.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Set membership (candidate terms)
CREATE TABLE IF NOT EXISTS set_members (
    set_key TEXT NOT NULL,
    member TEXT NOT NULL,
    PRIMARY KEY (set_key, member)
);

-- Hash fields (per-term cursors and scores)
CREATE TABLE IF NOT EXISTS hash_fields (
    hash_key TEXT NOT NULL,
    field TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (hash_key, field)
);

-- List elements (rate-limit ledger, collected results)
-- position grows at the tail and shrinks at the head
CREATE TABLE IF NOT EXISTS list_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    list_key TEXT NOT NULL,
    position INTEGER NOT NULL,
    value TEXT NOT NULL,
    UNIQUE (list_key, position)
);

CREATE INDEX IF NOT EXISTS idx_list_items_key_position ON list_items(list_key, position);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
