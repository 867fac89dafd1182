//! SQLite schema shared by the template and contract stores.
//!
//! Stores open a fresh `Connection` per operation, so this module only needs
//! to make sure the tables exist before the server starts accepting requests.

use rusqlite::Connection;
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS templates (
    name        TEXT PRIMARY KEY,
    html        TEXT NOT NULL,
    uploaded_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS contracts (
    id           TEXT PRIMARY KEY,
    template     TEXT NOT NULL,
    generated_at TEXT NOT NULL,
    size         INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS contracts_generated_at ON contracts (generated_at);
CREATE TABLE IF NOT EXISTS notifications (
    contract_id TEXT NOT NULL REFERENCES contracts (id),
    success     INTEGER NOT NULL,
    detail      TEXT,
    recorded_at TEXT NOT NULL
);
";

/// Creates the database file (and its parent directory) if needed and applies the schema.
pub fn init_schema(path: &Path) -> Result<(), crate::error::StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
