//! sealnote-store: SQLite persistence for users and notes
//!
//! Note bodies are encrypted before they touch the database and decrypted on
//! the way out; the store owns the [`BodyCipher`] so no caller can write a
//! body without its envelope. Identity uniqueness is enforced by UNIQUE
//! indexes rather than a check-then-insert sequence.
//!
//! A single connection behind an async mutex serializes persistence, which is
//! the only suspension point in request handling.

pub mod error;
mod notes;
mod users;

use std::path::Path;

use rusqlite::Connection;
use tokio::sync::Mutex;

use sealnote_crypto::BodyCipher;

pub use error::{StoreError, StoreResult};
pub use notes::NotePatch;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notes (
    id            TEXT PRIMARY KEY,
    owner_id      TEXT NOT NULL REFERENCES users(id),
    title         TEXT NOT NULL,
    preview       TEXT NOT NULL,
    body_envelope TEXT NOT NULL,
    tags          TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notes_owner ON notes(owner_id);
";

/// Credential store + note store over one SQLite database.
pub struct Store {
    conn: Mutex<Connection>,
    cipher: BodyCipher,
}

impl Store {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path, cipher: BodyCipher) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn, cipher)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory(cipher: BodyCipher) -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, cipher)
    }

    fn init(conn: Connection, cipher: BodyCipher) -> StoreResult<Self> {
        // journal_mode returns the resulting mode as a row
        let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            cipher,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealnote_crypto::KEY_SIZE;

    #[test]
    fn test_open_on_disk_persists_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sealnote.db");

        let store = Store::open(&path, BodyCipher::new([1u8; KEY_SIZE])).unwrap();
        drop(store);

        // Reopening must find the schema intact
        let store = Store::open(&path, BodyCipher::new([1u8; KEY_SIZE])).unwrap();
        let conn = store.conn.try_lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
