//! SQLite persistence for canonical tables.
//!
//! RULE: Only the store talks to the database.
//! The engine never reads from the store; callers load a table here and
//! hand it to the engine like any other in-memory table.

use crate::error::PeerResult;
use rusqlite::Connection;

mod import;
mod metric;

pub use import::ImportRecord;

pub struct PeerStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl PeerStore {
    pub fn open(path: &str) -> PeerResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PeerResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> PeerResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_canonical.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_import_log.sql"))?;
        Ok(())
    }
}
