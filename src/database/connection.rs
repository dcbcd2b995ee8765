//! Opening the LinkShelf SQLite file.
//!
//! The host process and the background scheduler share one file, so every
//! file-backed connection runs in WAL mode with a busy timeout before the
//! schema migrations are applied.

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use super::migrations;

/// How long a statement waits on a locked database before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A migrated SQLite connection holding the `kv_store` table.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) the database file at `path`, switches it to WAL
    /// journaling and brings the schema up to date.
    ///
    /// # Arguments
    /// * `path` - Location of the database file, usually
    ///   `<data dir>/linkshelf.db`.
    ///
    /// # Errors
    /// Returns `rusqlite::Error` if the file cannot be opened, the pragmas
    /// are rejected or a migration fails.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        Self::migrated(conn)
    }

    /// Opens a private in-memory database with the current schema.
    ///
    /// # Errors
    /// Returns `rusqlite::Error` if a migration fails.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::migrated(Connection::open_in_memory()?)
    }

    fn migrated(conn: Connection) -> Result<Self, rusqlite::Error> {
        migrations::run_all(&conn)?;
        Ok(Self { conn })
    }

    /// Schema version recorded in this database.
    pub fn schema_version(&self) -> i32 {
        migrations::get_schema_version(&self.conn)
    }

    /// Journal mode reported by SQLite (`wal` for files, `memory` otherwise).
    ///
    /// # Errors
    /// Returns `rusqlite::Error` if the pragma query fails.
    pub fn journal_mode(&self) -> Result<String, rusqlite::Error> {
        self.conn.pragma_query_value(None, "journal_mode", |row| row.get(0))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
