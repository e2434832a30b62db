//! # Voyager Database
//!
//! Single SQLite database for Voyager persistence, stored at `.voyager/voyager.db`.
//! Holds the conversation vector collections used by session memory.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Schema version for migrations
const SCHEMA_VERSION: i32 = 1;

/// Default on-disk location
pub const DEFAULT_DB_PATH: &str = ".voyager/voyager.db";

/// Database manager shared by the vector index and anything else that persists state
pub struct VoyagerDb {
    conn: Arc<Mutex<Connection>>,
}

impl VoyagerDb {
    /// Open or create the database at `.voyager/voyager.db`
    pub fn open() -> Result<Self> {
        Self::open_at(DEFAULT_DB_PATH)
    }

    /// Open database at a specific path (useful for testing)
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let conn = Connection::open(path.as_ref()).context("Failed to open voyager database")?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Get a shared connection for use by other modules
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// Current schema version recorded in the database
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let version = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )?;
        Ok(version)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
            [],
        )?;

        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        if current_version < 1 {
            migrate_v1(&conn)?;
            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )?;
            tracing::info!(version = SCHEMA_VERSION, "Applied database migration");
        }

        Ok(())
    }
}

/// Migration to version 1 - conversation vectors
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS conversation_vectors (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            document TEXT NOT NULL,
            embedding BLOB NOT NULL,
            dimension INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (collection, id)
        )
        "#,
        [],
    )
    .context("Failed to create conversation_vectors table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_conversation_vectors_collection ON conversation_vectors(collection)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_open_runs_migrations() {
        let path = ".voyager/test_voyager_db.db";
        let _ = fs::remove_file(path);

        let db = VoyagerDb::open_at(path).unwrap();
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);

        let conn = db.connection();
        let conn = conn.lock().unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'conversation_vectors'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
        drop(conn);

        drop(db);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_reopen_keeps_version() {
        let path = ".voyager/test_voyager_reopen.db";
        let _ = fs::remove_file(path);

        {
            let db = VoyagerDb::open_at(path).unwrap();
            assert_eq!(db.schema_version().unwrap(), 1);
        }
        let db = VoyagerDb::open_at(path).unwrap();
        assert_eq!(db.schema_version().unwrap(), 1);

        drop(db);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_in_memory() {
        let db = VoyagerDb::open_in_memory().unwrap();
        assert_eq!(db.schema_version().unwrap(), 1);
    }
}
