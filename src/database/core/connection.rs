//! Database connection management
//!
//! This module provides the SQLite connection wrapper shared by the level
//! store and the per-request scratch databases.

use anyhow::{anyhow, Result};
use rusqlite::limits::Limit;
use rusqlite::Connection;

/// How a connection is going to be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnProfile {
    /// Long-lived level store, read concurrently by request handlers
    Store,
    /// Throwaway database owned by a single grading call
    Scratch,
}

/// Core database connection wrapper
///
/// `DatabaseConn` provides a thin wrapper around SQLite connections,
/// handling both file-based and in-memory databases with consistent
/// configuration and error handling.
pub struct DatabaseConn {
    pub conn: Connection,
}

impl DatabaseConn {
    /// Open a database at the specified path
    ///
    /// If the path is `None`, an in-memory database is created.
    pub fn open(path: Option<&str>, profile: ConnProfile) -> Result<Self> {
        let conn = match path {
            Some(p) => Connection::open(p)
                .map_err(|e| anyhow!("Failed to open database at '{}': {}", p, e))?,
            None => Connection::open_in_memory()
                .map_err(|e| anyhow!("Failed to create in-memory database: {}", e))?,
        };

        let db = DatabaseConn { conn };
        db.configure(profile, path.is_some())?;
        Ok(db)
    }

    /// Open a level store database at the specified path
    pub fn open_path(path: &str) -> Result<Self> {
        Self::open(Some(path), ConnProfile::Store)
    }

    /// Create an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(None, ConnProfile::Store)
    }

    /// Open a scratch database at the specified path
    pub fn open_scratch(path: &str) -> Result<Self> {
        Self::open(Some(path), ConnProfile::Scratch)
    }

    fn configure(&self, profile: ConnProfile, on_disk: bool) -> Result<()> {
        if profile == ConnProfile::Store && on_disk {
            // WAL mode for concurrent readers
            let _: String = self
                .conn
                .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
                .map_err(|e| anyhow!("Failed to set journal mode: {}", e))?;

            self.conn
                .execute("PRAGMA synchronous=NORMAL", [])
                .map_err(|e| anyhow!("Failed to set synchronous mode: {}", e))?;
        }

        // Store temp tables in memory
        self.conn
            .execute("PRAGMA temp_store=MEMORY", [])
            .map_err(|e| anyhow!("Failed to set temp store: {}", e))?;

        match profile {
            ConnProfile::Store => {
                self.conn
                    .execute("PRAGMA foreign_keys=ON", [])
                    .map_err(|e| anyhow!("Failed to enable foreign keys: {}", e))?;
            }
            ConnProfile::Scratch => {
                // No ATTACH (and so no VACUUM INTO): the scratch file is the only
                // file a submission can touch. Foreign keys keep the SQLite default.
                self.conn
                    .set_limit(Limit::SQLITE_LIMIT_ATTACHED, 0)
                    .map_err(|e| anyhow!("Failed to limit attached databases: {}", e))?;
            }
        }

        Ok(())
    }

    /// Execute a SQL statement
    pub fn execute(&self, sql: &str) -> Result<usize> {
        self.conn
            .execute(sql, [])
            .map_err(|e| anyhow!("Failed to execute SQL: {}", e))
    }

    /// Begin an unchecked transaction
    pub fn transaction(&self) -> Result<rusqlite::Transaction<'_>> {
        self.conn
            .unchecked_transaction()
            .map_err(|e| anyhow!("Failed to begin transaction: {}", e))
    }

    /// Get the row count for a table
    pub fn table_count(&self, table_name: &str) -> Result<u64> {
        let query = format!("SELECT COUNT(*) FROM {}", table_name);
        let count: u64 = self
            .conn
            .query_row(&query, [], |row| row.get(0))
            .map_err(|e| anyhow!("Failed to get table count: {}", e))?;
        Ok(count)
    }
}
