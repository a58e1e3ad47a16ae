//! SQLite-backed level store
//!
//! Levels are kept as JSON documents in a single key/document table so that
//! attributes the game adds later need no schema change.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::OptionalExtension;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{LevelRecord, LevelStore};
use crate::database::core::{DatabaseConn, SchemaManager, SchemaStatus};

/// Key and last update time of a stored level
#[derive(Debug, Clone, Serialize)]
pub struct LevelSummary {
    pub module_level_id: String,
    pub updated_at: DateTime<Utc>,
}

/// Persistent level store on a SQLite file
pub struct SqliteLevelStore {
    db: Mutex<DatabaseConn>,
}

impl SqliteLevelStore {
    /// Open the level store at the specified path
    ///
    /// If the database doesn't exist, it will be created and initialized.
    /// An outdated or corrupted schema is reset, dropping stored levels.
    pub fn open(path: &str) -> Result<Self> {
        let db = DatabaseConn::open_path(path)?;
        Self::prepare(&db)?;
        info!("Opened level store at {}", path);
        Ok(Self { db: Mutex::new(db) })
    }

    /// Create an in-memory level store (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let db = DatabaseConn::open_in_memory()?;
        SchemaManager::new(&db.conn).initialize()?;
        Ok(Self { db: Mutex::new(db) })
    }

    fn prepare(db: &DatabaseConn) -> Result<()> {
        let schema = SchemaManager::new(&db.conn);

        match schema.check_status()? {
            SchemaStatus::Current => {
                debug!("Level store schema is current");
            }
            SchemaStatus::NotInitialized => {
                info!("Initializing level store schema");
                schema.initialize()?;
            }
            SchemaStatus::NeedsMigration { from, to } => {
                info!("Level store needs migration from v{} to v{}", from, to);
                schema.reset()?;
                schema.initialize()?;
            }
            SchemaStatus::Incompatible {
                database_version,
                required_version,
            } => {
                info!(
                    "Level store schema incompatible (db: v{}, required: v{}), resetting",
                    database_version, required_version
                );
                schema.reset()?;
                schema.initialize()?;
            }
            SchemaStatus::Corrupted => {
                info!("Level store schema corrupted, resetting");
                schema.reset()?;
                schema.initialize()?;
            }
        }

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, DatabaseConn>> {
        self.db
            .lock()
            .map_err(|_| anyhow!("Level store connection lock poisoned"))
    }

    /// Number of stored levels
    pub fn count(&self) -> Result<u64> {
        self.lock()?.table_count("levels")
    }

    /// Keys of all stored levels, ordered by key
    pub fn list(&self) -> Result<Vec<LevelSummary>> {
        let db = self.lock()?;
        let mut stmt = db
            .conn
            .prepare("SELECT module_level_id, updated_at FROM levels ORDER BY module_level_id")
            .map_err(|e| anyhow!("Failed to prepare level listing: {}", e))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(|e| anyhow!("Failed to list levels: {}", e))?;

        let mut summaries = Vec::new();
        for row in rows {
            let (module_level_id, ts) = row.map_err(|e| anyhow!("Failed to read level row: {}", e))?;
            let updated_at = Utc
                .timestamp_opt(ts, 0)
                .single()
                .unwrap_or_default();
            summaries.push(LevelSummary {
                module_level_id,
                updated_at,
            });
        }
        Ok(summaries)
    }

    /// Load level records from a JSON file
    ///
    /// Accepts either an array of level objects, or an object mapping keys
    /// to level objects (a level without `moduleLevelID` takes its map key).
    /// Returns the number of levels written.
    pub fn import_json_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read level file {:?}: {}", path, e))?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse level file {:?}: {}", path, e))?;

        let records = records_from_json(value)?;
        self.put_all(&records)?;
        info!("Imported {} levels from {:?}", records.len(), path);
        Ok(records.len())
    }

    /// Write several levels in one transaction
    pub fn put_all(&self, records: &[LevelRecord]) -> Result<()> {
        let db = self.lock()?;
        let tx = db.transaction()?;
        for record in records {
            write_record(&tx, record)?;
        }
        tx.commit()
            .map_err(|e| anyhow!("Failed to commit level import: {}", e))?;
        Ok(())
    }
}

fn records_from_json(value: Value) -> Result<Vec<LevelRecord>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| {
                serde_json::from_value::<LevelRecord>(item)
                    .map_err(|e| anyhow!("Invalid level record: {}", e))
            })
            .collect(),
        Value::Object(map) => map
            .into_iter()
            .map(|(key, item)| {
                let mut record = serde_json::from_value::<LevelRecord>(item)
                    .map_err(|e| anyhow!("Invalid level record '{}': {}", key, e))?;
                if record.module_level_id.is_empty() {
                    record.module_level_id = key;
                }
                Ok(record)
            })
            .collect(),
        _ => Err(anyhow!(
            "Level file must hold an array or an object of level records"
        )),
    }
}

fn write_record(conn: &rusqlite::Connection, record: &LevelRecord) -> Result<()> {
    if record.module_level_id.is_empty() {
        return Err(anyhow!("Level record has no moduleLevelID"));
    }
    let document = serde_json::to_string(record)
        .map_err(|e| anyhow!("Failed to serialize level {}: {}", record.module_level_id, e))?;
    conn.execute(
        "INSERT OR REPLACE INTO levels (module_level_id, record, updated_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![record.module_level_id, document, Utc::now().timestamp()],
    )
    .map_err(|e| anyhow!("Failed to store level {}: {}", record.module_level_id, e))?;
    Ok(())
}

impl LevelStore for SqliteLevelStore {
    fn fetch(&self, key: &str) -> Result<Option<LevelRecord>> {
        let db = self.lock()?;
        let document: Option<String> = db
            .conn
            .query_row(
                "SELECT record FROM levels WHERE module_level_id = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| anyhow!("Failed to fetch level {}: {}", key, e))?;

        let Some(document) = document else {
            debug!("Level {} not found", key);
            return Ok(None);
        };

        let record = serde_json::from_str::<LevelRecord>(&document)
            .map_err(|e| anyhow!("Malformed level record {}: {}", key, e))?;
        Ok(Some(record))
    }

    fn put(&self, record: &LevelRecord) -> Result<()> {
        let db = self.lock()?;
        write_record(&db.conn, record)
    }
}
