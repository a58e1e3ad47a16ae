//! Database module
//!
//! This module provides all database functionality for sqlspell, organized into:
//!
//! - **core**: SQLite connection wrapper and level store schema management
//! - **levels**: level records and the stores that serve them
//! - **scratch**: throwaway per-request databases used for grading
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/           # Foundation
//! │   ├── connection  # SQLite DatabaseConn wrapper
//! │   └── schema      # level store schema definitions and management
//! │
//! ├── levels/         # Level storage
//! │   ├── sqlite      # persistent key/document store (SQLite)
//! │   └── memory      # map-backed store
//! │
//! └── scratch         # ephemeral grading databases, removed on drop
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use sqlspell::database::{level_key, LevelStore, SqliteLevelStore};
//!
//! let store = SqliteLevelStore::open("~/.sqlspell/sqlspell-levels.sqlite3")?;
//! store.import_json_file("levels.json")?;
//!
//! if let Some(level) = store.fetch(&level_key(1, 2))? {
//!     println!("{}", level.task.unwrap_or_default());
//! }
//! ```

pub mod core;
pub mod levels;
pub mod scratch;

pub use core::{
    ConnProfile, DatabaseConn, SchemaDefinitions, SchemaManager, SchemaStatus, SCHEMA_VERSION,
};

pub use levels::{
    level_key, LevelRecord, LevelStore, LevelSummary, MemoryLevelStore, SqliteLevelStore,
    DEFAULT_HINT_MESSAGE, DEFAULT_SUCCESS_MESSAGE,
};

pub use scratch::{DeadlineGuard, ScratchDatabase};
