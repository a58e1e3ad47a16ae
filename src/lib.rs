#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! sqlspell - backend for a SQL-learning game
//!
//! sqlspell serves level records to the game frontend and grades the SQL a
//! learner submits for a level. Grading runs the submission and the level's
//! reference query in a throwaway SQLite database and compares the rows.
//! It can be used as both a command-line application and a library.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | `database` | Level stores and scratch databases | `rusqlite`, `uuid` |
//! | `lens` | Level lookup and query grading | `database` |
//! | `display` | Table formatting with `tabled` | `tabled` |
//! | `cli` | CLI binary with the HTTP server | All above + `clap`, `axum` |
//!
//! ```toml
//! # Grading only, no CLI or server
//! sqlspell = { version = "0.3", default-features = false, features = ["lens"] }
//!
//! # Default (CLI binary)
//! sqlspell = "0.3"
//! ```
//!
//! # Architecture
//!
//! - **[`database`]**: level stores, schema management and scratch databases
//! - **[`lens`]**: level lookup (`LevelLens`) and grading (`GradeLens`)
//! - **[`server`]**: HTTP routes for the game frontend (requires `cli`)
//! - **[`config`]**: configuration management
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sqlspell::database::SqliteLevelStore;
//! use sqlspell::lens::grade::GradeLens;
//!
//! let store = SqliteLevelStore::open("levels.sqlite3")?;
//! let lens = GradeLens::default();
//!
//! let result = lens.grade_level(&store, 1, 2, "SELECT name FROM spells");
//! println!("{}: {}", result.passed(), result.message);
//! ```

pub mod config;

#[cfg(feature = "database")]
pub mod database;

#[cfg(feature = "lens")]
pub mod lens;

// Server module - requires CLI feature
#[cfg(feature = "cli")]
pub mod server;

// =============================================================================
// Configuration (always available)
// =============================================================================

pub use config::SpellConfig;

// =============================================================================
// Database Module
// =============================================================================

#[cfg(feature = "database")]
pub use database::{
    level_key, DatabaseConn, LevelRecord, LevelStore, MemoryLevelStore, SchemaManager,
    SchemaStatus, ScratchDatabase, SqliteLevelStore, SCHEMA_VERSION,
};

// =============================================================================
// Lens Module
// =============================================================================

#[cfg(feature = "lens")]
pub use lens::grade::{GradeLens, GradeOptions, GradeOutcome, GradeResult};

#[cfg(feature = "lens")]
pub use lens::level::{LevelLens, LevelView};

#[cfg(feature = "lens")]
pub use lens::utils::OutputFormat;

// =============================================================================
// Server Module - requires "cli" feature
// =============================================================================

#[cfg(feature = "cli")]
pub use server::{create_axum_router, start_server, ServerConfig, ServerState};
