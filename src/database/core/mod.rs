//! Core database infrastructure
//!
//! - `DatabaseConn`: SQLite connection wrapper with per-use configuration
//! - `SchemaManager`: level store schema initialization and versioning
//! - `SchemaStatus`: schema state enumeration

mod connection;
mod schema;

pub use connection::{ConnProfile, DatabaseConn};
pub use schema::{SchemaDefinitions, SchemaManager, SchemaStatus, SCHEMA_VERSION};
