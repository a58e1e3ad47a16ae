//! Level records and the stores that hold them
//!
//! A level is one exercise of the game: the script that builds its tables,
//! the instructor's reference query and the feedback shown to the learner.
//! Levels are addressed by a single string key built from the module and
//! level numbers (see [`level_key`]).
//!
//! Two stores are provided:
//! - [`SqliteLevelStore`]: persistent key/document table on disk
//! - [`MemoryLevelStore`]: map-backed store for tests and embedding

mod memory;
mod sqlite;

pub use memory::MemoryLevelStore;
pub use sqlite::{LevelSummary, SqliteLevelStore};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message shown when a submission matches the reference result
pub const DEFAULT_SUCCESS_MESSAGE: &str =
    "Congratulations! Your query returned the expected result.";

/// Message shown when a submission runs but returns a different result
pub const DEFAULT_HINT_MESSAGE: &str = "Your query ran, but the result doesn't match. Try again!";

/// Build the store key for a module/level pair
///
/// The key is the decimal module number immediately followed by the decimal
/// level number, e.g. module 1 level 2 is `"12"`.
pub fn level_key(module_id: i64, level_id: i64) -> String {
    format!("{}{}", module_id, level_id)
}

/// Stored definition of one level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelRecord {
    /// Composite store key
    #[serde(rename = "moduleLevelID", default)]
    pub module_level_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Task text shown to the learner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,

    /// Code pre-filled in the editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_code: Option<String>,

    /// Script that creates and populates the level's tables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Reference query the submission is graded against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint_message: Option<String>,

    /// Any other attributes stored with the level, returned untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LevelRecord {
    /// Create an empty record for the given key
    pub fn new(module_level_id: impl Into<String>) -> Self {
        Self {
            module_level_id: module_level_id.into(),
            ..Default::default()
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_solution(mut self, solution: impl Into<String>) -> Self {
        self.solution = Some(solution.into());
        self
    }

    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    pub fn with_hint_message(mut self, message: impl Into<String>) -> Self {
        self.hint_message = Some(message.into());
        self
    }

    /// Schema script, if present and not blank
    pub fn schema_script(&self) -> Option<&str> {
        non_blank(self.schema.as_deref())
    }

    /// Reference query, if present and not blank
    pub fn reference_query(&self) -> Option<&str> {
        non_blank(self.solution.as_deref())
    }

    /// Success message with the default applied
    pub fn success_text(&self) -> &str {
        non_blank(self.success_message.as_deref()).unwrap_or(DEFAULT_SUCCESS_MESSAGE)
    }

    /// Hint message with the default applied
    pub fn hint_text(&self) -> &str {
        non_blank(self.hint_message.as_deref()).unwrap_or(DEFAULT_HINT_MESSAGE)
    }

    /// Copy of this record with the reference query removed
    pub fn without_solution(&self) -> LevelRecord {
        LevelRecord {
            solution: None,
            ..self.clone()
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Point-lookup access to level records
///
/// Request handlers only ever call [`LevelStore::fetch`]; `put` exists for
/// operator tooling that loads levels into the store.
pub trait LevelStore: Send + Sync {
    /// Look up a level by its composite key
    fn fetch(&self, key: &str) -> Result<Option<LevelRecord>>;

    /// Insert or replace a level under its `module_level_id`
    fn put(&self, record: &LevelRecord) -> Result<()>;
}
