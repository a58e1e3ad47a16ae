use std::fmt;

use rusqlite::types::ValueRef;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Message for a level that lacks its schema or reference query
pub const INVALID_CONFIG_MESSAGE: &str =
    "Invalid level configuration: the level is missing its schema or solution.";

/// Message for a submission without any executable statement
pub const NO_STATEMENTS_MESSAGE: &str = "No valid SQL statements found.";

/// Message for a module/level pair the store does not know
pub const LEVEL_NOT_FOUND_MESSAGE: &str = "Level not found or incomplete data.";

/// Message for faults outside the learner's SQL
pub const INFRA_FAULT_MESSAGE: &str = "An unexpected error occurred while grading your query.";

/// One SQLite value from a result row
#[derive(Debug, Clone)]
pub enum ScalarValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        use ScalarValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Integer(a), Integer(b)) => a == b,
            (Real(a), Real(b)) => a == b,
            // 1 and 1.0 are the same answer
            (Integer(i), Real(r)) | (Real(r), Integer(i)) => (*i as f64) == *r,
            (Text(a), Text(b)) => a == b,
            (Blob(a), Blob(b)) => a == b,
            _ => false,
        }
    }
}

impl From<ValueRef<'_>> for ScalarValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => ScalarValue::Null,
            ValueRef::Integer(i) => ScalarValue::Integer(i),
            ValueRef::Real(r) => ScalarValue::Real(r),
            ValueRef::Text(t) => ScalarValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => ScalarValue::Blob(b.to_vec()),
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScalarValue::Null => serializer.serialize_none(),
            ScalarValue::Integer(i) => serializer.serialize_i64(*i),
            ScalarValue::Real(r) => serializer.serialize_f64(*r),
            ScalarValue::Text(t) => serializer.serialize_str(t),
            ScalarValue::Blob(b) => serializer.serialize_str(&hex(b)),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "NULL"),
            ScalarValue::Integer(i) => write!(f, "{}", i),
            ScalarValue::Real(r) => write!(f, "{}", r),
            ScalarValue::Text(t) => write!(f, "{}", t),
            ScalarValue::Blob(b) => write!(f, "x'{}'", hex(b)),
        }
    }
}

/// One output row as column name/value pairs in result column order
///
/// Serializes as a JSON object whose keys keep the column order. When a
/// column name repeats, the later value replaces the earlier one in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutputRow {
    cells: Vec<(String, ScalarValue)>,
}

impl OutputRow {
    pub fn from_parts(columns: &[String], values: Vec<ScalarValue>) -> Self {
        let mut cells: Vec<(String, ScalarValue)> = Vec::with_capacity(columns.len());
        for (name, value) in columns.iter().zip(values) {
            match cells.iter_mut().find(|(existing, _)| existing == name) {
                Some(cell) => cell.1 = value,
                None => cells.push((name.clone(), value)),
            }
        }
        Self { cells }
    }

    pub fn get(&self, column: &str) -> Option<&ScalarValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn cells(&self) -> &[(String, ScalarValue)] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Serialize for OutputRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Kind of verdict reached by a grading call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GradeOutcome {
    /// Result set equals the reference result set
    Passed,
    /// Submission ran but produced a different result set
    Failed,
    /// Level lacks a schema script or reference query
    InvalidConfig,
    /// Submission holds no executable statement
    NoStatements,
    /// No level stored under the requested key
    LevelNotFound,
    /// SQL execution failed while applying the schema or running a query
    SqlFault { fault: String },
    /// Failure outside the learner's SQL (store, filesystem)
    InfraFault,
}

/// Verdict and output of one grading call
#[derive(Debug, Clone, PartialEq)]
pub struct GradeResult {
    pub outcome: GradeOutcome,
    /// Column names of the submission's final statement
    pub columns: Vec<String>,
    /// Rows of the submission's final statement, in its own order
    pub output: Vec<OutputRow>,
    pub message: String,
    pub hint: Option<String>,
}

impl GradeResult {
    fn without_output(outcome: GradeOutcome, message: impl Into<String>) -> Self {
        Self {
            outcome,
            columns: Vec::new(),
            output: Vec::new(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn invalid_config() -> Self {
        Self::without_output(GradeOutcome::InvalidConfig, INVALID_CONFIG_MESSAGE)
    }

    pub fn no_statements() -> Self {
        Self::without_output(GradeOutcome::NoStatements, NO_STATEMENTS_MESSAGE)
    }

    pub fn level_not_found() -> Self {
        Self::without_output(GradeOutcome::LevelNotFound, LEVEL_NOT_FOUND_MESSAGE)
    }

    pub fn infra_fault() -> Self {
        Self::without_output(GradeOutcome::InfraFault, INFRA_FAULT_MESSAGE)
    }

    pub fn sql_fault(fault: impl Into<String>, hint: &str) -> Self {
        let fault = fault.into();
        Self {
            message: format!("Error executing SQL: {}", fault),
            outcome: GradeOutcome::SqlFault { fault },
            columns: Vec::new(),
            output: Vec::new(),
            hint: Some(hint.to_string()),
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self.outcome, GradeOutcome::Passed)
    }

    /// Whether the UI should offer the reference solution
    pub fn show_solution(&self) -> bool {
        matches!(self.outcome, GradeOutcome::SqlFault { .. })
    }

    /// Error text for outcomes that are not a verdict on a valid query
    pub fn error(&self) -> Option<&str> {
        match self.outcome {
            GradeOutcome::Passed | GradeOutcome::Failed => None,
            _ => Some(&self.message),
        }
    }
}
