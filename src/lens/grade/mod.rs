//! Query grading lens
//!
//! Grades a learner's SQL against a level's reference query. Every call runs
//! in its own scratch database built from the level's schema script:
//!
//! 1. apply the schema script
//! 2. run the submitted statements, keeping the final statement's rows
//! 3. run the reference query
//! 4. compare both row sequences value by value, in order
//!
//! Grading never returns an error. Faults are reported through
//! [`GradeOutcome`], so callers can tell a broken query (`SqlFault`) from a
//! wrong one (`Failed`) without reading messages.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlspell::database::LevelRecord;
//! use sqlspell::lens::grade::{GradeLens, GradeOptions};
//!
//! let level = LevelRecord::new("11")
//!     .with_schema("CREATE TABLE t(x INT); INSERT INTO t VALUES (1),(2);")
//!     .with_solution("SELECT x FROM t ORDER BY x");
//!
//! let lens = GradeLens::new(GradeOptions::default());
//! let result = lens.grade(&level, "SELECT x FROM t ORDER BY x");
//! assert!(result.passed());
//! ```

mod statements;
mod types;

pub use statements::split_statements;
pub use types::{
    GradeOutcome, GradeResult, OutputRow, ScalarValue, INFRA_FAULT_MESSAGE,
    INVALID_CONFIG_MESSAGE, LEVEL_NOT_FOUND_MESSAGE, NO_STATEMENTS_MESSAGE,
};

use std::path::PathBuf;
use std::time::Duration;

use rusqlite::Connection;
use tracing::{error, info};

use crate::config::SpellConfig;
use crate::database::{level_key, LevelRecord, LevelStore, ScratchDatabase};

/// Settings for a [`GradeLens`]
#[derive(Debug, Clone)]
pub struct GradeOptions {
    /// Directory where scratch databases are created
    pub scratch_dir: PathBuf,
    /// Deadline for schema, submission and reference execution together
    pub statement_timeout: Option<Duration>,
}

impl Default for GradeOptions {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir(),
            statement_timeout: Some(Duration::from_secs(5)),
        }
    }
}

impl From<&SpellConfig> for GradeOptions {
    fn from(config: &SpellConfig) -> Self {
        Self {
            scratch_dir: config.scratch_path(),
            statement_timeout: config.statement_timeout(),
        }
    }
}

/// Rows produced by one query
struct QueryRows {
    columns: Vec<String>,
    rows: Vec<Vec<ScalarValue>>,
}

/// Submission and reference results side by side
struct Evaluation {
    submission: QueryRows,
    reference: QueryRows,
}

/// Query grader
pub struct GradeLens {
    options: GradeOptions,
}

impl GradeLens {
    pub fn new(options: GradeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GradeOptions {
        &self.options
    }

    /// Resolve a level from `store` and grade `submission` against it
    pub fn grade_level(
        &self,
        store: &dyn LevelStore,
        module_id: i64,
        level_id: i64,
        submission: &str,
    ) -> GradeResult {
        let key = level_key(module_id, level_id);
        match store.fetch(&key) {
            Ok(Some(level)) => self.grade(&level, submission),
            Ok(None) => {
                info!("Grading requested for unknown level {}", key);
                GradeResult::level_not_found()
            }
            Err(e) => {
                error!("Failed to load level {} for grading: {}", key, e);
                GradeResult::infra_fault()
            }
        }
    }

    /// Grade `submission` against `level`
    pub fn grade(&self, level: &LevelRecord, submission: &str) -> GradeResult {
        let (Some(schema), Some(solution)) = (level.schema_script(), level.reference_query())
        else {
            return GradeResult::invalid_config();
        };

        let reference = split_statements(solution);
        if reference.is_empty() {
            return GradeResult::invalid_config();
        }

        let statements = split_statements(submission);
        if statements.is_empty() {
            return GradeResult::no_statements();
        }

        let scratch = match ScratchDatabase::create_in(&self.options.scratch_dir) {
            Ok(scratch) => scratch,
            Err(e) => {
                error!("Failed to provision scratch database: {}", e);
                return GradeResult::infra_fault();
            }
        };

        let evaluation = {
            let _deadline = match self.options.statement_timeout {
                Some(timeout) => match scratch.arm_deadline(timeout) {
                    Ok(guard) => Some(guard),
                    Err(e) => {
                        error!("Failed to arm grading deadline: {}", e);
                        return GradeResult::infra_fault();
                    }
                },
                None => None,
            };
            evaluate(scratch.conn(), schema, &statements, &reference)
        };

        // Scratch file is removed here, before the verdict is built
        drop(scratch);

        match evaluation {
            Ok(evaluation) => self.verdict(level, evaluation),
            Err(e) => {
                let fault = self.describe_fault(&e);
                info!("Submission for level {} raised SQL fault: {}", level.module_level_id, fault);
                GradeResult::sql_fault(fault, level.hint_text())
            }
        }
    }

    fn verdict(&self, level: &LevelRecord, evaluation: Evaluation) -> GradeResult {
        let Evaluation {
            submission,
            reference,
        } = evaluation;

        let passed = submission.rows == reference.rows;

        let output = submission
            .rows
            .into_iter()
            .map(|values| OutputRow::from_parts(&submission.columns, values))
            .collect();

        if passed {
            GradeResult {
                outcome: GradeOutcome::Passed,
                columns: submission.columns,
                output,
                message: level.success_text().to_string(),
                hint: None,
            }
        } else {
            GradeResult {
                outcome: GradeOutcome::Failed,
                columns: submission.columns,
                output,
                message: level.hint_text().to_string(),
                hint: Some(level.hint_text().to_string()),
            }
        }
    }

    fn describe_fault(&self, err: &rusqlite::Error) -> String {
        match (err.sqlite_error_code(), self.options.statement_timeout) {
            (Some(rusqlite::ErrorCode::OperationInterrupted), Some(timeout)) => format!(
                "query exceeded the time limit of {} ms",
                timeout.as_millis()
            ),
            _ => err.to_string(),
        }
    }
}

impl Default for GradeLens {
    fn default() -> Self {
        Self::new(GradeOptions::default())
    }
}

fn evaluate(
    conn: &Connection,
    schema: &str,
    statements: &[String],
    reference: &[String],
) -> rusqlite::Result<Evaluation> {
    conn.execute_batch(schema)?;
    let submission = run_statements(conn, statements)?;
    let reference = run_statements(conn, reference)?;
    Ok(Evaluation {
        submission,
        reference,
    })
}

/// Run every statement for its effect, then collect the last one's rows
fn run_statements(conn: &Connection, statements: &[String]) -> rusqlite::Result<QueryRows> {
    let Some((last, leading)) = statements.split_last() else {
        return Ok(QueryRows {
            columns: Vec::new(),
            rows: Vec::new(),
        });
    };

    for sql in leading {
        execute_for_effect(conn, sql)?;
    }
    query_rows(conn, last)
}

fn execute_for_effect(conn: &Connection, sql: &str) -> rusqlite::Result<()> {
    {
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.raw_query();
        while rows.next()?.is_some() {}
    }
    // Each statement is committed on its own, even after an explicit BEGIN
    if !conn.is_autocommit() {
        conn.execute_batch("COMMIT")?;
    }
    Ok(())
}

fn query_rows(conn: &Connection, sql: &str) -> rusqlite::Result<QueryRows> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();

    let mut rows = Vec::new();
    let mut cursor = stmt.raw_query();
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            values.push(ScalarValue::from(row.get_ref(idx)?));
        }
        rows.push(values);
    }

    Ok(QueryRows { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryLevelStore, DEFAULT_HINT_MESSAGE, DEFAULT_SUCCESS_MESSAGE};
    use tempfile::TempDir;

    const SPELLS_SCHEMA: &str = "CREATE TABLE spells (id INTEGER PRIMARY KEY, name TEXT, effect TEXT);
        INSERT INTO spells VALUES (1, 'Lumos', 'Creates light');
        INSERT INTO spells VALUES (2, 'Alohomora', 'Unlocks doors');
        INSERT INTO spells VALUES (3, 'Wingardium Leviosa', 'Levitates objects');";

    fn lens_in(dir: &TempDir) -> GradeLens {
        GradeLens::new(GradeOptions {
            scratch_dir: dir.path().to_path_buf(),
            statement_timeout: Some(Duration::from_secs(5)),
        })
    }

    fn scratch_is_empty(dir: &TempDir) -> bool {
        std::fs::read_dir(dir.path()).unwrap().count() == 0
    }

    fn sample_level() -> LevelRecord {
        LevelRecord::new("11")
            .with_schema("CREATE TABLE t(x INT); INSERT INTO t VALUES (1),(2);")
            .with_solution("SELECT x FROM t ORDER BY x")
    }

    #[test]
    fn test_matching_submission_passes() {
        let dir = TempDir::new().unwrap();
        let result = lens_in(&dir).grade(&sample_level(), "SELECT x FROM t ORDER BY x");

        assert!(result.passed());
        assert_eq!(result.outcome, GradeOutcome::Passed);
        assert_eq!(result.message, DEFAULT_SUCCESS_MESSAGE);
        assert!(result.hint.is_none());
        assert!(!result.show_solution());
        assert_eq!(
            serde_json::to_value(&result.output).unwrap(),
            serde_json::json!([{"x": 1}, {"x": 2}])
        );
        assert!(scratch_is_empty(&dir));
    }

    #[test]
    fn test_different_order_fails() {
        let dir = TempDir::new().unwrap();
        let result = lens_in(&dir).grade(&sample_level(), "SELECT x FROM t ORDER BY x DESC");

        assert!(!result.passed());
        assert_eq!(result.outcome, GradeOutcome::Failed);
        assert!(!result.show_solution());
        assert_eq!(result.hint.as_deref(), Some(DEFAULT_HINT_MESSAGE));
        assert_eq!(result.message, DEFAULT_HINT_MESSAGE);
        assert_eq!(
            serde_json::to_value(&result.output).unwrap(),
            serde_json::json!([{"x": 2}, {"x": 1}])
        );
        assert!(scratch_is_empty(&dir));
    }

    #[test]
    fn test_level_messages_used() {
        let dir = TempDir::new().unwrap();
        let level = sample_level()
            .with_success_message("Spell cast!")
            .with_hint_message("Sort ascending");
        let lens = lens_in(&dir);

        assert_eq!(lens.grade(&level, "SELECT x FROM t ORDER BY x").message, "Spell cast!");

        let failed = lens.grade(&level, "SELECT x FROM t WHERE x = 1");
        assert_eq!(failed.message, "Sort ascending");
        assert_eq!(failed.hint.as_deref(), Some("Sort ascending"));
    }

    #[test]
    fn test_column_names_are_not_compared() {
        let dir = TempDir::new().unwrap();
        let result = lens_in(&dir).grade(&sample_level(), "SELECT x AS value FROM t ORDER BY x");

        assert!(result.passed());
        assert_eq!(result.columns, vec!["value"]);
        assert_eq!(result.output[0].get("value"), Some(&ScalarValue::Integer(1)));
    }

    #[test]
    fn test_extra_row_fails() {
        let dir = TempDir::new().unwrap();
        let result = lens_in(&dir).grade(
            &sample_level(),
            "SELECT x FROM t UNION ALL SELECT 3 ORDER BY 1",
        );
        assert_eq!(result.outcome, GradeOutcome::Failed);
        assert_eq!(result.output.len(), 3);
    }

    #[test]
    fn test_integer_and_real_compare_equal() {
        let dir = TempDir::new().unwrap();
        let level = LevelRecord::new("12")
            .with_schema("CREATE TABLE p(price REAL); INSERT INTO p VALUES (2.0);")
            .with_solution("SELECT price FROM p");
        let result = lens_in(&dir).grade(&level, "SELECT 2");
        assert!(result.passed());
    }

    #[test]
    fn test_sql_error_sets_show_solution() {
        let dir = TempDir::new().unwrap();
        let level = sample_level().with_hint_message("Use table t");
        let result = lens_in(&dir).grade(&level, "SELECT x FROM missing_table");

        assert!(!result.passed());
        assert!(result.show_solution());
        assert_eq!(result.hint.as_deref(), Some("Use table t"));
        match &result.outcome {
            GradeOutcome::SqlFault { fault } => assert!(fault.contains("no such table")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(result.error().unwrap().contains("no such table: missing_table"));
        assert!(result.output.is_empty());
        assert!(scratch_is_empty(&dir));
    }

    #[test]
    fn test_syntax_error_is_sql_fault() {
        let dir = TempDir::new().unwrap();
        let result = lens_in(&dir).grade(&sample_level(), "SELEC x FROM t");
        assert!(result.show_solution());
        assert!(result.error().unwrap().contains("syntax error"));
        assert!(scratch_is_empty(&dir));
    }

    #[test]
    fn test_broken_schema_is_sql_fault() {
        let dir = TempDir::new().unwrap();
        let level = LevelRecord::new("13")
            .with_schema("CREATE TABLE t(x INT; INSERT INTO t VALUES (1);")
            .with_solution("SELECT x FROM t");
        let result = lens_in(&dir).grade(&level, "SELECT x FROM t");
        assert!(matches!(result.outcome, GradeOutcome::SqlFault { .. }));
        assert!(scratch_is_empty(&dir));
    }

    #[test]
    fn test_attach_is_rejected() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let leaked = outside.path().join("leak.db");

        let submission = format!(
            "ATTACH '{}' AS x; CREATE TABLE x.t(a); SELECT x FROM t ORDER BY x",
            leaked.display()
        );
        let result = lens_in(&dir).grade(&sample_level(), &submission);

        assert!(!result.passed());
        assert!(matches!(result.outcome, GradeOutcome::SqlFault { .. }));
        assert!(!leaked.exists());
        assert!(scratch_is_empty(&dir));
    }

    #[test]
    fn test_vacuum_into_is_rejected() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let copy = outside.path().join("copy.db");

        let submission = format!("VACUUM INTO '{}'; SELECT x FROM t ORDER BY x", copy.display());
        let result = lens_in(&dir).grade(&sample_level(), &submission);

        assert!(matches!(result.outcome, GradeOutcome::SqlFault { .. }));
        assert!(!copy.exists());
        assert!(scratch_is_empty(&dir));
    }

    #[test]
    fn test_foreign_keys_follow_sqlite_default() {
        let dir = TempDir::new().unwrap();
        let level = LevelRecord::new("14")
            .with_schema(
                "CREATE TABLE c(id INT, p INT REFERENCES p(id));
                 CREATE TABLE p(id INT PRIMARY KEY);
                 INSERT INTO c VALUES (1, 99);",
            )
            .with_solution("SELECT id FROM c");

        let result = lens_in(&dir).grade(&level, "SELECT id FROM c");
        assert_eq!(result.outcome, GradeOutcome::Passed);
    }

    #[test]
    fn test_fault_in_leading_statement() {
        let dir = TempDir::new().unwrap();
        let result = lens_in(&dir).grade(
            &sample_level(),
            "INSERT INTO t VALUES (3); INSERT INTO nope VALUES (1); SELECT x FROM t ORDER BY x",
        );

        assert!(!result.passed());
        assert!(result.show_solution());
        match &result.outcome {
            GradeOutcome::SqlFault { fault } => assert!(fault.contains("no such table: nope")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(result.output.is_empty());
        assert!(scratch_is_empty(&dir));
    }

    #[test]
    fn test_missing_schema_is_invalid_config() {
        let dir = TempDir::new().unwrap();
        let level = LevelRecord::new("14").with_solution("SELECT 1");
        let result = lens_in(&dir).grade(&level, "SELECT 1");

        assert_eq!(result.outcome, GradeOutcome::InvalidConfig);
        assert_eq!(result.message, INVALID_CONFIG_MESSAGE);
        assert!(!result.passed());
        assert!(scratch_is_empty(&dir));
    }

    #[test]
    fn test_missing_solution_is_invalid_config() {
        let dir = TempDir::new().unwrap();
        let level = LevelRecord::new("15").with_schema("CREATE TABLE t(x INT);");
        let result = lens_in(&dir).grade(&level, "SELECT 1");
        assert_eq!(result.outcome, GradeOutcome::InvalidConfig);
    }

    #[test]
    fn test_invalid_config_never_provisions() {
        // A scratch directory that cannot exist: provisioning would fail loudly
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        let lens = GradeLens::new(GradeOptions {
            scratch_dir: blocker.join("scratch"),
            statement_timeout: None,
        });

        let level = LevelRecord::new("16");
        assert_eq!(lens.grade(&level, "SELECT 1").outcome, GradeOutcome::InvalidConfig);
        assert_eq!(
            lens.grade(&sample_level(), "SELECT 1").outcome,
            GradeOutcome::InfraFault
        );
    }

    #[test]
    fn test_empty_submission() {
        let dir = TempDir::new().unwrap();
        let lens = lens_in(&dir);

        for submission in ["", "   ", ";;", "-- nothing here"] {
            let result = lens.grade(&sample_level(), submission);
            assert_eq!(result.outcome, GradeOutcome::NoStatements);
            assert_eq!(result.message, NO_STATEMENTS_MESSAGE);
        }
        assert!(scratch_is_empty(&dir));
    }

    #[test]
    fn test_multi_statement_submission() {
        let dir = TempDir::new().unwrap();
        let result = lens_in(&dir).grade(
            &sample_level(),
            "CREATE VIEW sorted AS SELECT x FROM t; INSERT INTO t VALUES (0); SELECT x FROM sorted ORDER BY x",
        );

        // The reference runs after the submission and sees the inserted row too
        assert!(result.passed());
        assert_eq!(result.output.len(), 3);
    }

    #[test]
    fn test_explicit_transaction_in_submission() {
        let dir = TempDir::new().unwrap();
        let result = lens_in(&dir).grade(
            &sample_level(),
            "BEGIN; DELETE FROM t WHERE x = 2; SELECT x FROM t ORDER BY x",
        );
        assert!(result.passed());
        assert_eq!(result.output.len(), 1);
    }

    #[test]
    fn test_final_statement_without_rows() {
        let dir = TempDir::new().unwrap();
        let result = lens_in(&dir).grade(&sample_level(), "DELETE FROM t");

        // Reference then sees an empty table, matching the empty output
        assert!(result.passed());
        assert!(result.output.is_empty());
        assert!(result.columns.is_empty());
    }

    #[test]
    fn test_output_preserves_column_order() {
        let dir = TempDir::new().unwrap();
        let level = LevelRecord::new("11")
            .with_schema(SPELLS_SCHEMA)
            .with_solution("SELECT * FROM spells");
        let result = lens_in(&dir).grade(&level, "SELECT * FROM spells;");

        assert!(result.passed());
        let json = serde_json::to_string(&result.output[0]).unwrap();
        assert_eq!(json, r#"{"id":1,"name":"Lumos","effect":"Creates light"}"#);
    }

    #[test]
    fn test_timeout_is_sql_fault() {
        let dir = TempDir::new().unwrap();
        let lens = GradeLens::new(GradeOptions {
            scratch_dir: dir.path().to_path_buf(),
            statement_timeout: Some(Duration::from_millis(100)),
        });
        let result = lens.grade(
            &sample_level(),
            "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n) SELECT COUNT(*) FROM n",
        );

        assert!(result.show_solution());
        assert!(result.message.contains("time limit of 100 ms"));
        assert!(scratch_is_empty(&dir));
    }

    #[test]
    fn test_grade_level_resolves_store() {
        let dir = TempDir::new().unwrap();
        let store = MemoryLevelStore::with_levels(vec![sample_level()]);
        let lens = lens_in(&dir);

        let result = lens.grade_level(&store, 1, 1, "SELECT x FROM t ORDER BY x");
        assert!(result.passed());

        let missing = lens.grade_level(&store, 9, 9, "SELECT 1");
        assert_eq!(missing.outcome, GradeOutcome::LevelNotFound);
        assert_eq!(missing.message, LEVEL_NOT_FOUND_MESSAGE);
    }

    struct BrokenStore;

    impl LevelStore for BrokenStore {
        fn fetch(&self, _key: &str) -> anyhow::Result<Option<LevelRecord>> {
            Err(anyhow::anyhow!("store unreachable"))
        }

        fn put(&self, _record: &LevelRecord) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("store unreachable"))
        }
    }

    #[test]
    fn test_store_failure_is_infra_fault() {
        let dir = TempDir::new().unwrap();
        let result = lens_in(&dir).grade_level(&BrokenStore, 1, 1, "SELECT 1");

        assert_eq!(result.outcome, GradeOutcome::InfraFault);
        assert_eq!(result.error(), Some(INFRA_FAULT_MESSAGE));
        assert!(!result.show_solution());
    }
}
