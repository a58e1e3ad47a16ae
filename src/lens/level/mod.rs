//! Level lookup lens
//!
//! Resolves level records from a [`LevelStore`] and shapes them for the
//! client: the public view never carries the reference solution, and the
//! solution view carries nothing else.

use anyhow::Result;
use serde::Serialize;

use crate::database::{LevelRecord, LevelStore};

/// What a level lookup returns to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LevelView {
    /// The full record minus its solution
    Public(LevelRecord),
    /// Only the reference solution
    Solution { solution: Option<String> },
}

/// Level lookup operations over a store
pub struct LevelLens<'a> {
    store: &'a dyn LevelStore,
}

impl<'a> LevelLens<'a> {
    pub fn new(store: &'a dyn LevelStore) -> Self {
        Self { store }
    }

    /// Point lookup of a level record
    pub fn fetch(&self, key: &str) -> Result<Option<LevelRecord>> {
        self.store.fetch(key)
    }

    /// Look up a level and build the client view
    pub fn view(&self, key: &str, get_solution: bool) -> Result<Option<LevelView>> {
        let view = self.fetch(key)?.map(|record| {
            if get_solution {
                LevelView::Solution {
                    solution: record.solution,
                }
            } else {
                LevelView::Public(record.without_solution())
            }
        });
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryLevelStore;
    use serde_json::json;

    fn store() -> MemoryLevelStore {
        let mut record = LevelRecord::new("12")
            .with_schema("CREATE TABLE creatures(name TEXT, can_fly INT);")
            .with_solution("SELECT name FROM creatures WHERE can_fly = 1")
            .with_hint_message("Filter on can_fly");
        record.task = Some("Find the flying creatures".to_string());
        MemoryLevelStore::with_levels(vec![record])
    }

    #[test]
    fn test_public_view_strips_solution() {
        let store = store();
        let lens = LevelLens::new(&store);

        let view = lens.view("12", false).unwrap().unwrap();
        let value = serde_json::to_value(&view).unwrap();
        assert!(value.get("solution").is_none());
        assert_eq!(value["moduleLevelID"], "12");
        assert_eq!(value["task"], "Find the flying creatures");
        assert_eq!(value["hintMessage"], "Filter on can_fly");
    }

    #[test]
    fn test_solution_view_only_has_solution() {
        let store = store();
        let lens = LevelLens::new(&store);

        let view = lens.view("12", true).unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            json!({"solution": "SELECT name FROM creatures WHERE can_fly = 1"})
        );
    }

    #[test]
    fn test_missing_level() {
        let store = store();
        let lens = LevelLens::new(&store);

        assert!(lens.fetch("99").unwrap().is_none());
        assert!(lens.view("99", true).unwrap().is_none());
    }

    #[test]
    fn test_solution_view_without_stored_solution() {
        let store = MemoryLevelStore::with_levels(vec![LevelRecord::new("13")]);
        let lens = LevelLens::new(&store);

        let view = lens.view("13", true).unwrap().unwrap();
        assert_eq!(serde_json::to_value(&view).unwrap(), json!({"solution": null}));
    }
}
