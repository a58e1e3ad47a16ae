use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};

use super::{LevelRecord, LevelStore};

/// Map-backed level store
#[derive(Debug, Default)]
pub struct MemoryLevelStore {
    levels: RwLock<HashMap<String, LevelRecord>>,
}

impl MemoryLevelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with the given records
    pub fn with_levels(records: impl IntoIterator<Item = LevelRecord>) -> Self {
        let levels = records
            .into_iter()
            .map(|r| (r.module_level_id.clone(), r))
            .collect();
        Self {
            levels: RwLock::new(levels),
        }
    }

    pub fn len(&self) -> usize {
        self.levels.read().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LevelStore for MemoryLevelStore {
    fn fetch(&self, key: &str) -> Result<Option<LevelRecord>> {
        let levels = self
            .levels
            .read()
            .map_err(|_| anyhow!("Level store lock poisoned"))?;
        Ok(levels.get(key).cloned())
    }

    fn put(&self, record: &LevelRecord) -> Result<()> {
        if record.module_level_id.is_empty() {
            return Err(anyhow!("Level record has no moduleLevelID"));
        }
        let mut levels = self
            .levels
            .write()
            .map_err(|_| anyhow!("Level store lock poisoned"))?;
        levels.insert(record.module_level_id.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_and_put() {
        let store = MemoryLevelStore::new();
        assert!(store.is_empty());
        assert!(store.fetch("11").unwrap().is_none());

        store
            .put(&LevelRecord::new("11").with_solution("SELECT 1"))
            .unwrap();
        let record = store.fetch("11").unwrap().unwrap();
        assert_eq!(record.solution.as_deref(), Some("SELECT 1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_requires_key() {
        let store = MemoryLevelStore::new();
        assert!(store.put(&LevelRecord::default()).is_err());
    }

    #[test]
    fn test_with_levels() {
        let store = MemoryLevelStore::with_levels(vec![
            LevelRecord::new("11"),
            LevelRecord::new("12"),
        ]);
        assert_eq!(store.len(), 2);
        assert!(store.fetch("12").unwrap().is_some());
    }
}
