//! Profile table store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use tokio::fs;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::profiles::ProfileRecord;

use super::error::{StoreError, StoreResult};

/// Model identifier → profile record, in insertion order.
pub type ProfileTable = IndexMap<String, ProfileRecord>;

/// Stores the whole profile table in one `profile.json` file under the
/// data directory.
///
/// The table is small and always rewritten whole. Writers must hold the
/// store lock across their read-modify-write.
pub struct ProfileStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl ProfileStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join("profile.json"),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Acquire the table write lock.
    pub async fn lock(&self) -> OwnedMutexGuard<()> {
        self.lock.clone().lock_owned().await
    }

    /// Whether a table file has been persisted yet.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the table; empty when no file exists yet.
    pub async fn load(&self) -> StoreResult<ProfileTable> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ProfileTable::new())
            }
            Err(err) => return Err(err.into()),
        };

        serde_json::from_str(&contents).map_err(|source| StoreError::json(&self.path, source))
    }

    /// Overwrite the table file.
    pub async fn save(&self, table: &ProfileTable) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(table)
            .map_err(|source| StoreError::json(&self.path, source))?;
        fs::write(&self.path, contents).await?;
        debug!(records = table.len(), path = %self.path.display(), "wrote profile table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (ProfileStore, TempDir) {
        let dir = TempDir::new().unwrap();
        (ProfileStore::new(dir.path()), dir)
    }

    #[tokio::test]
    async fn test_load_missing_table_is_empty() {
        let (store, _dir) = test_store();
        assert!(!store.exists());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_preserves_insertion_order() {
        let (store, _dir) = test_store();

        let mut table = ProfileTable::new();
        for name in ["zeta", "alpha", "mid"] {
            table.insert(name.to_string(), ProfileRecord::new(name));
        }
        store.save(&table).await.unwrap();
        assert!(store.exists());

        let loaded = store.load().await.unwrap();
        let names: Vec<&str> = loaded.keys().map(String::as_str).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }
}
