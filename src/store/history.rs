//! Per-model chat transcript store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::fs;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::runtime::ChatMessage;

use super::error::{StoreError, StoreResult};

/// Stores one JSON transcript file per model under
/// `<data_dir>/chat_histories/`.
///
/// Writers must hold the per-model lock across load-append-save so
/// concurrent requests on the same model serialize; a plain read can
/// call [`HistoryStore::load`] directly.
pub struct HistoryStore {
    dir: PathBuf,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl HistoryStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: data_dir.as_ref().join("chat_histories"),
            locks: DashMap::new(),
        }
    }

    /// Acquire the write lock for one model's transcript.
    pub async fn lock(&self, model: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(model.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Model identifiers may contain `/`, which the filesystem reserves.
    fn sanitize(model: &str) -> String {
        model.replace('/', "_")
    }

    fn file_path(&self, model: &str) -> PathBuf {
        self.dir
            .join(format!("chat_history_{}.json", Self::sanitize(model)))
    }

    /// Whether any transcript has been persisted for this model.
    pub fn exists(&self, model: &str) -> bool {
        self.file_path(model).exists()
    }

    /// Load a model's transcript; empty when none has been written yet.
    pub async fn load(&self, model: &str) -> StoreResult<Vec<ChatMessage>> {
        let path = self.file_path(model);
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        serde_json::from_str(&contents).map_err(|source| StoreError::json(&path, source))
    }

    /// Overwrite a model's transcript with the given messages.
    pub async fn save(&self, model: &str, messages: &[ChatMessage]) -> StoreResult<()> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.file_path(model);
        let contents =
            serde_json::to_string_pretty(messages).map_err(|source| StoreError::json(&path, source))?;
        fs::write(&path, contents).await?;
        debug!(model, path = %path.display(), "wrote transcript");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (HistoryStore, TempDir) {
        let dir = TempDir::new().unwrap();
        (HistoryStore::new(dir.path()), dir)
    }

    #[tokio::test]
    async fn test_load_missing_transcript_is_empty() {
        let (store, _dir) = test_store();
        assert!(!store.exists("llama3"));
        assert!(store.load("llama3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_preserves_order() {
        let (store, _dir) = test_store();

        let mut messages = Vec::new();
        for i in 0..5 {
            messages.push(ChatMessage::user(format!("question {i}")));
            messages.push(ChatMessage::assistant(format!("answer {i}")));
        }
        store.save("llama3", &messages).await.unwrap();

        let loaded = store.load("llama3").await.unwrap();
        assert_eq!(loaded, messages);
    }

    #[tokio::test]
    async fn test_slash_in_identifier_maps_to_underscore() {
        let (store, dir) = test_store();

        store
            .save("library/llama3", &[ChatMessage::user("hi")])
            .await
            .unwrap();

        let file = dir
            .path()
            .join("chat_histories/chat_history_library_llama3.json");
        assert!(file.exists());
        assert!(store.exists("library/llama3"));
    }
}
