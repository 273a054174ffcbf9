//! Profile table maintenance.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::runtime::{ChatMessage, ModelRuntime};
use crate::store::{HistoryStore, ProfileStore};

use super::extract::{CharacterParser, EXTRACTION_PROMPT};
use super::{CharacterEntry, ProfileRecord};

/// Keeps the profile table in step with the runtime's installed models
/// and fills in character lists by asking the models themselves.
pub struct ProfileService {
    store: Arc<ProfileStore>,
    history: Arc<HistoryStore>,
    runtime: Arc<dyn ModelRuntime>,
    parser: Arc<dyn CharacterParser>,
}

impl ProfileService {
    pub fn new(
        store: Arc<ProfileStore>,
        history: Arc<HistoryStore>,
        runtime: Arc<dyn ModelRuntime>,
        parser: Arc<dyn CharacterParser>,
    ) -> Self {
        Self {
            store,
            history,
            runtime,
            parser,
        }
    }

    /// Reconcile the table against the runtime's model list: drop
    /// records for models no longer installed, add fresh records for
    /// new ones, keep existing records untouched.
    ///
    /// If the model list cannot be fetched the table file is left
    /// exactly as it was.
    pub async fn synchronize(&self) -> Result<()> {
        let models = self
            .runtime
            .list_models()
            .await
            .context("failed to list installed models")?;

        let _guard = self.store.lock().await;
        let mut table = self.store.load().await?;

        let installed: HashSet<&str> = models.iter().map(String::as_str).collect();
        let before = table.len();
        table.retain(|name, _| installed.contains(name.as_str()));
        let removed = before - table.len();

        let mut added = 0;
        for model in &models {
            if !table.contains_key(model) {
                table.insert(model.clone(), ProfileRecord::new(model));
                added += 1;
            }
        }

        self.store.save(&table).await?;
        info!(models = models.len(), added, removed, "synchronized profile table");
        Ok(())
    }

    /// Synchronize only when no table has been written yet.
    pub async fn ensure_table(&self) -> Result<()> {
        if !self.store.exists() {
            self.synchronize().await?;
        }
        Ok(())
    }

    /// The whole table, in stored order. Builds the table on first use.
    pub async fn list_profiles(&self) -> Result<Vec<ProfileRecord>> {
        self.ensure_table().await?;
        let table = self.store.load().await?;
        Ok(table.into_values().collect())
    }

    /// Look up one model's profile record.
    ///
    /// For a model that has never been chatted with and has no
    /// characters recorded yet, this first asks the model to describe
    /// the characters it plays.
    pub async fn get_profile(&self, model: &str) -> Result<Option<ProfileRecord>> {
        self.ensure_table().await?;

        let table = self.store.load().await?;
        let Some(record) = table.get(model) else {
            return Ok(None);
        };

        if !record.is_multi_character && !self.history.exists(model) {
            self.refresh_characters(model).await;
            let table = self.store.load().await?;
            return Ok(table.get(model).cloned());
        }

        Ok(Some(record.clone()))
    }

    /// Ask the model for its character list and store the result.
    /// Failures are logged and leave the record as it was.
    async fn refresh_characters(&self, model: &str) {
        if let Err(err) = self.try_refresh_characters(model).await {
            warn!(model, error = %err, "character extraction failed");
        }
    }

    async fn try_refresh_characters(&self, model: &str) -> Result<()> {
        // The extraction exchange piggybacks on the existing transcript
        // for context but is never written back to it.
        let mut messages = self.history.load(model).await?;
        messages.push(ChatMessage::user(EXTRACTION_PROMPT));

        let reply = self.runtime.chat(model, &messages).await?;
        let reply = reply.trim();

        let parsed = if reply.eq_ignore_ascii_case("no") {
            Vec::new()
        } else {
            match self.parser.parse(reply) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!(model, error = %err, "unparseable character reply");
                    Vec::new()
                }
            }
        };

        let characters: Vec<CharacterEntry> = parsed
            .into_iter()
            .map(|c| CharacterEntry {
                name: c.name,
                description: c.description,
                profile_image: super::random_avatar_url(),
            })
            .collect();

        let _guard = self.store.lock().await;
        let mut table = self.store.load().await?;
        let Some(record) = table.get_mut(model) else {
            bail!("no profile record for model {model}");
        };
        record.set_characters(characters);
        self.store.save(&table).await?;

        info!(
            model,
            characters = table[model].characters.len(),
            "updated character list"
        );
        Ok(())
    }
}
