//! Test utilities and common setup.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::Router;
use tempfile::TempDir;

use rolecall::api::{create_router, AppState};
use rolecall::runtime::{ChatMessage, ModelRuntime, RuntimeError, RuntimeResult};

/// Runtime double: a fixed model list and one canned chat reply.
/// Without a reply every chat call fails as if the backend were down.
pub struct ScriptedRuntime {
    models: Vec<String>,
    reply: Option<String>,
}

impl ScriptedRuntime {
    pub fn new(models: &[&str]) -> Self {
        Self {
            models: models.iter().map(|m| m.to_string()).collect(),
            reply: None,
        }
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = Some(reply.to_string());
        self
    }
}

#[async_trait]
impl ModelRuntime for ScriptedRuntime {
    async fn list_models(&self) -> RuntimeResult<Vec<String>> {
        Ok(self.models.clone())
    }

    async fn chat(&self, _model: &str, _messages: &[ChatMessage]) -> RuntimeResult<String> {
        self.reply.clone().ok_or(RuntimeError::Api {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "model backend offline".to_string(),
        })
    }
}

/// Create a test application backed by a temp data directory.
/// The TempDir must outlive the returned router.
pub fn test_app(runtime: ScriptedRuntime) -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let state = AppState::new(Arc::new(runtime), dir.path());
    (create_router(state), dir)
}
