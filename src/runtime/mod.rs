//! Model runtime access.
//!
//! The runtime is an external collaborator reachable over HTTP: a
//! model-listing endpoint plus an OpenAI-compatible chat-completion
//! endpoint. Handlers talk to it through the [`ModelRuntime`] trait so
//! tests can substitute a scripted implementation.

mod client;
mod error;
mod types;

pub use client::OllamaClient;
pub use error::{RuntimeError, RuntimeResult};
pub use types::{ChatMessage, Role};

use async_trait::async_trait;

/// Capabilities the backend needs from a model-serving runtime.
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    /// Identifiers of all locally available models.
    async fn list_models(&self) -> RuntimeResult<Vec<String>>;

    /// Send an ordered message history to a named model and return the
    /// next assistant reply.
    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> RuntimeResult<String>;
}
