//! HTTP client for an Ollama-style model runtime.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::error::{RuntimeError, RuntimeResult};
use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, TagsResponse};
use super::ModelRuntime;

/// Client for a local model runtime exposing the Ollama listing API and
/// an OpenAI-compatible chat-completion API on the same base URL.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    /// Base URL of the runtime (e.g. "http://localhost:11434").
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        // Inference time is unbounded, so only connection setup gets a
        // deadline.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Handle a response and parse JSON or map to an error.
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> RuntimeResult<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| RuntimeError::Parse(e.to_string()))
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(RuntimeError::Api { status, message })
        }
    }
}

#[async_trait]
impl ModelRuntime for OllamaClient {
    async fn list_models(&self) -> RuntimeResult<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await?;
        let tags: TagsResponse = Self::handle_response(response).await?;

        Ok(tags.models.into_iter().map(|m| m.model).collect())
    }

    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> RuntimeResult<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ChatCompletionRequest { model, messages })
            .send()
            .await?;
        let completion: ChatCompletionResponse = Self::handle_response(response).await?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(RuntimeError::EmptyCompletion)
    }
}
