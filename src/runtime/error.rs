//! Model runtime client error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for model runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur while talking to the model runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// HTTP request failed (connection, protocol, ...).
    #[error("request to model runtime failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The runtime answered with a non-success status.
    #[error("model runtime returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    /// Failed to parse the runtime's response body.
    #[error("failed to parse model runtime response: {0}")]
    Parse(String),

    /// The chat-completion response carried no choices.
    #[error("model runtime returned no completion choices")]
    EmptyCompletion,
}
