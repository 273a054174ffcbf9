//! HTTP handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::profiles::ProfileRecord;
use crate::runtime::ChatMessage;

use super::error::{ApiError, ApiResult};
use super::state::AppState;

/// Control tokens some chat templates leak into completions, e.g.
/// `<|im_1|>`.
static CONTROL_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<\|im_\d+\|>").expect("valid control token pattern"));

fn strip_control_tokens(text: &str) -> String {
    CONTROL_TOKEN_RE.replace_all(text, "").into_owned()
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /models
pub async fn list_models(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    let models = state
        .runtime
        .list_models()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(models))
}

/// GET /profiles
pub async fn list_profiles(State(state): State<AppState>) -> ApiResult<Json<Vec<ProfileRecord>>> {
    let profiles = state.profiles.list_profiles().await?;
    Ok(Json(profiles))
}

/// Body for a profile lookup. An unknown model is not an error at the
/// HTTP level; clients probe freely.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ProfileLookupResponse {
    Found(ProfileRecord),
    NotFound { error: &'static str },
}

/// GET /profiles/{model_name}
///
/// Model identifiers containing `/` arrive percent-encoded; the path
/// capture is already decoded here.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(model_name): Path<String>,
) -> ApiResult<Json<ProfileLookupResponse>> {
    let response = match state.profiles.get_profile(&model_name).await? {
        Some(record) => ProfileLookupResponse::Found(record),
        None => ProfileLookupResponse::NotFound {
            error: "Model not found",
        },
    };
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// POST /chat
///
/// Appends the user's prompt to the model's transcript, forwards the
/// whole transcript to the runtime, persists the raw assistant reply
/// and returns the reply with control tokens stripped.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let (Some(model_name), Some(prompt)) = (request.model_name, request.prompt) else {
        return Err(ApiError::bad_request("model_name and prompt are required"));
    };
    if model_name.is_empty() || prompt.is_empty() {
        return Err(ApiError::bad_request("model_name and prompt are required"));
    }

    let _guard = state.history.lock(&model_name).await;

    let mut messages = state.history.load(&model_name).await?;
    messages.push(ChatMessage::user(prompt));

    let raw = state
        .runtime
        .chat(&model_name, &messages)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    let cleaned = strip_control_tokens(&raw);

    messages.push(ChatMessage::assistant(raw));
    state.history.save(&model_name, &messages).await?;

    Ok(Json(ChatResponse { response: cleaned }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub model_name: Option<String>,
}

/// GET /history/load?model_name=...
pub async fn load_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    let Some(model_name) = query.model_name.filter(|m| !m.is_empty()) else {
        return Err(ApiError::bad_request("model_name is required"));
    };

    let messages = state.history.load(&model_name).await?;
    Ok(Json(messages))
}
