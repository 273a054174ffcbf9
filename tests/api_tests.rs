//! API integration tests.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{test_app, ScriptedRuntime};

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .method(Method::GET)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .method(Method::POST)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _dir) = test_app(ScriptedRuntime::new(&[]));

    let (status, json) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_list_models() {
    let (app, _dir) = test_app(ScriptedRuntime::new(&["llama3", "mistral"]));

    let (status, json) = get(app, "/models").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!(["llama3", "mistral"]));
}

#[tokio::test]
async fn test_list_profiles_creates_records() {
    let (app, _dir) = test_app(ScriptedRuntime::new(&["llama3", "mistral"]));

    let (status, json) = get(app, "/profiles").await;
    assert_eq!(status, StatusCode::OK);

    let profiles = json.as_array().unwrap();
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[0]["name"], "llama3");
    assert_eq!(profiles[1]["name"], "mistral");
    for profile in profiles {
        assert!(profile["profile_image"]
            .as_str()
            .unwrap()
            .starts_with("https://avatar.iran.liara.run/public/"));
        assert_eq!(profile["IsMultiCharacter"], false);
        assert_eq!(profile["characters"], json!([]));
    }
}

#[tokio::test]
async fn test_get_profile_unknown_model() {
    let (app, _dir) = test_app(ScriptedRuntime::new(&["llama3"]));

    let (status, json) = get(app, "/profiles/missing").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"error": "Model not found"}));
}

#[tokio::test]
async fn test_get_profile_extracts_characters() {
    let runtime = ScriptedRuntime::new(&["llama3"]).with_reply(
        "[{Character: 'Ava', desc: 'A stern captain.'}, {Character: 'Brin', desc: 'A thief'}]",
    );
    let (app, dir) = test_app(runtime);

    let (status, json) = get(app, "/profiles/llama3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "llama3");
    assert_eq!(json["IsMultiCharacter"], true);

    let characters = json["characters"].as_array().unwrap();
    assert_eq!(characters.len(), 2);
    assert_eq!(characters[0]["name"], "Ava");
    assert_eq!(characters[1]["description"], "A thief");

    // The extraction exchange must not leave a transcript behind.
    assert!(!dir
        .path()
        .join("chat_histories/chat_history_llama3.json")
        .exists());
}

#[tokio::test]
async fn test_get_profile_percent_encoded_identifier() {
    let runtime = ScriptedRuntime::new(&["library/llama3"]).with_reply("NO");
    let (app, _dir) = test_app(runtime);

    let (status, json) = get(app, "/profiles/library%2Fllama3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "library/llama3");
    assert_eq!(json["characters"], json!([]));
    assert_eq!(json["IsMultiCharacter"], false);
}

#[tokio::test]
async fn test_chat_requires_model_and_prompt() {
    let (app, dir) = test_app(ScriptedRuntime::new(&["llama3"]));

    let (status, json) = post_json(app, "/chat", json!({"model_name": "llama3"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "model_name and prompt are required");

    assert!(!dir.path().join("chat_histories").exists());
}

#[tokio::test]
async fn test_chat_strips_control_tokens_but_persists_raw() {
    let runtime = ScriptedRuntime::new(&["llama3"]).with_reply("Hello<|im_1|> there");
    let (app, _dir) = test_app(runtime);

    let (status, json) = post_json(
        app.clone(),
        "/chat",
        json!({"model_name": "llama3", "prompt": "hi"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["response"], "Hello there");

    let (status, history) = get(app, "/history/load?model_name=llama3").await;
    assert_eq!(status, StatusCode::OK);

    let messages = history.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "hi");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "Hello<|im_1|> there");
}

#[tokio::test]
async fn test_chat_upstream_failure() {
    let (app, _dir) = test_app(ScriptedRuntime::new(&["llama3"]));

    let (status, json) = post_json(
        app.clone(),
        "/chat",
        json!({"model_name": "llama3", "prompt": "hi"}),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("model backend offline"));

    // The failed exchange is not persisted.
    let (_, history) = get(app, "/history/load?model_name=llama3").await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn test_chat_accumulates_transcript() {
    let runtime = ScriptedRuntime::new(&["llama3"]).with_reply("reply");
    let (app, _dir) = test_app(runtime);

    for prompt in ["first", "second"] {
        let (status, _) = post_json(
            app.clone(),
            "/chat",
            json!({"model_name": "llama3", "prompt": prompt}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, history) = get(app, "/history/load?model_name=llama3").await;
    let messages = history.as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2]["content"], "second");
}

#[tokio::test]
async fn test_history_load_requires_model_name() {
    let (app, _dir) = test_app(ScriptedRuntime::new(&[]));

    let (status, json) = get(app, "/history/load").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "model_name is required");
}

#[tokio::test]
async fn test_history_load_unknown_model_is_empty() {
    let (app, _dir) = test_app(ScriptedRuntime::new(&[]));

    let (status, json) = get(app, "/history/load?model_name=llama3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([]));
}
