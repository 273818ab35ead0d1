//! Integration Tests
//!
//! HTTP API -> pipeline -> LLM actor -> mock Ollama server, nothing stubbed in between.

use crate::actors::llm::LlmActorHandle;
use crate::brain::IntentPipeline;
use crate::config::{AppConfig, LlmConfig};
use crate::server::{app_config, AppState};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_reply(content: &str) -> Value {
    json!({
        "model": "test-model",
        "created_at": "2026-01-01T00:00:00Z",
        "message": { "role": "assistant", "content": content },
        "done": true
    })
}

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        llm: LlmConfig {
            base_url: server.uri(),
            model: "test-model".to_string(),
            timeout_secs: 5,
            ..LlmConfig::default()
        },
        ..AppConfig::default()
    }
}

async fn mount_chat(server: &MockServer, prompt_marker: &str, reply: &str) {
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains(prompt_marker))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(reply)))
        .mount(server)
        .await;
}

macro_rules! live_app {
    ($config:expr) => {{
        let config: AppConfig = $config;
        let llm = LlmActorHandle::new(config.llm.clone()).unwrap();
        let state = web::Data::new(AppState::new(config, IntentPipeline::new(Arc::new(llm))));
        test::init_service(App::new().app_data(state).configure(app_config)).await
    }};
}

#[actix_web::test]
async fn test_full_classification_round_trip() {
    let server = MockServer::start().await;
    mount_chat(
        &server,
        "intent classification system",
        "```json\n{\n  \"intent\": \"command\",\n  \"confidence\": 0.88,\n  \"entities\": {\"time\": \"6pm\"},\n}\n```",
    )
    .await;
    mount_chat(&server, "Soul Buddy", "Done! I'll remind you at 6pm.").await;

    let app = live_app!(config_for(&server));
    let req = test::TestRequest::post()
        .uri("/api/classify")
        .set_json(json!({ "message": "Remind me to call mum at 6pm" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["intent"], "command");
    assert!((body["confidence"].as_f64().unwrap() - 0.88).abs() < 1e-6);
    assert_eq!(body["entities"], json!({ "time": "6pm" }));
    assert_eq!(body["response"], "Done! I'll remind you at 6pm.");
    assert!(body["error"].is_null());
    assert_eq!(body["metadata"]["model"], "test-model");
}

#[actix_web::test]
async fn test_prose_reply_falls_back_to_patterns() {
    let server = MockServer::start().await;
    mount_chat(&server, "intent classification system", "This looks like a farewell to me.").await;
    mount_chat(&server, "Soul Buddy", "Take care!").await;

    let app = live_app!(config_for(&server));
    let req = test::TestRequest::post()
        .uri("/api/classify")
        .set_json(json!({ "message": "ok bye" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["intent"], "goodbye");
    assert!((body["confidence"].as_f64().unwrap() - 0.6).abs() < 1e-6);
    assert_eq!(body["metadata"]["source"], "pattern");
}

#[actix_web::test]
async fn test_llm_server_error_degrades_gracefully() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
        .mount(&server)
        .await;

    let app = live_app!(config_for(&server));
    let req = test::TestRequest::post()
        .uri("/api/classify")
        .set_json(json!({ "message": "Hello there!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["intent"], "unknown");
    assert_eq!(body["confidence"], 0.0);
    assert_eq!(body["response"], crate::brain::turn::APOLOGY_RESPONSE);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("503"));
    assert!(error.contains("model loading"));
}

#[actix_web::test]
async fn test_health_probes_llm_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
        .mount(&server)
        .await;

    let app = live_app!(config_for(&server));
    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "test-model");
}

#[actix_web::test]
async fn test_batch_round_trip() {
    let server = MockServer::start().await;
    mount_chat(
        &server,
        "intent classification system",
        r#"{"intent":"question","confidence":0.9,"entities":{}}"#,
    )
    .await;
    mount_chat(&server, "Soul Buddy", "Good question!").await;

    let app = live_app!(config_for(&server));
    let req = test::TestRequest::post()
        .uri("/api/classify/batch")
        .set_json(json!({ "messages": ["Why?", "How?", "When?"] }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["total"], 3);
    for result in body["results"].as_array().unwrap() {
        assert_eq!(result["intent"], "question");
        assert_eq!(result["response"], "Good question!");
    }
}
