//! HTTP API Tests
//!
//! Routes, input validation and rate limiting, with a scripted LLM behind the pipeline.

use super::mocks::MockLlmActor;
use crate::brain::IntentPipeline;
use crate::config::AppConfig;
use crate::server::{app_config, AppState};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;

const GREETING_JSON: &str = r#"{"intent":"greeting","confidence":0.92,"entities":{}}"#;

macro_rules! test_app {
    ($llm:expr, $config:expr) => {{
        let state = web::Data::new(AppState::new($config, IntentPipeline::new(Arc::new($llm))));
        test::init_service(App::new().app_data(state).configure(app_config)).await
    }};
    ($llm:expr) => {
        test_app!($llm, AppConfig::default())
    };
}

#[actix_web::test]
async fn test_health_reports_llm_status() {
    let app = test_app!(MockLlmActor::new(GREETING_JSON, "Hi"));
    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["llm_available"], true);
    assert_eq!(body["model"], AppConfig::default().llm.model);
    assert!(body["timestamp"].is_string());
}

#[actix_web::test]
async fn test_health_degraded_when_llm_down() {
    let app = test_app!(MockLlmActor::new(GREETING_JSON, "Hi").unavailable());
    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["llm_available"], false);
}

#[actix_web::test]
async fn test_categories_lists_all_intents() {
    let app = test_app!(MockLlmActor::new(GREETING_JSON, "Hi"));
    let req = test::TestRequest::get().uri("/api/categories").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let categories = body["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 8);
    let names: Vec<&str> = categories.iter().map(|c| c["name"].as_str().unwrap()).collect();
    assert!(names.contains(&"information_request"));
    assert!(names.contains(&"unknown"));
    assert!(categories.iter().all(|c| c["description"].is_string()));
}

#[actix_web::test]
async fn test_classify_success() {
    let app = test_app!(MockLlmActor::new(GREETING_JSON, "  Hey there, friend!  "));
    let req = test::TestRequest::post()
        .uri("/api/classify")
        .set_json(json!({ "message": "Hello there!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["intent"], "greeting");
    assert!((body["confidence"].as_f64().unwrap() - 0.92).abs() < 1e-6);
    assert_eq!(body["entities"], json!({}));
    assert_eq!(body["response"], "Hey there, friend!");
    assert!(body["error"].is_null());
    assert!(body.get("reasoning").is_none());
    assert_eq!(body["metadata"]["model"], AppConfig::default().llm.model);
    assert_eq!(body["metadata"]["source"], "llm");
    assert!(body["metadata"]["request_id"].is_string());
    assert!(body["metadata"]["processing_time_ms"].is_u64());
}

#[actix_web::test]
async fn test_classify_with_reasoning() {
    let llm = MockLlmActor::new(GREETING_JSON, "Hi!").with_reasoning(
        r#"{"key_phrases":["hello"],"justification":"Says hello.","response_strategy":"Greet back."}"#,
    );
    let app = test_app!(llm);
    let req = test::TestRequest::post()
        .uri("/api/classify")
        .set_json(json!({ "message": "Hello there!", "include_reasoning": true }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["reasoning"]["key_phrases"], json!(["hello"]));
    assert_eq!(body["reasoning"]["response_strategy"], "Greet back.");
}

#[actix_web::test]
async fn test_classify_llm_failure_is_not_http_error() {
    let app = test_app!(MockLlmActor::failing());
    let req = test::TestRequest::post()
        .uri("/api/classify")
        .set_json(json!({ "message": "Hello there!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["intent"], "unknown");
    assert_eq!(body["confidence"], 0.0);
    assert!(body["error"].as_str().unwrap().contains("Mock failure"));
    assert_eq!(body["metadata"]["source"], "failed");
}

#[actix_web::test]
async fn test_classify_rejects_bad_input() {
    let config = AppConfig {
        max_message_length: 20,
        ..AppConfig::default()
    };
    let app = test_app!(MockLlmActor::new(GREETING_JSON, "Hi"), config);

    let bad_bodies = [
        json!({ "message": "" }),
        json!({ "message": "    " }),
        json!({ "message": 42 }),
        json!({ "text": "wrong field" }),
        json!({ "message": "this message is definitely longer than twenty characters" }),
    ];

    for bad in bad_bodies {
        let req = test::TestRequest::post()
            .uri("/api/classify")
            .set_json(&bad)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "Expected 400 for {}", bad);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["type"], "invalid_request", "for {}", bad);
    }
}

#[actix_web::test]
async fn test_classify_rejects_malformed_json() {
    let app = test_app!(MockLlmActor::new(GREETING_JSON, "Hi"));
    let req = test::TestRequest::post()
        .uri("/api/classify")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"message\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_batch_classify_keeps_order() {
    let llm = MockLlmActor::new(
        r#"{"intent":"question","confidence":0.7,"entities":{}}"#,
        "Answer to {input}",
    )
    .failing_for("boom");
    let app = test_app!(llm);

    let req = test::TestRequest::post()
        .uri("/api/classify/batch")
        .set_json(json!({ "messages": ["first?", "boom?", "third?"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total"], 3);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["response"], "Answer to first?");
    assert_eq!(results[1]["intent"], "unknown");
    assert!(results[1]["error"].is_string());
    assert_eq!(results[2]["response"], "Answer to third?");
    assert!(results[2]["error"].is_null());
}

#[actix_web::test]
async fn test_batch_classify_limits() {
    let config = AppConfig {
        max_batch_size: 2,
        ..AppConfig::default()
    };
    let app = test_app!(MockLlmActor::new(GREETING_JSON, "Hi"), config);

    let cases = [
        json!({ "messages": [] }),
        json!({ "messages": ["a", "b", "c"] }),
        json!({ "messages": ["fine", ""] }),
        json!({ "messages": "not a list" }),
    ];
    for case in cases {
        let req = test::TestRequest::post()
            .uri("/api/classify/batch")
            .set_json(&case)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "Expected 400 for {}", case);
    }
}

#[actix_web::test]
async fn test_rate_limit_applies() {
    let config = AppConfig {
        rate_limit_requests: 2,
        ..AppConfig::default()
    };
    let app = test_app!(MockLlmActor::new(GREETING_JSON, "Hi"), config);

    let mut statuses = Vec::new();
    for _ in 0..3 {
        let req = test::TestRequest::post()
            .uri("/api/classify")
            .peer_addr("10.1.2.3:5555".parse().unwrap())
            .set_json(json!({ "message": "Hello" }))
            .to_request();
        statuses.push(test::call_service(&app, req).await.status());
    }
    assert_eq!(
        statuses,
        vec![StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
    );

    // Another client is unaffected
    let req = test::TestRequest::post()
        .uri("/api/classify")
        .peer_addr("10.9.9.9:5555".parse().unwrap())
        .set_json(json!({ "message": "Hello" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_rate_limit_ignores_forwarded_headers_by_default() {
    let config = AppConfig {
        rate_limit_requests: 2,
        ..AppConfig::default()
    };
    let app = test_app!(MockLlmActor::new(GREETING_JSON, "Hi"), config);

    let mut statuses = Vec::new();
    for i in 0..5 {
        let req = test::TestRequest::post()
            .uri("/api/classify")
            .peer_addr("10.1.2.3:5555".parse().unwrap())
            .insert_header(("x-forwarded-for", format!("1.1.1.{}", i)))
            .set_json(json!({ "message": "Hello" }))
            .to_request();
        statuses.push(test::call_service(&app, req).await.status());
    }
    assert_eq!(
        statuses,
        vec![
            StatusCode::OK,
            StatusCode::OK,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS
        ]
    );
}

#[actix_web::test]
async fn test_rate_limit_keys_on_forwarded_client_behind_trusted_proxy() {
    let config = AppConfig {
        rate_limit_requests: 1,
        trust_proxy_headers: true,
        ..AppConfig::default()
    };
    let app = test_app!(MockLlmActor::new(GREETING_JSON, "Hi"), config);

    let send = |client: &'static str| {
        test::TestRequest::post()
            .uri("/api/classify")
            .peer_addr("10.0.0.1:8080".parse().unwrap())
            .insert_header(("x-forwarded-for", client))
            .set_json(json!({ "message": "Hello" }))
            .to_request()
    };

    assert_eq!(test::call_service(&app, send("203.0.113.7")).await.status(), StatusCode::OK);
    assert_eq!(test::call_service(&app, send("203.0.113.8")).await.status(), StatusCode::OK);
    assert_eq!(
        test::call_service(&app, send("203.0.113.7")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}
