// Integration test for the AuditServer and AuditClient.

mod common;

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use pagecheck_engine::api::client::{AuditClient, ProgressStage};
use pagecheck_engine::audit::DeviceProfile;
use pagecheck_engine::config::OrchestratorConfig;
use pagecheck_engine::server::handler::AuditServer;
use pagecheck_engine::Orchestrator;

use common::{ScriptedEngine, Step};

fn fast_config() -> OrchestratorConfig {
    OrchestratorConfig {
        backoff_unit_ms: 10,
        gate_poll_interval_ms: 10,
        ..Default::default()
    }
}

async fn start(engine: Arc<ScriptedEngine>, config: OrchestratorConfig) -> AuditServer {
    let orchestrator = Arc::new(Orchestrator::new(engine, &config).unwrap());
    AuditServer::start(orchestrator, "127.0.0.1:0").await.unwrap()
}

#[tokio::test]
async fn test_audit_endpoint_success_and_cache() {
    let engine = Arc::new(ScriptedEngine::always(Step::Score(0.83)));
    let server = start(engine.clone(), fast_config()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(server.url_for("/api/audit"))
        .json(&json!({"url": "https://example.com", "device": "mobile"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["performance"], 83);
    assert_eq!(body["accessibility"], 90);
    assert_eq!(body["bestPractices"], 95);
    assert_eq!(body["seo"], 100);
    assert_eq!(body["metrics"]["firstContentfulPaint"], 1.5);
    assert_eq!(body["metrics"]["totalBlockingTime"], 124);

    let again = client
        .post(server.url_for("/api/audit"))
        .json(&json!({"url": "https://example.com", "device": "mobile"}))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 200);
    assert_eq!(engine.calls(), 1);

    let stats: Value = client
        .get(server.url_for("/api/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["cache_hits"], 1);
    assert_eq!(stats["engine_attempts"], 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_audit_endpoint_validation_errors() {
    let engine = Arc::new(ScriptedEngine::always(Step::Score(0.5)));
    let server = start(engine.clone(), fast_config()).await;
    let client = reqwest::Client::new();

    for payload in [
        json!({"url": "not-a-url", "device": "mobile"}),
        json!({"url": "https://example.com", "device": "tablet"}),
        json!({"url": "not-a-url", "device": "tablet"}),
        json!({"url": "ftp://example.com", "device": "desktop"}),
        json!({"device": "desktop"}),
        json!({"url": "https://example.com", "device": 5}),
        json!({"url": 123, "device": "mobile"}),
        json!({"url": ["https://example.com"], "device": "mobile"}),
        json!(["https://example.com", "mobile"]),
    ] {
        let resp = client
            .post(server.url_for("/api/audit"))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "payload {}", payload);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "invalid_request");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    assert_eq!(engine.calls(), 0);
    server.shutdown().await;
}

#[tokio::test]
async fn test_unreadable_bodies_get_json_error() {
    let engine = Arc::new(ScriptedEngine::always(Step::Score(0.5)));
    let server = start(engine.clone(), fast_config()).await;
    let client = reqwest::Client::new();

    let requests = [
        client
            .post(server.url_for("/api/audit"))
            .header("content-type", "application/json")
            .body("{\"url\": \"https://example.com\","),
        client
            .post(server.url_for("/api/audit"))
            .body(r#"{"url": "https://example.com", "device": "mobile"}"#),
    ];
    for request in requests {
        let resp = request.send().await.unwrap();
        assert_eq!(resp.status(), 400);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "invalid_request");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    assert_eq!(engine.calls(), 0);
    server.shutdown().await;
}

#[tokio::test]
async fn test_audit_endpoint_engine_failure() {
    let engine = Arc::new(ScriptedEngine::always(Step::Fail("net::ERR_NAME_NOT_RESOLVED")));
    let server = start(engine.clone(), fast_config()).await;

    let resp = reqwest::Client::new()
        .post(server.url_for("/api/audit"))
        .json(&json!({"url": "https://nope.invalid", "device": "desktop"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "audit_failed");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("after 3 attempts"), "{}", message);
    assert!(message.contains("ERR_NAME_NOT_RESOLVED"), "{}", message);
    assert_eq!(engine.calls(), 3);

    server.shutdown().await;
}

#[tokio::test]
async fn test_health_endpoint() {
    let engine = Arc::new(ScriptedEngine::always(Step::Score(0.5)));
    let server = start(engine, fast_config()).await;

    let resp = reqwest::get(server.url_for("/api/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    server.shutdown().await;
}

#[tokio::test]
async fn test_client_runs_mobile_then_desktop() {
    let engine = Arc::new(ScriptedEngine::new(
        vec![Step::Score(0.55), Step::Score(0.95)],
        Step::Fail("unexpected"),
    ));
    let server = start(engine.clone(), fast_config()).await;
    let client = AuditClient::new(server.url_for(""));

    let stages = Mutex::new(Vec::new());
    let report = client
        .audit_all("https://example.com", |stage| stages.lock().push(stage.percent()))
        .await
        .unwrap();

    assert_eq!(report.mobile.performance, 55);
    assert_eq!(report.desktop.performance, 95);
    assert_eq!(*stages.lock(), vec![0, 50, 100]);

    let devices: Vec<DeviceProfile> = engine.call_urls().into_iter().map(|(_, d)| d).collect();
    assert_eq!(devices, vec![DeviceProfile::Mobile, DeviceProfile::Desktop]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_client_surfaces_server_error() {
    let engine = Arc::new(ScriptedEngine::always(Step::Score(0.5)));
    let server = start(engine, fast_config()).await;
    let client = AuditClient::new(server.url_for(""));

    let mut last = None;
    let err = client
        .audit_all("not-a-url", |stage| last = Some(stage))
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("invalid_request:"), "{}", err);
    assert_eq!(last, Some(ProgressStage::Analyzing));

    server.shutdown().await;
}
