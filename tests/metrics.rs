// tests/metrics.rs
// The Prometheus recorder is process-global, so this binary holds one test.
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use reflection_insights::ai_adapter::{GenerateError, MockClient, TextGenerationClient};
use reflection_insights::api::{router_with_metrics, AppState};
use reflection_insights::metrics::Metrics;
use reflection_insights::prompts::PromptCorpus;
use reflection_insights::InsightEngine;

struct DownClient;

#[async_trait]
impl TextGenerationClient for DownClient {
    async fn generate(&self, _system: &str, _payload: &str) -> Result<String, GenerateError> {
        Err(GenerateError::Empty)
    }
    fn provider_name(&self) -> &'static str {
        "down"
    }
}

fn weekly_request() -> Request<Body> {
    Request::post("/insights/weekly")
        .header("content-type", "application/json")
        .body(Body::from(
            r#"{"entries":[{"prompt":"p","response":"Long run by the lake","timestamp":1}]}"#,
        ))
        .unwrap()
}

#[tokio::test]
async fn metrics_endpoint_contains_expected_series() {
    let metrics = Metrics::init().expect("first recorder install succeeds");
    let engine = InsightEngine::with_client(Arc::new(MockClient::canned()));
    let prompts = PromptCorpus::load_from_file("data/prompts.json").unwrap();
    let app = router_with_metrics(AppState::new(engine, prompts), Some(&metrics));

    let resp = app.clone().oneshot(weekly_request()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // a failing collaborator still reports its latency
    let down = InsightEngine::with_client(Arc::new(DownClient));
    let prompts = PromptCorpus::load_from_file("data/prompts.json").unwrap();
    let down_app = router_with_metrics(AppState::new(down, prompts), Some(&metrics));
    let resp = down_app.oneshot(weekly_request()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "insights_requests_total",
        "insights_collaborator_used_total",
        "insights_collaborator_failures_total",
        "insights_collaborator_latency_ms",
    ] {
        assert!(text.contains(needle), "missing series {needle} in:\n{text}");
    }
    assert!(
        text.contains("insights_collaborator_latency_ms_count 2"),
        "both calls should be timed:\n{text}"
    );
}
