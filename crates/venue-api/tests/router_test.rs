//! Router tests: requests go through `build_router` with an in-memory store
//! and an in-memory fingerprint cache, backed by either the heuristic oracle
//! or a scripted model.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use venue_api::{build_router, AppState};
use venue_core::{CandidateRecord, NoopSink, VenueStore};
use venue_db::{InMemoryVenueStore, SqliteFingerprintCache};
use venue_inference::mock::MockGenerationBackend;
use venue_inference::{Oracle, RetryPolicy};
use venue_jobs::{EnrichmentEngine, PipelineOrchestrator};

async fn test_state() -> (AppState, Arc<InMemoryVenueStore>) {
    let store = Arc::new(InMemoryVenueStore::with_records(
        "router",
        vec![
            CandidateRecord::new("v1")
                .with_name("Paradiso")
                .with_address("Weteringschans 6-8, Amsterdam, Netherlands"),
            CandidateRecord::new("v2")
                .with_name("Massey Hall")
                .with_address("178 Victoria St, Toronto, Ontario Canada"),
            CandidateRecord::new("v3").with_name("Unknown Room"),
        ],
    ));
    let cache = Arc::new(SqliteFingerprintCache::in_memory().await.unwrap());
    let engine = Arc::new(EnrichmentEngine::new(
        cache,
        Arc::new(Oracle::heuristic_only()),
        Arc::new(NoopSink),
    ));
    let pipeline = Arc::new(
        PipelineOrchestrator::new(store.clone(), engine, Arc::new(NoopSink)).with_batch_size(2),
    );
    (AppState::new(pipeline, None), store)
}

async fn model_state(backend: MockGenerationBackend) -> (AppState, Arc<InMemoryVenueStore>) {
    let store = Arc::new(InMemoryVenueStore::with_records(
        "model",
        vec![
            CandidateRecord::new("m1").with_name("Mohawk").with_address("912 Red River St"),
            CandidateRecord::new("m2").with_name("Stubb's").with_address("801 Red River St"),
        ],
    ));
    let cache = Arc::new(SqliteFingerprintCache::in_memory().await.unwrap());
    let oracle = Oracle::from_backend(Arc::new(backend), RetryPolicy::none(), 160);
    let engine = Arc::new(EnrichmentEngine::new(
        cache,
        Arc::new(oracle),
        Arc::new(NoopSink),
    ));
    let pipeline = Arc::new(
        PipelineOrchestrator::new(store.clone(), engine, Arc::new(NoopSink)).with_batch_size(2),
    );
    (AppState::new(pipeline, Some("mock-model".to_string())), store)
}

fn austin() -> MockGenerationBackend {
    MockGenerationBackend::new().with_default_response(MockGenerationBackend::location_response(
        "Austin",
        "United States",
        0.9,
    ))
}

fn enrich_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health_reports_store_and_oracle() {
    let (state, _) = test_state().await;
    let (status, body) = send(build_router(state), "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["store"], "memory:router");
    assert_eq!(body["oracle"], "heuristic");
    assert!(body["model"].is_null());
    assert_eq!(
        body["prompt_version"],
        venue_inference::prompts::prompt_version()
    );
}

#[tokio::test]
async fn test_stats_counts_pending() {
    let (state, _) = test_state().await;
    let (status, body) = send(build_router(state), "GET", "/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pending"], 3);
    assert_eq!(body["cached_fingerprints"], 0);
}

#[tokio::test]
async fn test_enrich_updates_and_reports() {
    let (state, store) = test_state().await;
    let app = build_router(state);

    let (status, body) = send(app.clone(), "POST", "/enrich?limit=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 2);
    assert_eq!(body["limit"], 10);
    assert_eq!(body["batch_size"], 2);
    assert_eq!(body["overwrite"], false);
    assert!(body.get("rounds").is_none());

    let paradiso = store.get("v1").unwrap().unwrap();
    assert_eq!(paradiso.city.as_deref(), Some("Amsterdam"));
    assert_eq!(paradiso.country.as_deref(), Some("Netherlands"));

    let (_, stats) = send(app.clone(), "GET", "/stats").await;
    assert_eq!(stats["pending"], 1);
    assert_eq!(stats["cached_fingerprints"], 3);

    let (status, body) = send(app, "POST", "/enrich?limit=10&verbose=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 0);
    assert!(body["rounds"].is_array());
}

#[tokio::test]
async fn test_enrich_rejects_out_of_range_limit() {
    let (state, _) = test_state().await;
    let app = build_router(state);

    for uri in ["/enrich?limit=0", "/enrich?limit=100001", "/enrich?limit=abc"] {
        let (status, _) = send(app.clone(), "POST", uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }

    let (status, body) = send(app, "POST", "/enrich?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("100000"));
}

#[tokio::test]
async fn test_concurrent_run_is_rejected() {
    let (state, _) = test_state().await;
    let lock = state.run_lock.clone();
    let app = build_router(state);

    let _held = lock.lock().await;
    let (status, body) = send(app, "POST", "/enrich?limit=5").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_enrich_with_model_oracle() {
    let (state, store) = model_state(austin()).await;
    let app = build_router(state);

    let (status, body) = send(app.clone(), "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["oracle"], "model+heuristic");
    assert_eq!(body["model"], "mock-model");

    let (status, body) = send(app.clone(), "POST", "/enrich?limit=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 2);

    let mohawk = store.get("m1").unwrap().unwrap();
    assert_eq!(mohawk.city.as_deref(), Some("Austin"));
    assert_eq!(mohawk.country.as_deref(), Some("United States"));

    let (_, stats) = send(app, "GET", "/stats").await;
    assert_eq!(stats["pending"], 0);
}

#[tokio::test]
async fn test_enrich_run_survives_client_disconnect() {
    let (state, store) = model_state(austin().with_latency_ms(300)).await;
    let lock = state.run_lock.clone();
    let app = build_router(state);

    let dropped = tokio::time::timeout(
        Duration::from_millis(50),
        app.clone().oneshot(enrich_request("/enrich?limit=2")),
    )
    .await;
    assert!(dropped.is_err(), "request should still be running");

    tokio::time::sleep(Duration::from_millis(800)).await;

    assert_eq!(store.count_pending().await.unwrap(), 0);
    let stubbs = store.get("m2").unwrap().unwrap();
    assert_eq!(stubbs.city.as_deref(), Some("Austin"));
    assert!(lock.try_lock().is_ok(), "run lock released after completion");
}
