//! Common test utilities and helpers for integration tests.
//!
//! This module provides shared functionality used across all integration tests,
//! including test app setup and HTTP request helpers.

use api::{create_router, AppState, DEFAULT_MAX_BODY_BYTES};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use shared::logs::ChannelSink;
use shared::models::LogEntry;
use shared::registry::Registry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Receiver;

/// A router wired to a fresh registry and an undrained sink queue.
pub struct TestApp {
    /// The full application router.
    pub router: Router,
    /// The registry behind the router.
    pub registry: Arc<Registry>,
    /// Receiving end of the log sink; entries stay queued until read.
    pub sink_rx: Receiver<LogEntry>,
}

impl TestApp {
    /// Scalar value of one series, if it exists.
    pub fn value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.registry.snapshot().unwrap().value(name, labels)
    }
}

/// Creates a test app with a roomy sink queue.
pub fn test_app() -> TestApp {
    test_app_with_sink_capacity(1024)
}

/// Creates a test app whose sink queue holds `capacity` entries.
pub fn test_app_with_sink_capacity(capacity: usize) -> TestApp {
    let registry = Arc::new(Registry::new());
    let (sink, sink_rx) = ChannelSink::new(capacity);
    let state = AppState::new(Arc::clone(&registry), Arc::new(sink), Duration::from_secs(5))
        .unwrap();

    TestApp {
        router: create_router(state, DEFAULT_MAX_BODY_BYTES),
        registry,
        sink_rx,
    }
}

/// Helper to make a POST request with JSON body.
pub async fn post_json(app: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    post_raw(app, uri, &serde_json::to_string(body).unwrap()).await
}

/// Helper to make a POST request with an arbitrary body.
pub async fn post_raw(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let response = tower::ServiceExt::oneshot(
        app.clone(),
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap();

    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

    (status, json)
}

/// Helper to make a GET request and read the body as text.
pub async fn get_text(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = tower::ServiceExt::oneshot(
        app.clone(),
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, String::from_utf8(body_bytes.to_vec()).unwrap())
}

/// Helper to make a GET request with a JSON response.
pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, text) = get_text(app, uri).await;
    (status, serde_json::from_str(&text).unwrap_or(Value::Null))
}
