//! Integration tests for log ingestion.
//!
//! Tests cover:
//! - Single and batch submission
//! - Pipeline counters per service and level
//! - All-or-nothing batch rejection
//! - Sink overflow and sink shutdown

use axum::http::StatusCode;
use serde_json::json;
use shared::models::LogLevel;

use super::common::{post_json, post_raw, test_app, test_app_with_sink_capacity};

const RECEIVED: &str = "telemetry_logs_received_total";
const PROCESSED: &str = "telemetry_logs_processed_total";
const DROPPED: &str = "telemetry_logs_dropped_total";
const ERRORS: &str = "telemetry_logs_errors_total";

#[tokio::test]
async fn test_single_entry_end_to_end() {
    let mut app = test_app();

    let (status, response) = post_json(
        &app.router,
        "/api/v1/logs",
        &json!({
            "service_name": "svc",
            "level": "warn",
            "message": "disk low",
            "fields": {"pct": 91}
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        response,
        json!({"status": "success", "message": "Log entry processed successfully"})
    );

    let key = [("service_name", "svc"), ("level", "warn")];
    assert_eq!(app.value(RECEIVED, &key), Some(1.0));
    assert_eq!(app.value(PROCESSED, &key), Some(1.0));

    let entry = app.sink_rx.recv().await.unwrap();
    assert_eq!(entry.service_name(), "svc");
    assert_eq!(entry.message(), "disk low");
    assert_eq!(entry.fields()["pct"], 91);
}

#[tokio::test]
async fn test_levels_resolve_on_ingest() {
    let mut app = test_app();

    for level in ["warning", "WARN", "fatal", "verbose"] {
        let (status, _) = post_json(
            &app.router,
            "/api/v1/logs",
            &json!({"service_name": "svc", "level": level, "message": "m"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{level}");
    }

    let levels: Vec<LogLevel> = [
        app.sink_rx.recv().await.unwrap(),
        app.sink_rx.recv().await.unwrap(),
        app.sink_rx.recv().await.unwrap(),
        app.sink_rx.recv().await.unwrap(),
    ]
    .iter()
    .map(shared::models::LogEntry::level)
    .collect();
    assert_eq!(
        levels,
        vec![LogLevel::Warn, LogLevel::Info, LogLevel::Fatal, LogLevel::Info]
    );

    assert_eq!(
        app.value(PROCESSED, &[("service_name", "svc"), ("level", "info")]),
        Some(2.0)
    );
}

#[tokio::test]
async fn test_trace_correlation_is_kept() {
    let mut app = test_app();

    post_json(
        &app.router,
        "/api/v1/logs",
        &json!({
            "service_name": "svc",
            "message": "m",
            "trace_id": "abc",
            "span_id": "",
            "timestamp": "2024-03-01T12:00:00Z"
        }),
    )
    .await;

    let entry = app.sink_rx.recv().await.unwrap();
    assert_eq!(entry.trace_id(), Some("abc"));
    assert_eq!(entry.span_id(), None);
    assert_eq!(entry.timestamp().to_rfc3339(), "2024-03-01T12:00:00+00:00");
}

#[tokio::test]
async fn test_batch_of_n_counts_n() {
    let app = test_app();
    let batch: Vec<_> = (0..25)
        .map(|i| json!({"service_name": "batcher", "level": "debug", "message": format!("entry {i}")}))
        .collect();

    let (status, response) = post_json(&app.router, "/api/v1/logs/batch", &json!(batch)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "success");
    assert_eq!(response["message"], "Log batch processed successfully");
    assert_eq!(response["count"], 25);
    assert_eq!(
        app.value(PROCESSED, &[("service_name", "batcher"), ("level", "debug")]),
        Some(25.0)
    );
}

#[tokio::test]
async fn test_malformed_batch_changes_nothing() {
    let app = test_app();

    let (status, response) = post_json(
        &app.router,
        "/api/v1/logs/batch",
        &json!([
            {"service_name": "svc", "message": "fine"},
            {"service_name": "svc", "message": "fine too"},
            {"service_name": "", "message": "bad"},
            {"service_name": "svc", "message": 42}
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["status"], "error");
    assert_eq!(response["index"], 2);

    let snapshot = app.registry.snapshot().unwrap();
    for family in [RECEIVED, PROCESSED, DROPPED, ERRORS] {
        assert!(snapshot.family(family).unwrap().series.is_empty(), "{family}");
    }
}

#[tokio::test]
async fn test_malformed_single_entry() {
    let app = test_app();

    let (status, response) = post_raw(&app.router, "/api/v1/logs", "[1, 2, 3]").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to parse log entry: "));
}

#[tokio::test]
async fn test_overflow_drops_without_failing() {
    let mut app = test_app_with_sink_capacity(1);

    for message in ["kept", "dropped"] {
        let (status, _) = post_json(
            &app.router,
            "/api/v1/logs",
            &json!({"service_name": "svc", "message": message}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let key = [("service_name", "svc"), ("level", "info")];
    assert_eq!(app.value(RECEIVED, &key), Some(2.0));
    assert_eq!(app.value(PROCESSED, &key), Some(1.0));
    assert_eq!(app.value(DROPPED, &key), Some(1.0));
    assert_eq!(
        app.value(ERRORS, &[("service_name", "svc"), ("error_kind", "sink_overflow")]),
        Some(1.0)
    );
    assert_eq!(app.sink_rx.recv().await.unwrap().message(), "kept");
}

#[tokio::test]
async fn test_closed_sink_is_server_error() {
    let app = test_app();
    let registry = std::sync::Arc::clone(&app.registry);
    let router = app.router.clone();
    drop(app);

    let (status, response) = post_json(
        &router,
        "/api/v1/logs",
        &json!({"service_name": "svc", "message": "nowhere to go"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["status"], "error");
    assert_eq!(
        registry
            .snapshot()
            .unwrap()
            .value(ERRORS, &[("service_name", "svc"), ("error_kind", "sink_unavailable")]),
        Some(1.0)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_are_all_counted() {
    let app = test_app();

    let tasks: Vec<_> = (0..50)
        .map(|i| {
            let router = app.router.clone();
            tokio::spawn(async move {
                let service = if i % 2 == 0 { "even" } else { "odd" };
                post_json(
                    &router,
                    "/api/v1/logs",
                    &json!({"service_name": service, "level": "error", "message": "m"}),
                )
                .await
                .0
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    for service in ["even", "odd"] {
        assert_eq!(
            app.value(PROCESSED, &[("service_name", service), ("level", "error")]),
            Some(25.0)
        );
    }
}
