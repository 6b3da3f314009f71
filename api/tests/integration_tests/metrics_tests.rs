//! Integration tests for metric submission.
//!
//! Tests cover:
//! - Counter, gauge and histogram semantics
//! - Schema-on-first-write enforcement
//! - Kind and value validation
//! - Histogram sample names reserved against other families

use axum::http::StatusCode;
use serde_json::{json, Value};

use super::common::{post_json, test_app};

fn metric(name: &str, kind: &str, value: f64, labels: Value) -> Value {
    json!({
        "service_name": "svc",
        "metric_name": name,
        "metric_type": kind,
        "value": value,
        "labels": labels
    })
}

#[tokio::test]
async fn test_counter_accumulates() {
    let app = test_app();

    for _ in 0..3 {
        let (status, response) = post_json(
            &app.router,
            "/api/v1/metrics",
            &metric("jobs_total", "counter", 2.5, json!({"queue": "mail"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["status"], "success");
        assert_eq!(response["message"], "Metric recorded successfully");
    }

    assert_eq!(
        app.value(
            "custom_jobs_total",
            &[("service_name", "svc"), ("queue", "mail")]
        ),
        Some(7.5)
    );
}

#[tokio::test]
async fn test_gauge_keeps_last_value() {
    let app = test_app();

    for value in [7.0, 3.0] {
        post_json(
            &app.router,
            "/api/v1/metrics",
            &metric("pool_size", "gauge", value, json!({"pool": "db"})),
        )
        .await;
    }

    assert_eq!(
        app.value("custom_pool_size", &[("service_name", "svc"), ("pool", "db")]),
        Some(3.0)
    );
}

#[tokio::test]
async fn test_gauge_accepts_negative_values() {
    let app = test_app();

    let (status, _) = post_json(
        &app.router,
        "/api/v1/metrics",
        &metric("temperature", "gauge", -12.5, json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        app.value("custom_temperature", &[("service_name", "svc")]),
        Some(-12.5)
    );
}

#[tokio::test]
async fn test_histogram_observations() {
    let app = test_app();

    for value in [0.003, 0.2, 4.0] {
        post_json(
            &app.router,
            "/api/v1/metrics",
            &metric("job_seconds", "histogram", value, json!({})),
        )
        .await;
    }

    let snapshot = app.registry.snapshot().unwrap();
    let histogram = snapshot
        .family("custom_job_seconds")
        .unwrap()
        .get(&[("service_name", "svc")])
        .unwrap()
        .as_histogram()
        .unwrap()
        .clone();
    assert_eq!(histogram.count, 3);
    assert_eq!(histogram.buckets.first(), Some(&(0.005, 1)));
    assert_eq!(histogram.buckets.last(), Some(&(10.0, 3)));
}

#[tokio::test]
async fn test_different_label_keys_are_rejected() {
    let app = test_app();
    post_json(
        &app.router,
        "/api/v1/metrics",
        &metric("requests", "counter", 1.0, json!({"method": "GET"})),
    )
    .await;

    for labels in [json!({}), json!({"method": "GET", "path": "/"}), json!({"verb": "GET"})] {
        let (status, response) = post_json(
            &app.router,
            "/api/v1/metrics",
            &metric("requests", "counter", 100.0, labels),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["status"], "error");
    }

    let snapshot = app.registry.snapshot().unwrap();
    let family = snapshot.family("custom_requests").unwrap();
    assert_eq!(family.series.len(), 1);
    assert_eq!(
        family.get(&[("service_name", "svc"), ("method", "GET")]).and_then(|v| v.as_f64()),
        Some(1.0)
    );
}

#[tokio::test]
async fn test_kind_is_fixed_by_first_write() {
    let app = test_app();
    post_json(
        &app.router,
        "/api/v1/metrics",
        &metric("depth", "gauge", 1.0, json!({})),
    )
    .await;

    let (status, _) = post_json(
        &app.router,
        "/api/v1/metrics",
        &metric("depth", "counter", 1.0, json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_negative_counter_is_rejected_without_mutation() {
    let app = test_app();
    post_json(
        &app.router,
        "/api/v1/metrics",
        &metric("bytes_total", "counter", 10.0, json!({})),
    )
    .await;

    let (status, response) = post_json(
        &app.router,
        "/api/v1/metrics",
        &metric("bytes_total", "counter", -3.0, json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].as_str().unwrap().contains("bytes_total"));
    assert_eq!(
        app.value("custom_bytes_total", &[("service_name", "svc")]),
        Some(10.0)
    );
}

#[tokio::test]
async fn test_unknown_metric_kind() {
    let app = test_app();

    let (status, response) = post_json(
        &app.router,
        "/api/v1/metrics",
        &metric("quantiles", "summary", 1.0, json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].as_str().unwrap().contains("summary"));
}

#[tokio::test]
async fn test_client_service_name_label_is_overridden() {
    let app = test_app();

    post_json(
        &app.router,
        "/api/v1/metrics",
        &metric("hits", "counter", 1.0, json!({"service_name": "spoofed"})),
    )
    .await;

    assert_eq!(app.value("custom_hits", &[("service_name", "svc")]), Some(1.0));
    assert_eq!(app.value("custom_hits", &[("service_name", "spoofed")]), None);
}

#[tokio::test]
async fn test_invalid_names_are_rejected() {
    let app = test_app();

    let (status, _) = post_json(
        &app.router,
        "/api/v1/metrics",
        &metric("has-dash", "gauge", 1.0, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &app.router,
        "/api/v1/metrics",
        &metric("latency", "histogram", 1.0, json!({"le": "5"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_counter_submissions() {
    let app = test_app();

    let tasks: Vec<_> = (0..40)
        .map(|_| {
            let router = app.router.clone();
            tokio::spawn(async move {
                post_json(
                    &router,
                    "/api/v1/metrics",
                    &metric("x", "counter", 5.0, json!({"a": "1"})),
                )
                .await
                .0
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(
        app.value("custom_x", &[("service_name", "svc"), ("a", "1")]),
        Some(200.0)
    );
}

#[tokio::test]
async fn test_counter_cannot_reuse_histogram_sample_names() {
    let app = test_app();

    let (status, _) = post_json(
        &app.router,
        "/api/v1/metrics",
        &metric("latency", "histogram", 0.2, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, response) = post_json(
        &app.router,
        "/api/v1/metrics",
        &metric("latency_count", "counter", 1.0, json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["status"], "error");
    assert!(response["error"]
        .as_str()
        .unwrap()
        .contains("'custom_latency'"));
    assert!(app
        .registry
        .snapshot()
        .unwrap()
        .family("custom_latency_count")
        .is_none());
}
