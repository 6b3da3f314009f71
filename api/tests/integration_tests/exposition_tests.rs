//! Integration tests for the `/metrics` pull endpoint.

use axum::http::StatusCode;
use serde_json::json;

use super::common::{get_text, post_json, test_app};

#[tokio::test]
async fn test_empty_families_are_not_rendered() {
    let app = test_app();

    let (status, text) = get_text(&app.router, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(!text.contains("telemetry_logs_received_total"));
    assert!(!text.contains("custom_"));
}

#[tokio::test]
async fn test_scrape_after_traffic() {
    let app = test_app();

    post_json(
        &app.router,
        "/api/v1/logs",
        &json!({"service_name": "svc", "level": "warn", "message": "disk low"}),
    )
    .await;
    post_json(
        &app.router,
        "/api/v1/logs/batch",
        &json!([{"service_name": "svc", "message": "a"}, {"service_name": "svc", "message": "b"}]),
    )
    .await;
    post_json(
        &app.router,
        "/api/v1/metrics",
        &json!({
            "service_name": "svc",
            "metric_name": "cart_value",
            "metric_type": "histogram",
            "value": 0.5,
            "labels": {"currency": "eur"}
        }),
    )
    .await;

    let (status, text) = get_text(&app.router, "/metrics").await;
    assert_eq!(status, StatusCode::OK);

    assert!(text.contains("# HELP telemetry_logs_received_total Total number of log entries received\n"));
    assert!(text.contains("# TYPE telemetry_logs_received_total counter\n"));
    assert!(text.contains("telemetry_logs_received_total{level=\"warn\",service_name=\"svc\"} 1\n"));
    assert!(text.contains("telemetry_logs_processed_total{level=\"info\",service_name=\"svc\"} 2\n"));

    assert!(text.contains("# TYPE telemetry_log_batch_size histogram\n"));
    assert!(text.contains("telemetry_log_batch_size_bucket{le=\"1\"} 0\n"));
    assert!(text.contains("telemetry_log_batch_size_bucket{le=\"5\"} 1\n"));
    assert!(text.contains("telemetry_log_batch_size_count 1\n"));

    assert!(text.contains("# HELP custom_cart_value Custom histogram metric from external service\n"));
    assert!(text.contains("# TYPE custom_cart_value histogram\n"));
    assert!(text.contains(
        "custom_cart_value_bucket{currency=\"eur\",service_name=\"svc\",le=\"0.5\"} 1\n"
    ));
    assert!(text.contains("custom_cart_value_sum{currency=\"eur\",service_name=\"svc\"} 0.5\n"));

    assert!(text.contains(
        "telemetry_http_requests_total{endpoint=\"/api/v1/logs\",method=\"POST\",status=\"200\"} 1\n"
    ));
}

#[tokio::test]
async fn test_type_line_matches_creation_kind() {
    let app = test_app();

    for i in 0..100 {
        let kind = if i == 0 { "gauge" } else { "counter" };
        post_json(
            &app.router,
            "/api/v1/metrics",
            &json!({"service_name": "svc", "metric_name": "flip", "metric_type": kind, "value": 1}),
        )
        .await;
    }

    let (_, text) = get_text(&app.router, "/metrics").await;
    assert_eq!(text.matches("# TYPE custom_flip ").count(), 1);
    assert!(text.contains("# TYPE custom_flip gauge\n"));
    assert!(text.contains("custom_flip{service_name=\"svc\"} 1\n"));
}

#[tokio::test]
async fn test_in_flight_gauge_counts_the_scrape_itself() {
    let app = test_app();

    let (_, text) = get_text(&app.router, "/metrics").await;

    assert!(text.contains("telemetry_http_requests_in_flight 1\n"));
}
