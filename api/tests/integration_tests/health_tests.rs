//! Integration tests for the health probe and routing fallbacks.

use axum::http::StatusCode;

use super::common::{get, post_raw, test_app};

#[tokio::test]
async fn test_health_check() {
    let app = test_app();

    for uri in ["/", "/api/v1/health"] {
        let (status, response) = get(&app.router, uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["status"], "healthy");
        assert_eq!(response["service"], "telemetry-service");
        assert!(response["timestamp"].is_string());
    }
}

#[tokio::test]
async fn test_fallbacks_use_error_envelope() {
    let app = test_app();

    let (status, response) = get(&app.router, "/api/v1/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["status"], "error");

    let (status, response) = post_raw(&app.router, "/api/v1/health", "{}").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response["status"], "error");
    assert_eq!(response["error"], "method not allowed");
}
