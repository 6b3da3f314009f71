//! Metric submission endpoint.

use super::read_body;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shared::models::MetricSubmission;
use shared::validator::Validate;

/// Response for a recorded metric.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetricIngestResponse {
    /// Always `"success"`.
    pub status: String,
    /// Message describing the result.
    pub message: String,
    /// Name the metric is exposed under.
    pub metric: String,
}

/// Creates the metric submission routes.
pub fn metrics_routes() -> Router<AppState> {
    Router::new().route("/api/v1/metrics", post(record_metric))
}

/// Handler for one metric submission.
///
/// The metric is recorded as `custom_<metric_name>` with `service_name`
/// folded into its labels.
async fn record_metric(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<MetricIngestResponse>, ApiError> {
    let body = read_body(body)?;
    let submission: MetricSubmission = serde_json::from_slice(&body)
        .map_err(|err| ApiError::malformed(format!("Failed to parse metric entry: {err}")))?;
    submission
        .validate()
        .map_err(|err| ApiError::malformed(format!("Failed to parse metric entry: {err}")))?;

    let metric = state.registry().record_submission(&submission)?;
    tracing::debug!(
        service_name = %submission.service_name,
        %metric,
        metric_type = %submission.metric_type,
        value = submission.value,
        "Recorded metric"
    );

    Ok(Json(MetricIngestResponse {
        status: "success".to_string(),
        message: "Metric recorded successfully".to_string(),
        metric,
    }))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{json_body, post_json, test_app};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_record_counter() {
        let app = test_app();

        for _ in 0..2 {
            let response = post_json(
                &app.router,
                "/api/v1/metrics",
                r#"{"service_name":"shop","metric_name":"orders_total","metric_type":"counter","value":5,"labels":{"region":"eu"}}"#,
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);

            let body = json_body(response).await;
            assert_eq!(body["message"], "Metric recorded successfully");
            assert_eq!(body["metric"], "custom_orders_total");
        }

        let snapshot = app.registry.snapshot().unwrap();
        assert_eq!(
            snapshot.value(
                "custom_orders_total",
                &[("service_name", "shop"), ("region", "eu")]
            ),
            Some(10.0)
        );
    }

    #[tokio::test]
    async fn test_unknown_kind_is_rejected() {
        let app = test_app();

        let response = post_json(
            &app.router,
            "/api/v1/metrics",
            r#"{"service_name":"shop","metric_name":"q","metric_type":"summary","value":1}"#,
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("summary"));
        assert!(app.registry.snapshot().unwrap().family("custom_q").is_none());
    }

    #[tokio::test]
    async fn test_negative_counter_is_rejected() {
        let app = test_app();

        let response = post_json(
            &app.router,
            "/api/v1/metrics",
            r#"{"service_name":"shop","metric_name":"c","metric_type":"counter","value":-1}"#,
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_rejected() {
        let app = test_app();
        post_json(
            &app.router,
            "/api/v1/metrics",
            r#"{"service_name":"shop","metric_name":"load","metric_type":"gauge","value":1,"labels":{"host":"a"}}"#,
        )
        .await;

        let response = post_json(
            &app.router,
            "/api/v1/metrics",
            r#"{"service_name":"shop","metric_name":"load","metric_type":"gauge","value":9}"#,
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            app.registry
                .snapshot()
                .unwrap()
                .value("custom_load", &[("service_name", "shop"), ("host", "a")]),
            Some(1.0)
        );
    }

    #[tokio::test]
    async fn test_malformed_submission() {
        let app = test_app();

        for body in [
            "not json",
            r#"{"service_name":"shop","metric_type":"gauge","value":1}"#,
            r#"{"service_name":"","metric_name":"m","metric_type":"gauge","value":1}"#,
            r#"{"service_name":"shop","metric_name":"m","metric_type":"gauge","value":"high"}"#,
        ] {
            let response = post_json(&app.router, "/api/v1/metrics", body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");

            let json = json_body(response).await;
            assert!(json["error"]
                .as_str()
                .unwrap()
                .starts_with("Failed to parse metric entry: "));
        }
    }
}
