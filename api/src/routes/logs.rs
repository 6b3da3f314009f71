//! Log ingestion endpoints.
//!
//! Provides HTTP endpoints for submitting single log entries and batches.

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
use shared::logs::{Delivery, NormalizeError};

/// Response for successful log ingestion.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogIngestResponse {
    /// Always `"success"`.
    pub status: String,
    /// Message describing the result.
    pub message: String,
    /// Number of entries accepted (batch requests only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl LogIngestResponse {
    fn success(message: &str, count: Option<usize>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            count,
        }
    }
}

/// Creates the log ingestion routes.
pub fn logs_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/logs", post(ingest_log))
        .route("/api/v1/logs/batch", post(ingest_log_batch))
}

/// Handler for a single log entry.
async fn ingest_log(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<LogIngestResponse>, ApiError> {
    let body = read_body(body)?;
    let entry = state
        .normalizer()
        .normalize(&body)
        .map_err(|err| ApiError::malformed(format!("Failed to parse log entry: {err}")))?;

    let service_name = entry.service_name().to_string();
    if state.log_router().route(entry)? == Delivery::Dropped {
        tracing::debug!(%service_name, "Accepted log entry dropped by backlogged sink");
    }

    Ok(Json(LogIngestResponse::success(
        "Log entry processed successfully",
        None,
    )))
}

/// Handler for a batch of log entries.
///
/// The batch is normalized as a whole before anything is routed: one bad
/// entry rejects the request and no entry is counted.
async fn ingest_log_batch(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<LogIngestResponse>, ApiError> {
    let body = read_body(body)?;
    let entries = state.normalizer().normalize_batch(&body).map_err(|err| {
        let index = match &err {
            NormalizeError::BatchEntry { index, .. } => Some(*index),
            _ => None,
        };
        ApiError::MalformedPayload {
            message: format!("Failed to parse log entries: {err}"),
            index,
        }
    })?;

    let summary = state.log_router().route_batch(entries)?;
    tracing::debug!(
        written = summary.written,
        dropped = summary.dropped,
        "Accepted log batch"
    );

    Ok(Json(LogIngestResponse::success(
        "Log batch processed successfully",
        Some(summary.accepted()),
    )))
}
