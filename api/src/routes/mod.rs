//! API route definitions.
//!
//! This module organizes all HTTP routes for the telemetry gateway.

mod exposition;
mod health;
mod logs;
mod metrics;

pub use exposition::exposition_routes;
pub use health::health_routes;
pub use logs::logs_routes;
pub use metrics::metrics_routes;

use crate::error::ApiError;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;

/// Fallback for paths no route matches.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Fallback for known paths requested with the wrong method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Unwraps a raw body, mapping extractor rejections into the error envelope.
fn read_body(body: Result<Bytes, BytesRejection>) -> Result<Bytes, ApiError> {
    body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::malformed(format!("Failed to read request body: {}", rejection.body_text()))
        }
    })
}
