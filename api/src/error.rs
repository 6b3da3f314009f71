//! HTTP error type.
//!
//! Every failure reaching the request boundary is turned into the
//! `{"status":"error","error":...}` envelope with a matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::logs::RouteError;
use shared::registry::RegistryError;
use thiserror::Error;

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The body could not be read or does not match the expected shape.
    #[error("{message}")]
    MalformedPayload {
        /// Human-readable reason.
        message: String,
        /// Index of the offending entry in a batch.
        index: Option<usize>,
    },

    /// The body exceeds the configured size limit.
    #[error("request body too large")]
    PayloadTooLarge,

    /// The registry rejected a submission, or failed internally.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The log sink is closed.
    #[error("log sink is unavailable")]
    SinkUnavailable,

    /// The path exists but not for this method.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// No route matches the path.
    #[error("not found")]
    NotFound,

    /// The request did not finish within its deadline.
    #[error("request timed out after {0} seconds")]
    DeadlineExceeded(u64),
}

impl ApiError {
    /// A malformed single payload.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            message: message.into(),
            index: None,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Registry(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Registry(_) | Self::SinkUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::DeadlineExceeded(_) => StatusCode::REQUEST_TIMEOUT,
        }
    }
}

impl From<RouteError> for ApiError {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::SinkUnavailable => Self::SinkUnavailable,
            RouteError::Registry(err) => Self::Registry(err),
        }
    }
}

/// Error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always `"error"`.
    pub status: &'static str,
    /// Human-readable reason.
    pub error: String,
    /// Index of the offending batch entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, %status, "Request rejected");
        }

        let index = match &self {
            Self::MalformedPayload { index, .. } => *index,
            _ => None,
        };
        let body = ErrorBody {
            status: "error",
            error: self.to_string(),
            index,
        };

        (status, Json(body)).into_response()
    }
}
