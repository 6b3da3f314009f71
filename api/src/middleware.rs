//! Request accounting middleware.

use crate::error::ApiError;
use crate::metrics::InFlightGuard;
use crate::state::AppState;
use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;

/// Endpoint label for requests that matched no route.
const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Tracks every request and enforces the request deadline.
///
/// Holds an [`InFlightGuard`] for the lifetime of the request, records count
/// and latency under the matched route template, and answers with
/// [`ApiError::DeadlineExceeded`] when the handler overruns. Side effects a
/// handler applied before the deadline are kept.
pub async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let _in_flight = InFlightGuard::new(Arc::clone(state.http_metrics().registry()));

    let method = request.method().to_string();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| UNMATCHED_ENDPOINT.to_string(), |path| path.as_str().to_string());

    let started = Instant::now();
    let deadline = state.request_timeout();
    let response = match tokio::time::timeout(deadline, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(%method, %endpoint, timeout_secs = deadline.as_secs(), "Request deadline exceeded");
            ApiError::DeadlineExceeded(deadline.as_secs()).into_response()
        }
    };

    state
        .http_metrics()
        .observe(&method, &endpoint, response.status().as_u16(), started.elapsed());
    response
}
