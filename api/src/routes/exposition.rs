//! Pull-scrape endpoint.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use shared::registry::exposition::{self, CONTENT_TYPE};

/// Creates the exposition route.
pub fn exposition_routes() -> Router<AppState> {
    Router::new().route("/metrics", get(scrape))
}

/// Renders every family in the text exposition format.
async fn scrape(State(state): State<AppState>) -> Result<Response, ApiError> {
    let snapshot = state.registry().snapshot()?;
    let body = exposition::render(&snapshot);
    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response())
}
