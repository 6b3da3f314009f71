//! In-flight request accounting.

use super::http::HTTP_IN_FLIGHT;
use shared::models::Labels;
use shared::registry::Registry;
use std::sync::Arc;

/// Holds one unit of the in-flight gauge for as long as it lives.
///
/// The gauge is incremented on creation and decremented on drop, so the
/// count is released when a handler returns, fails, times out, is cancelled
/// or unwinds.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: Arc<Registry>,
}

impl InFlightGuard {
    /// Increments the in-flight gauge.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        adjust(&registry, 1.0);
        Self { registry }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        adjust(&self.registry, -1.0);
    }
}

fn adjust(registry: &Registry, delta: f64) {
    if let Err(err) = registry.adjust_gauge(HTTP_IN_FLIGHT, &Labels::new(), delta) {
        tracing::warn!(error = %err, "Failed to update in-flight gauge");
    }
}
