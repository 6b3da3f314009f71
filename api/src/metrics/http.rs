//! Per-route request metrics.

use shared::models::{Labels, MetricKind};
use shared::registry::{FamilyDescriptor, Registry, RegistryError};
use std::sync::Arc;
use std::time::Duration;

/// Requests handled, by method, endpoint and status.
pub const HTTP_REQUESTS: &str = "telemetry_http_requests_total";
/// Request latency, by method and endpoint.
pub const HTTP_DURATION: &str = "telemetry_http_request_duration_seconds";
/// Requests currently being handled.
pub const HTTP_IN_FLIGHT: &str = "telemetry_http_requests_in_flight";

/// Records request counts and latencies into the shared registry.
#[derive(Debug, Clone)]
pub struct HttpMetrics {
    registry: Arc<Registry>,
}

impl HttpMetrics {
    /// Declares the request families.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the names is already registered with a
    /// different definition.
    pub fn new(registry: Arc<Registry>) -> Result<Self, RegistryError> {
        registry.register(
            FamilyDescriptor::new(HTTP_REQUESTS, MetricKind::Counter, "Total number of HTTP requests")
                .with_label_keys(["method", "endpoint", "status"]),
        )?;
        registry.register(
            FamilyDescriptor::new(HTTP_DURATION, MetricKind::Histogram, "HTTP request duration in seconds")
                .with_label_keys(["method", "endpoint"])
                .with_buckets(shared::registry::DEFAULT_BUCKETS.to_vec()),
        )?;
        registry.register(FamilyDescriptor::new(
            HTTP_IN_FLIGHT,
            MetricKind::Gauge,
            "Number of HTTP requests currently being processed",
        ))?;
        Ok(Self { registry })
    }

    /// The registry the metrics are recorded into.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Records one finished request.
    ///
    /// Failures are logged and otherwise ignored so that accounting never
    /// changes a response.
    pub fn observe(&self, method: &str, endpoint: &str, status: u16, elapsed: Duration) {
        let mut labels = Labels::from([
            ("method".to_string(), method.to_string()),
            ("endpoint".to_string(), endpoint.to_string()),
        ]);

        if let Err(err) = self
            .registry
            .record_histogram(HTTP_DURATION, &labels, elapsed.as_secs_f64())
        {
            tracing::warn!(error = %err, "Failed to record request duration");
        }

        labels.insert("status".to_string(), status.to_string());
        if let Err(err) = self.registry.record_counter(HTTP_REQUESTS, &labels, 1.0) {
            tracing::warn!(error = %err, "Failed to record request count");
        }
    }
}
