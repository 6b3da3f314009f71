//! Application state module.
//!
//! Defines the shared application state that is passed to route handlers.

use crate::metrics::HttpMetrics;
use shared::logs::{LogRouter, LogSink, Normalizer};
use shared::registry::{Registry, RegistryError};
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all request handlers.
///
/// Cloning is cheap: every component is behind an `Arc` or is `Copy`.
#[derive(Debug, Clone)]
pub struct AppState {
    registry: Arc<Registry>,
    normalizer: Normalizer,
    log_router: LogRouter,
    http_metrics: HttpMetrics,
    request_timeout: Duration,
}

impl AppState {
    /// Creates the state and declares the gateway's own metric families in
    /// `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error if a gateway family name is already registered with a
    /// different definition.
    pub fn new(
        registry: Arc<Registry>,
        sink: Arc<dyn LogSink>,
        request_timeout: Duration,
    ) -> Result<Self, RegistryError> {
        let log_router = LogRouter::new(Arc::clone(&registry), sink)?;
        let http_metrics = HttpMetrics::new(Arc::clone(&registry))?;
        Ok(Self {
            registry,
            normalizer: Normalizer::new(),
            log_router,
            http_metrics,
            request_timeout,
        })
    }

    /// Replaces the normalizer, e.g. to pin the clock in tests.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Returns the metric registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the log normalizer.
    #[must_use]
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Returns the log router.
    #[must_use]
    pub fn log_router(&self) -> &LogRouter {
        &self.log_router
    }

    /// Returns the request metrics recorder.
    #[must_use]
    pub fn http_metrics(&self) -> &HttpMetrics {
        &self.http_metrics
    }

    /// Returns the per-request deadline.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}
