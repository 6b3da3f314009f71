//! Log router.
//!
//! Hands canonical entries to a [`LogSink`] and keeps the log pipeline
//! counters in the [`Registry`].

use super::sink::{LogSink, SinkError};
use crate::models::{LogEntry, MetricKind, SERVICE_NAME_LABEL};
use crate::registry::{FamilyDescriptor, Registry, RegistryError};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Entries accepted by the gateway, by service and level.
pub const LOGS_RECEIVED: &str = "telemetry_logs_received_total";
/// Entries written to the sink, by service and level.
pub const LOGS_PROCESSED: &str = "telemetry_logs_processed_total";
/// Entries dropped because the sink was full, by service and level.
pub const LOGS_DROPPED: &str = "telemetry_logs_dropped_total";
/// Sink failures, by service and error kind.
pub const LOGS_ERRORS: &str = "telemetry_logs_errors_total";
/// Distribution of accepted batch sizes.
pub const LOG_BATCH_SIZE: &str = "telemetry_log_batch_size";

const LEVEL_LABEL: &str = "level";
const ERROR_KIND_LABEL: &str = "error_kind";
const BATCH_SIZE_BUCKETS: [f64; 8] = [1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0];

/// What happened to a routed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The sink accepted the entry.
    Written,
    /// The sink was full and the entry was discarded.
    Dropped,
}

/// Outcome of a routed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Entries the sink accepted.
    pub written: usize,
    /// Entries discarded on overflow.
    pub dropped: usize,
}

impl BatchSummary {
    /// Number of entries routed, written or dropped.
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.written + self.dropped
    }
}

/// Errors returned while routing.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The sink is closed; the gateway cannot write logs.
    #[error("log sink is unavailable")]
    SinkUnavailable,

    /// A pipeline counter could not be updated.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Routes entries to the sink and counts them.
#[derive(Clone)]
pub struct LogRouter {
    registry: Arc<Registry>,
    sink: Arc<dyn LogSink>,
}

impl std::fmt::Debug for LogRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogRouter").finish_non_exhaustive()
    }
}

impl LogRouter {
    /// Creates a router and declares the log pipeline families.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the family names is already registered with
    /// a different definition.
    pub fn new(registry: Arc<Registry>, sink: Arc<dyn LogSink>) -> Result<Self, RegistryError> {
        let per_level = [SERVICE_NAME_LABEL, LEVEL_LABEL];
        registry.register(
            FamilyDescriptor::new(LOGS_RECEIVED, MetricKind::Counter, "Total number of log entries received")
                .with_label_keys(per_level),
        )?;
        registry.register(
            FamilyDescriptor::new(
                LOGS_PROCESSED,
                MetricKind::Counter,
                "Total number of log entries written to the log sink",
            )
            .with_label_keys(per_level),
        )?;
        registry.register(
            FamilyDescriptor::new(
                LOGS_DROPPED,
                MetricKind::Counter,
                "Total number of log entries dropped because the log sink was full",
            )
            .with_label_keys(per_level),
        )?;
        registry.register(
            FamilyDescriptor::new(LOGS_ERRORS, MetricKind::Counter, "Total number of log processing errors")
                .with_label_keys([SERVICE_NAME_LABEL, ERROR_KIND_LABEL]),
        )?;
        registry.register(
            FamilyDescriptor::new(LOG_BATCH_SIZE, MetricKind::Histogram, "Size of log batches received")
                .with_buckets(BATCH_SIZE_BUCKETS.to_vec()),
        )?;

        Ok(Self { registry, sink })
    }

    /// Routes one entry.
    ///
    /// Never waits on the sink: a full sink drops the entry and reports
    /// [`Delivery::Dropped`].
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::SinkUnavailable`] if the sink is closed.
    pub fn route(&self, entry: LogEntry) -> Result<Delivery, RouteError> {
        let service = entry.service_name().to_string();
        let level = entry.level();
        let labels = BTreeMap::from([
            (SERVICE_NAME_LABEL.to_string(), service.clone()),
            (LEVEL_LABEL.to_string(), level.to_string()),
        ]);
        self.registry.record_counter(LOGS_RECEIVED, &labels, 1.0)?;

        match self.sink.submit(entry) {
            Ok(()) => {
                self.registry.record_counter(LOGS_PROCESSED, &labels, 1.0)?;
                Ok(Delivery::Written)
            }
            Err(err @ SinkError::Overflow) => {
                self.registry.record_counter(LOGS_DROPPED, &labels, 1.0)?;
                self.record_error(&service, err)?;
                tracing::warn!(service_name = %service, %level, "Log sink full, entry dropped");
                Ok(Delivery::Dropped)
            }
            Err(err @ SinkError::Unavailable) => {
                self.record_error(&service, err)?;
                tracing::error!(service_name = %service, %level, "Log sink unavailable");
                Err(RouteError::SinkUnavailable)
            }
        }
    }

    /// Routes a normalized batch in order and records its size.
    ///
    /// # Errors
    ///
    /// Stops at the first [`RouteError`]; entries before it stay routed.
    pub fn route_batch(&self, entries: Vec<LogEntry>) -> Result<BatchSummary, RouteError> {
        #[allow(clippy::cast_precision_loss)]
        let size = entries.len() as f64;
        self.registry
            .record_histogram(LOG_BATCH_SIZE, &BTreeMap::new(), size)?;

        let mut summary = BatchSummary::default();
        for entry in entries {
            match self.route(entry)? {
                Delivery::Written => summary.written += 1,
                Delivery::Dropped => summary.dropped += 1,
            }
        }
        Ok(summary)
    }

    fn record_error(&self, service: &str, err: SinkError) -> Result<(), RegistryError> {
        let labels = BTreeMap::from([
            (SERVICE_NAME_LABEL.to_string(), service.to_string()),
            (ERROR_KIND_LABEL.to_string(), err.kind().to_string()),
        ]);
        self.registry.record_counter(LOGS_ERRORS, &labels, 1.0)
    }
}
