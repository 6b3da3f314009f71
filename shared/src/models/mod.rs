//! Data models for the telemetry gateway.
//!
//! This module contains the wire and canonical shapes for logs and metrics.

pub mod log;
pub mod metric;

pub use log::{LogEntry, LogLevel, RawLogEntry};
pub use metric::{Labels, MetricKind, MetricSubmission, UnknownMetricKind, SERVICE_NAME_LABEL};
