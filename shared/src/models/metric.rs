//! Metric data model.
//!
//! Defines `MetricKind` and the `MetricSubmission` wire shape accepted from
//! client services.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

/// Label set of a single observation, keyed by label name.
///
/// A `BTreeMap` so iteration is always in lexicographic key order.
pub type Labels = BTreeMap<String, String>;

/// Label key under which the submitting service is recorded.
pub const SERVICE_NAME_LABEL: &str = "service_name";

/// Kind of a metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// A monotonic sum (e.g., request count).
    Counter,
    /// A last-value measurement that can go up or down (e.g., queue depth).
    Gauge,
    /// A bucketed distribution (e.g., request latency).
    Histogram,
}

impl MetricKind {
    /// Lowercase name, as used on `# TYPE` exposition lines.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The submitted metric type is not one of counter, gauge or histogram.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown metric kind '{0}', expected counter, gauge or histogram")]
pub struct UnknownMetricKind(pub String);

impl FromStr for MetricKind {
    type Err = UnknownMetricKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(Self::Counter),
            "gauge" => Ok(Self::Gauge),
            "histogram" => Ok(Self::Histogram),
            other => Err(UnknownMetricKind(other.to_string())),
        }
    }
}

/// A metric observation submitted by a client service.
///
/// `metric_type` is kept as a string so an unsupported kind surfaces as
/// [`UnknownMetricKind`] instead of a generic decoding error.
///
/// # Example
///
/// ```
/// use shared::models::{MetricKind, MetricSubmission};
///
/// let submission = MetricSubmission::new("checkout", "orders_total", MetricKind::Counter, 1.0)
///     .with_label("region", "eu");
///
/// let labels = submission.folded_labels();
/// assert_eq!(labels["service_name"], "checkout");
/// assert_eq!(labels["region"], "eu");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MetricSubmission {
    /// Name of the submitting service.
    #[validate(length(min = 1, message = "service_name cannot be empty"))]
    pub service_name: String,

    /// Metric name, without the exposition prefix.
    #[validate(length(min = 1, message = "metric_name cannot be empty"))]
    pub metric_name: String,

    /// One of `counter`, `gauge`, `histogram`.
    pub metric_type: String,

    /// Observed value.
    pub value: f64,

    /// Additional labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

impl MetricSubmission {
    /// Creates a submission without extra labels.
    #[must_use]
    pub fn new(
        service_name: impl Into<String>,
        metric_name: impl Into<String>,
        kind: MetricKind,
        value: f64,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            metric_name: metric_name.into(),
            metric_type: kind.to_string(),
            value,
            labels: None,
        }
    }

    /// Adds a label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels
            .get_or_insert_with(Labels::new)
            .insert(key.into(), value.into());
        self
    }

    /// Parses `metric_type`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownMetricKind`] for anything but `counter`, `gauge` and
    /// `histogram`.
    pub fn kind(&self) -> Result<MetricKind, UnknownMetricKind> {
        self.metric_type.parse()
    }

    /// Returns the labels with `service_name` folded in.
    ///
    /// The submitting service always wins over a client label of the same
    /// key.
    #[must_use]
    pub fn folded_labels(&self) -> Labels {
        let mut labels = self.labels.clone().unwrap_or_default();
        labels.insert(SERVICE_NAME_LABEL.to_string(), self.service_name.clone());
        labels
    }
}
