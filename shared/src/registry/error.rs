//! Registry error type.

use crate::models::{MetricKind, UnknownMetricKind};
use thiserror::Error;

/// Errors that can occur while recording into or reading the registry.
///
/// Every variant except [`RegistryError::LockPoisoned`] describes a bad
/// submission and leaves the registry unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// The submission named a kind other than counter, gauge or histogram.
    #[error(transparent)]
    UnknownMetricKind(#[from] UnknownMetricKind),

    /// The label keys differ from the schema fixed by the family's first
    /// submission.
    #[error("label schema mismatch for metric '{name}': expected keys {expected:?}, got {actual:?}")]
    SchemaMismatch {
        /// Family name.
        name: String,
        /// The family's permanent schema.
        expected: Vec<String>,
        /// The keys that were submitted, sorted.
        actual: Vec<String>,
    },

    /// The name is already used by a family of another kind.
    #[error("metric '{name}' is a {existing}, cannot record it as a {requested}")]
    KindMismatch {
        /// Family name.
        name: String,
        /// Kind the family was created with.
        existing: MetricKind,
        /// Kind of the rejected submission.
        requested: MetricKind,
    },

    /// Counters are monotonic.
    #[error("counter '{name}' cannot be decremented (value {value})")]
    NegativeCounterValue {
        /// Family name.
        name: String,
        /// The rejected value.
        value: f64,
    },

    /// NaN and infinite values are not recorded.
    #[error("metric '{name}' received a non-finite value")]
    NonFiniteValue {
        /// Family name.
        name: String,
    },

    /// The name would produce the same sample lines as another family, for
    /// example a counter `x_count` next to a histogram `x`.
    #[error("metric '{name}' clashes with the sample names of metric '{existing}'")]
    SampleNameClash {
        /// Rejected family name.
        name: String,
        /// The family already using those sample names.
        existing: String,
    },

    /// The metric name is not a valid exposition name.
    #[error("invalid metric name '{0}'")]
    InvalidMetricName(String),

    /// A label name is not valid, or is reserved.
    #[error("invalid label name '{0}'")]
    InvalidLabelName(String),

    /// Histogram bucket bounds must be finite and strictly increasing.
    #[error("histogram buckets must be finite and strictly increasing")]
    InvalidBuckets,

    /// A lock was poisoned by a panicking writer.
    #[error("metric registry lock poisoned")]
    LockPoisoned,
}

impl RegistryError {
    /// Returns true if the error was caused by the submission rather than by
    /// the registry itself.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::LockPoisoned)
    }
}
