//! Metric registry.
//!
//! A concurrency-safe, dynamically growing table of named metric families.
//! The first write to a name fixes the family's kind and label schema; later
//! writes that disagree are rejected without touching recorded values.
//!
//! # Locking
//!
//! - The name → family table sits behind an `RwLock` that is write-locked
//!   only to insert a new family.
//! - Each family's label-tuple table has its own `RwLock`, write-locked only
//!   to insert a new series.
//! - Each series has its own `Mutex` around its aggregate.
//!
//! [`Registry::snapshot`] copies the family list under a short read lock and
//! then visits families one by one.
//!
//! # Example
//!
//! ```
//! use shared::models::Labels;
//! use shared::registry::Registry;
//!
//! let registry = Registry::new();
//! let labels = Labels::from([("a".to_string(), "1".to_string())]);
//!
//! registry.record_counter("x", &labels, 5.0).unwrap();
//! registry.record_counter("x", &labels, 5.0).unwrap();
//!
//! let snapshot = registry.snapshot().unwrap();
//! assert_eq!(snapshot.value("x", &[("a", "1")]), Some(10.0));
//! ```

mod error;
pub mod exposition;
mod family;
pub mod histogram;
mod schema;
pub mod snapshot;

pub use error::RegistryError;
pub use family::MetricFamily;
pub use histogram::DEFAULT_BUCKETS;
pub use schema::LabelSchema;
pub use snapshot::{FamilySnapshot, HistogramSnapshot, RegistrySnapshot, SampleValue, SeriesSnapshot};

use crate::models::{Labels, MetricKind, MetricSubmission};
use family::Update;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Prefix applied to client-submitted metric names on exposition.
pub const CUSTOM_METRIC_PREFIX: &str = "custom_";

/// Suffixes of the sample lines a histogram family writes.
const HISTOGRAM_SUFFIXES: [&str; 3] = ["_bucket", "_sum", "_count"];

/// Declaration of a family ahead of its first write.
///
/// Used for families whose help text, label keys or buckets should not be
/// inferred from a submission.
#[derive(Debug, Clone)]
pub struct FamilyDescriptor {
    name: String,
    kind: MetricKind,
    help: String,
    label_keys: Vec<String>,
    buckets: Option<Vec<f64>>,
}

impl FamilyDescriptor {
    /// Creates a descriptor with no labels.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: MetricKind, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            help: help.into(),
            label_keys: Vec::new(),
            buckets: None,
        }
    }

    /// Sets the label keys, in any order.
    #[must_use]
    pub fn with_label_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.label_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Sets histogram bucket bounds. Ignored for other kinds.
    #[must_use]
    pub fn with_buckets(mut self, buckets: Vec<f64>) -> Self {
        self.buckets = Some(buckets);
        self
    }
}

/// The process-wide metric table.
///
/// Constructed once at startup and shared by handle; tests build their own.
#[derive(Debug)]
pub struct Registry {
    families: RwLock<HashMap<String, Arc<MetricFamily>>>,
    default_buckets: Arc<[f64]>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates an empty registry using [`DEFAULT_BUCKETS`] for histograms
    /// created by a first write.
    #[must_use]
    pub fn new() -> Self {
        Self {
            families: RwLock::new(HashMap::new()),
            default_buckets: DEFAULT_BUCKETS.as_slice().into(),
        }
    }

    /// Creates an empty registry with custom default histogram buckets.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidBuckets`] if the bounds are not finite
    /// and strictly increasing.
    pub fn with_default_buckets(buckets: &[f64]) -> Result<Self, RegistryError> {
        Ok(Self {
            families: RwLock::new(HashMap::new()),
            default_buckets: histogram::validate_buckets(buckets)?,
        })
    }

    /// Declares a family.
    ///
    /// Registering the same name again with the same kind and label keys is a
    /// no-op, so independent components can declare shared families.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::KindMismatch`] or
    /// [`RegistryError::SchemaMismatch`] if the name exists with a different
    /// definition, and validation errors for bad names or buckets.
    pub fn register(&self, descriptor: FamilyDescriptor) -> Result<(), RegistryError> {
        validate_metric_name(&descriptor.name)?;
        let schema = LabelSchema::new(descriptor.label_keys, descriptor.kind)?;
        let buckets = match (descriptor.kind, descriptor.buckets) {
            (MetricKind::Histogram, Some(buckets)) => histogram::validate_buckets(&buckets)?,
            (MetricKind::Histogram, None) => Arc::clone(&self.default_buckets),
            _ => Arc::from([]),
        };

        let mut families = self.families.write().map_err(|_| RegistryError::LockPoisoned)?;
        if let Some(existing) = families.get(&descriptor.name) {
            existing.ensure_kind(descriptor.kind)?;
            if existing.schema() != &schema {
                return Err(RegistryError::SchemaMismatch {
                    name: descriptor.name,
                    expected: existing.schema().keys().to_vec(),
                    actual: schema.keys().to_vec(),
                });
            }
            return Ok(());
        }
        check_sample_names(&families, &descriptor.name, descriptor.kind)?;

        tracing::debug!(name = %descriptor.name, kind = %descriptor.kind, "Registered metric family");
        families.insert(
            descriptor.name.clone(),
            Arc::new(MetricFamily::new(
                descriptor.name,
                descriptor.help,
                descriptor.kind,
                schema,
                buckets,
            )),
        );
        Ok(())
    }

    /// Adds `value` to a counter series.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NegativeCounterValue`] for negative values and
    /// the schema and kind errors described on [`Registry`].
    pub fn record_counter(&self, name: &str, labels: &Labels, value: f64) -> Result<(), RegistryError> {
        check_finite(name, value)?;
        if value < 0.0 {
            return Err(RegistryError::NegativeCounterValue {
                name: name.to_string(),
                value,
            });
        }
        self.apply(name, MetricKind::Counter, labels, Update::Increment(value))
    }

    /// Replaces the value of a gauge series.
    ///
    /// # Errors
    ///
    /// Returns schema, kind and value validation errors.
    pub fn record_gauge(&self, name: &str, labels: &Labels, value: f64) -> Result<(), RegistryError> {
        check_finite(name, value)?;
        self.apply(name, MetricKind::Gauge, labels, Update::Set(value))
    }

    /// Adds a signed delta to a gauge series atomically.
    ///
    /// # Errors
    ///
    /// Returns schema, kind and value validation errors.
    pub fn adjust_gauge(&self, name: &str, labels: &Labels, delta: f64) -> Result<(), RegistryError> {
        check_finite(name, delta)?;
        self.apply(name, MetricKind::Gauge, labels, Update::Adjust(delta))
    }

    /// Inserts `value` into a histogram series.
    ///
    /// # Errors
    ///
    /// Returns schema, kind and value validation errors.
    pub fn record_histogram(&self, name: &str, labels: &Labels, value: f64) -> Result<(), RegistryError> {
        check_finite(name, value)?;
        self.apply(name, MetricKind::Histogram, labels, Update::Observe(value))
    }

    /// Records a client submission.
    ///
    /// The metric is stored as `custom_<metric_name>` with `service_name`
    /// folded into its labels. Returns the exposed family name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownMetricKind`] for an unsupported
    /// `metric_type`, plus everything the `record_*` methods return.
    pub fn record_submission(&self, submission: &MetricSubmission) -> Result<String, RegistryError> {
        let kind = submission.kind()?;
        let name = format!("{CUSTOM_METRIC_PREFIX}{}", submission.metric_name);
        let labels = submission.folded_labels();

        match kind {
            MetricKind::Counter => self.record_counter(&name, &labels, submission.value)?,
            MetricKind::Gauge => self.record_gauge(&name, &labels, submission.value)?,
            MetricKind::Histogram => self.record_histogram(&name, &labels, submission.value)?,
        }
        Ok(name)
    }

    /// Copies the current state of every family.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LockPoisoned`] if a writer panicked while
    /// holding a lock.
    pub fn snapshot(&self) -> Result<RegistrySnapshot, RegistryError> {
        let mut families: Vec<Arc<MetricFamily>> = {
            let table = self.families.read().map_err(|_| RegistryError::LockPoisoned)?;
            table.values().cloned().collect()
        };
        families.sort_by(|a, b| a.name().cmp(b.name()));

        let families = families
            .iter()
            .map(|family| family.snapshot())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RegistrySnapshot { families })
    }

    /// Number of families.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LockPoisoned`] if the table lock is poisoned.
    pub fn family_count(&self) -> Result<usize, RegistryError> {
        Ok(self.families.read().map_err(|_| RegistryError::LockPoisoned)?.len())
    }

    fn apply(&self, name: &str, kind: MetricKind, labels: &Labels, update: Update) -> Result<(), RegistryError> {
        self.family_for(name, kind, labels)?.apply(labels, update)
    }

    /// Returns the family for `name`, creating it from this submission's
    /// labels if it does not exist yet.
    fn family_for(&self, name: &str, kind: MetricKind, labels: &Labels) -> Result<Arc<MetricFamily>, RegistryError> {
        {
            let families = self.families.read().map_err(|_| RegistryError::LockPoisoned)?;
            if let Some(family) = families.get(name) {
                return Ok(Arc::clone(family));
            }
        }

        validate_metric_name(name)?;
        let schema = LabelSchema::from_labels(labels, kind)?;
        let buckets = match kind {
            MetricKind::Histogram => Arc::clone(&self.default_buckets),
            MetricKind::Counter | MetricKind::Gauge => Arc::from([]),
        };

        let mut families = self.families.write().map_err(|_| RegistryError::LockPoisoned)?;
        // Another writer may have created the family between the two locks;
        // the winner's schema holds and the caller's labels are checked
        // against it in `MetricFamily::apply`.
        if let Some(family) = families.get(name) {
            return Ok(Arc::clone(family));
        }
        check_sample_names(&families, name, kind)?;

        tracing::debug!(name, %kind, keys = ?schema.keys(), "Created metric family on first write");
        let family = Arc::new(MetricFamily::new(
            name,
            format!("Custom {kind} metric from external service"),
            kind,
            schema,
            buckets,
        ));
        families.insert(name.to_string(), Arc::clone(&family));
        Ok(family)
    }
}

/// Fails if a new family `name` of `kind` would write sample lines under the
/// same name as an existing family: `x_count` next to histogram `x`, or
/// histogram `x` next to `x_sum`.
fn check_sample_names(
    families: &HashMap<String, Arc<MetricFamily>>,
    name: &str,
    kind: MetricKind,
) -> Result<(), RegistryError> {
    let shadowed_histogram = HISTOGRAM_SUFFIXES.iter().find_map(|suffix| {
        let base = name.strip_suffix(suffix)?;
        families
            .get(base)
            .filter(|family| family.kind() == MetricKind::Histogram)
    });
    let shadowed_family = match kind {
        MetricKind::Histogram => HISTOGRAM_SUFFIXES
            .iter()
            .find_map(|suffix| families.get(&format!("{name}{suffix}"))),
        MetricKind::Counter | MetricKind::Gauge => None,
    };

    match shadowed_histogram.or(shadowed_family) {
        Some(existing) => Err(RegistryError::SampleNameClash {
            name: name.to_string(),
            existing: existing.name().to_string(),
        }),
        None => Ok(()),
    }
}

fn validate_metric_name(name: &str) -> Result<(), RegistryError> {
    if schema::is_valid_metric_name(name) {
        Ok(())
    } else {
        Err(RegistryError::InvalidMetricName(name.to_string()))
    }
}

fn check_finite(name: &str, value: f64) -> Result<(), RegistryError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RegistryError::NonFiniteValue {
            name: name.to_string(),
        })
    }
}
