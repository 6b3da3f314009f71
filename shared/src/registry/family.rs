//! Metric family: one name, one kind, one label schema, many series.

use super::histogram::Histogram;
use super::schema::LabelSchema;
use super::snapshot::{FamilySnapshot, HistogramSnapshot, SampleValue, SeriesSnapshot};
use super::RegistryError;
use crate::models::{Labels, MetricKind};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// A single update applied to one series.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Update {
    /// Add to a counter.
    Increment(f64),
    /// Replace a gauge.
    Set(f64),
    /// Add a signed delta to a gauge.
    Adjust(f64),
    /// Insert into a histogram.
    Observe(f64),
}

impl Update {
    fn kind(self) -> MetricKind {
        match self {
            Self::Increment(_) => MetricKind::Counter,
            Self::Set(_) | Self::Adjust(_) => MetricKind::Gauge,
            Self::Observe(_) => MetricKind::Histogram,
        }
    }
}

/// Running aggregate of one label-tuple.
#[derive(Debug)]
enum Aggregate {
    Counter(f64),
    Gauge(f64),
    Histogram(Histogram),
}

impl Aggregate {
    fn apply(&mut self, update: Update) {
        match (self, update) {
            (Self::Counter(sum), Update::Increment(v)) => *sum += v,
            (Self::Gauge(current), Update::Set(v)) => *current = v,
            (Self::Gauge(current), Update::Adjust(delta)) => *current += delta,
            (Self::Histogram(h), Update::Observe(v)) => h.observe(v),
            // The family checks the update kind before any series is touched.
            _ => {}
        }
    }

    fn sample(&self) -> SampleValue {
        match self {
            Self::Counter(sum) => SampleValue::Counter(*sum),
            Self::Gauge(value) => SampleValue::Gauge(*value),
            Self::Histogram(h) => SampleValue::Histogram(HistogramSnapshot {
                buckets: h.cumulative(),
                sum: h.sum(),
                count: h.count(),
            }),
        }
    }
}

type Series = Arc<Mutex<Aggregate>>;

/// Aggregate state for one metric name.
///
/// Kind, schema and bucket bounds are fixed at construction. The series table
/// has its own lock, and every series has its own lock, so updates to
/// different label-tuples never wait on each other once the tuple exists.
#[derive(Debug)]
pub struct MetricFamily {
    name: String,
    help: String,
    kind: MetricKind,
    schema: LabelSchema,
    buckets: Arc<[f64]>,
    series: RwLock<HashMap<Vec<String>, Series>>,
}

impl MetricFamily {
    pub(crate) fn new(
        name: impl Into<String>,
        help: impl Into<String>,
        kind: MetricKind,
        schema: LabelSchema,
        buckets: Arc<[f64]>,
    ) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            kind,
            schema,
            buckets,
            series: RwLock::new(HashMap::new()),
        }
    }

    /// Family name as exposed.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind fixed at creation.
    #[must_use]
    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Label schema fixed at creation.
    #[must_use]
    pub fn schema(&self) -> &LabelSchema {
        &self.schema
    }

    /// Histogram bucket bounds (empty for counters and gauges).
    #[must_use]
    pub fn buckets(&self) -> &[f64] {
        &self.buckets
    }

    pub(crate) fn ensure_kind(&self, requested: MetricKind) -> Result<(), RegistryError> {
        if self.kind == requested {
            Ok(())
        } else {
            Err(RegistryError::KindMismatch {
                name: self.name.clone(),
                existing: self.kind,
                requested,
            })
        }
    }

    /// Applies an update to the series selected by `labels`.
    pub(crate) fn apply(&self, labels: &Labels, update: Update) -> Result<(), RegistryError> {
        self.ensure_kind(update.kind())?;
        let key = self.schema.project(&self.name, labels)?;
        let series = self.series_for(key)?;
        let mut aggregate = series.lock().map_err(|_| RegistryError::LockPoisoned)?;
        aggregate.apply(update);
        Ok(())
    }

    fn series_for(&self, key: Vec<String>) -> Result<Series, RegistryError> {
        {
            let table = self.series.read().map_err(|_| RegistryError::LockPoisoned)?;
            if let Some(series) = table.get(&key) {
                return Ok(Arc::clone(series));
            }
        }

        let mut table = self.series.write().map_err(|_| RegistryError::LockPoisoned)?;
        let series = table.entry(key).or_insert_with(|| {
            Arc::new(Mutex::new(match self.kind {
                MetricKind::Counter => Aggregate::Counter(0.0),
                MetricKind::Gauge => Aggregate::Gauge(0.0),
                MetricKind::Histogram => {
                    Aggregate::Histogram(Histogram::new(Arc::clone(&self.buckets)))
                }
            }))
        });
        Ok(Arc::clone(series))
    }

    /// Copies the current value of every series.
    ///
    /// Holds the series table read lock and one series lock at a time.
    pub(crate) fn snapshot(&self) -> Result<FamilySnapshot, RegistryError> {
        let table = self.series.read().map_err(|_| RegistryError::LockPoisoned)?;

        let mut series = table
            .iter()
            .map(|(values, aggregate)| {
                let aggregate = aggregate.lock().map_err(|_| RegistryError::LockPoisoned)?;
                Ok(SeriesSnapshot {
                    label_values: values.clone(),
                    value: aggregate.sample(),
                })
            })
            .collect::<Result<Vec<_>, RegistryError>>()?;
        drop(table);

        series.sort_by(|a, b| a.label_values.cmp(&b.label_values));

        Ok(FamilySnapshot {
            name: self.name.clone(),
            help: self.help.clone(),
            kind: self.kind,
            label_keys: self.schema.keys().to_vec(),
            series,
        })
    }
}
