//! Point-in-time copies of registry state.

use crate::models::MetricKind;

/// Cumulative histogram state of one series.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// `(upper_bound, cumulative_count)` pairs in increasing bound order,
    /// excluding the implicit `+Inf` bucket.
    pub buckets: Vec<(f64, u64)>,
    /// Sum of all observations.
    pub sum: f64,
    /// Number of observations; also the `+Inf` bucket count.
    pub count: u64,
}

/// Value of one series.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    /// Running sum.
    Counter(f64),
    /// Last written value.
    Gauge(f64),
    /// Bucketed distribution.
    Histogram(HistogramSnapshot),
}

impl SampleValue {
    /// The scalar value of a counter or gauge.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Counter(v) | Self::Gauge(v) => Some(*v),
            Self::Histogram(_) => None,
        }
    }

    /// The distribution of a histogram.
    #[must_use]
    pub fn as_histogram(&self) -> Option<&HistogramSnapshot> {
        match self {
            Self::Histogram(h) => Some(h),
            Self::Counter(_) | Self::Gauge(_) => None,
        }
    }
}

/// One label-tuple and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSnapshot {
    /// Label values in the family's schema order.
    pub label_values: Vec<String>,
    /// Current value.
    pub value: SampleValue,
}

/// Copy of one family.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilySnapshot {
    /// Family name.
    pub name: String,
    /// Help text.
    pub help: String,
    /// Kind fixed at creation.
    pub kind: MetricKind,
    /// Sorted label keys.
    pub label_keys: Vec<String>,
    /// Series sorted by label values.
    pub series: Vec<SeriesSnapshot>,
}

impl FamilySnapshot {
    /// Finds the series with the given labels, in any order.
    #[must_use]
    pub fn get(&self, labels: &[(&str, &str)]) -> Option<&SampleValue> {
        if labels.len() != self.label_keys.len() {
            return None;
        }
        let wanted: Option<Vec<&str>> = self
            .label_keys
            .iter()
            .map(|key| labels.iter().find(|(k, _)| *k == key.as_str()).map(|(_, v)| *v))
            .collect();
        let wanted = wanted?;

        self.series
            .iter()
            .find(|s| s.label_values.iter().map(String::as_str).eq(wanted.iter().copied()))
            .map(|s| &s.value)
    }
}

/// Copy of every family, sorted by name.
///
/// Families are copied one at a time, so the snapshot is consistent per
/// family but not across families.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySnapshot {
    /// The families.
    pub families: Vec<FamilySnapshot>,
}

impl RegistrySnapshot {
    /// Finds a family by name.
    #[must_use]
    pub fn family(&self, name: &str) -> Option<&FamilySnapshot> {
        self.families.iter().find(|f| f.name == name)
    }

    /// Shorthand for the scalar value of one series.
    #[must_use]
    pub fn value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.family(name)?.get(labels)?.as_f64()
    }
}
