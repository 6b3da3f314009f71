//! Fixed-bucket histogram aggregate.

use super::RegistryError;
use std::sync::Arc;

/// Default bucket bounds for client histograms, in the unit of the observed
/// values (seconds for latencies).
pub const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Validates bucket bounds and returns them in shareable form.
///
/// # Errors
///
/// Returns [`RegistryError::InvalidBuckets`] unless the bounds are finite and
/// strictly increasing. An empty list is allowed: the histogram then only
/// tracks `+Inf`, sum and count.
pub fn validate_buckets(bounds: &[f64]) -> Result<Arc<[f64]>, RegistryError> {
    let finite = bounds.iter().all(|b| b.is_finite());
    let increasing = bounds.windows(2).all(|w| w[0] < w[1]);
    if finite && increasing {
        Ok(bounds.into())
    } else {
        Err(RegistryError::InvalidBuckets)
    }
}

/// Running distribution for one label-tuple.
///
/// `counts[i]` holds the observations that fell into bucket `i` only; the
/// cumulative view is built at snapshot time.
#[derive(Debug, Clone)]
pub(crate) struct Histogram {
    bounds: Arc<[f64]>,
    counts: Vec<u64>,
    sum: f64,
    count: u64,
}

impl Histogram {
    pub(crate) fn new(bounds: Arc<[f64]>) -> Self {
        let counts = vec![0; bounds.len()];
        Self {
            bounds,
            counts,
            sum: 0.0,
            count: 0,
        }
    }

    pub(crate) fn observe(&mut self, value: f64) {
        // First bound with `value <= bound`; past the end means +Inf only.
        let idx = self.bounds.partition_point(|bound| *bound < value);
        if let Some(slot) = self.counts.get_mut(idx) {
            *slot += 1;
        }
        self.sum += value;
        self.count += 1;
    }

    /// Cumulative `(upper_bound, count)` pairs, excluding `+Inf`.
    pub(crate) fn cumulative(&self) -> Vec<(f64, u64)> {
        let mut running = 0;
        self.bounds
            .iter()
            .zip(&self.counts)
            .map(|(bound, count)| {
                running += count;
                (*bound, running)
            })
            .collect()
    }

    pub(crate) fn sum(&self) -> f64 {
        self.sum
    }

    pub(crate) fn count(&self) -> u64 {
        self.count
    }
}
