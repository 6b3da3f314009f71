//! Log normalizer.
//!
//! Turns raw submission bytes into canonical [`LogEntry`] values. Parsing is
//! pure: the only input besides the bytes is the wall clock used to fill a
//! missing timestamp.

use crate::models::{LogEntry, LogLevel, RawLogEntry};
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use validator::Validate;

/// Unix seconds of `0001-01-01T00:00:00Z`, the zero instant many client
/// runtimes serialize for an unset time.
const ZERO_INSTANT_SECS: i64 = -62_135_596_800;

/// Errors produced while normalizing a log submission.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The payload is not valid JSON or does not match the entry shape.
    #[error("{0}")]
    Syntax(#[from] serde_json::Error),

    /// The payload decoded but failed validation.
    #[error("{0}")]
    Invalid(#[from] validator::ValidationErrors),

    /// One entry of a batch failed; the whole batch is rejected.
    #[error("entry {index}: {source}")]
    BatchEntry {
        /// Zero-based position of the first failing entry.
        index: usize,
        /// Why that entry failed.
        #[source]
        source: Box<NormalizeError>,
    },
}

/// Converts raw submissions into canonical log entries.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    clock: fn() -> DateTime<Utc>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Creates a normalizer that stamps entries with the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self { clock: Utc::now }
    }

    /// Creates a normalizer with a custom clock.
    #[must_use]
    pub fn with_clock(clock: fn() -> DateTime<Utc>) -> Self {
        Self { clock }
    }

    /// Normalizes a single JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::Syntax`] if the bytes are not a JSON object
    /// with at least `service_name` and `message`, and
    /// [`NormalizeError::Invalid`] if `service_name` is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use shared::logs::Normalizer;
    /// use shared::models::LogLevel;
    ///
    /// let entry = Normalizer::new()
    ///     .normalize(br#"{"service_name":"svc","level":"warn","message":"disk low"}"#)
    ///     .unwrap();
    ///
    /// assert_eq!(entry.level(), LogLevel::Warn);
    /// ```
    pub fn normalize(&self, bytes: &[u8]) -> Result<LogEntry, NormalizeError> {
        let raw: RawLogEntry = serde_json::from_slice(bytes)?;
        self.finish(raw)
    }

    /// Normalizes an already-decoded JSON value.
    ///
    /// # Errors
    ///
    /// Same as [`Normalizer::normalize`].
    pub fn normalize_value(&self, value: Value) -> Result<LogEntry, NormalizeError> {
        let raw: RawLogEntry = serde_json::from_value(value)?;
        self.finish(raw)
    }

    /// Normalizes a JSON array of entries, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::Syntax`] if the bytes are not a JSON array,
    /// or [`NormalizeError::BatchEntry`] naming the first entry that failed.
    pub fn normalize_batch(&self, bytes: &[u8]) -> Result<Vec<LogEntry>, NormalizeError> {
        let values: Vec<Value> = serde_json::from_slice(bytes)?;

        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                self.normalize_value(value)
                    .map_err(|source| NormalizeError::BatchEntry {
                        index,
                        source: Box::new(source),
                    })
            })
            .collect()
    }

    fn finish(&self, raw: RawLogEntry) -> Result<LogEntry, NormalizeError> {
        raw.validate()?;

        let timestamp = match raw.timestamp {
            Some(ts) if !is_zero_instant(ts) => ts,
            _ => (self.clock)(),
        };

        let mut entry = LogEntry::new(
            raw.service_name,
            LogLevel::resolve(raw.level.as_deref()),
            raw.message,
            timestamp,
        );
        if let Some(fields) = raw.fields {
            entry = entry.with_fields(fields);
        }
        if let Some(trace_id) = raw.trace_id.filter(|id| !id.is_empty()) {
            entry = entry.with_trace_id(trace_id);
        }
        if let Some(span_id) = raw.span_id.filter(|id| !id.is_empty()) {
            entry = entry.with_span_id(span_id);
        }
        Ok(entry)
    }
}

fn is_zero_instant(ts: DateTime<Utc>) -> bool {
    ts.timestamp_subsec_nanos() == 0 && matches!(ts.timestamp(), 0 | ZERO_INSTANT_SECS)
}
