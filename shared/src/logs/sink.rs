//! Structured log sink.
//!
//! The sink accepts canonical entries without blocking the caller. The
//! production implementation is a bounded queue drained by a background task
//! that writes every entry as one JSON line tagged with the
//! [`INGESTED_TARGET`] target.

use crate::models::{LogEntry, LogLevel};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::{self, Write};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

/// `target` value of lines written for ingested entries.
pub const INGESTED_TARGET: &str = "ingested";

/// Errors returned by [`LogSink::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The sink is backlogged; the entry was dropped.
    #[error("log sink is full, entry dropped")]
    Overflow,

    /// The sink no longer accepts writes.
    #[error("log sink is unavailable")]
    Unavailable,
}

impl SinkError {
    /// Value of the `error_kind` label for this failure.
    #[must_use]
    pub fn kind(self) -> &'static str {
        match self {
            Self::Overflow => "sink_overflow",
            Self::Unavailable => "sink_unavailable",
        }
    }
}

/// Destination for routed log entries.
///
/// Implementations must never block: a backlogged sink reports
/// [`SinkError::Overflow`] instead of waiting.
pub trait LogSink: Send + Sync {
    /// Hands an entry to the sink.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Overflow`] when the entry was dropped because the
    /// sink is full, or [`SinkError::Unavailable`] when the sink is closed.
    fn submit(&self, entry: LogEntry) -> Result<(), SinkError>;
}

/// A bounded in-process queue in front of a line writer.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<LogEntry>,
}

impl ChannelSink {
    /// Creates a sink and returns the receiving end of its queue.
    ///
    /// Use [`ChannelSink::spawn`] unless you need to drain the queue yourself.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<LogEntry>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Creates a sink and spawns the task that drains it into `writer`.
    ///
    /// `writer` is called from the runtime and must not block; the gateway
    /// hands in a `tracing_appender` non-blocking writer. The task finishes
    /// once every clone of the sink has been dropped and the queue is empty.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn spawn<W>(capacity: usize, mut writer: W) -> (Self, JoinHandle<()>)
    where
        W: Write + Send + 'static,
    {
        let (sink, mut rx) = Self::new(capacity);
        let handle = tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                if let Err(err) = write_entry(&mut writer, &entry) {
                    tracing::warn!(
                        error = %err,
                        service_name = %entry.service_name(),
                        "Failed to write ingested log entry"
                    );
                }
            }
            if let Err(err) = writer.flush() {
                tracing::warn!(error = %err, "Failed to flush log sink");
            }
            tracing::debug!("Log sink drained");
        });
        (sink, handle)
    }
}

impl LogSink for ChannelSink {
    fn submit(&self, entry: LogEntry) -> Result<(), SinkError> {
        self.tx.try_send(entry).map_err(|err| match err {
            TrySendError::Full(_) => SinkError::Overflow,
            TrySendError::Closed(_) => SinkError::Unavailable,
        })
    }
}

#[derive(Serialize)]
struct IngestedRecord<'a> {
    timestamp: DateTime<Utc>,
    level: &'static str,
    target: &'static str,
    severity: LogLevel,
    service_name: &'a str,
    message: &'a str,
    source_timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    span_id: Option<&'a str>,
    fields: &'a Map<String, Value>,
}

/// Writes an entry as one JSON line at its sink priority.
///
/// `level` carries the local priority from [`LogLevel::sink_level`] and
/// `severity` the submitted one, so `fatal` and `panic` are written at
/// `ERROR` and never escalated to a process abort. Submitted `fields` keep
/// their JSON types.
///
/// # Errors
///
/// Returns any error raised by `writer`.
pub fn write_entry<W: Write>(writer: &mut W, entry: &LogEntry) -> io::Result<()> {
    let record = IngestedRecord {
        timestamp: Utc::now(),
        level: entry.level().sink_level().as_str(),
        target: INGESTED_TARGET,
        severity: entry.level(),
        service_name: entry.service_name(),
        message: entry.message(),
        source_timestamp: entry.timestamp(),
        trace_id: entry.trace_id(),
        span_id: entry.span_id(),
        fields: entry.fields(),
    };

    let mut line = serde_json::to_vec(&record)?;
    line.push(b'\n');
    writer.write_all(&line)
}
