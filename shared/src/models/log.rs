//! Log data model.
//!
//! Defines the canonical `LogEntry` produced by the normalizer, the
//! `RawLogEntry` wire shape accepted from client services, and the
//! `LogLevel` severity scale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// Log severity level as submitted by remote services.
///
/// The scale matches the levels client loggers emit. `Fatal` and `Panic`
/// describe a failure of the *submitting* service; they never affect the
/// gateway process itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Debug information.
    Debug,
    /// Informational messages.
    Info,
    /// Warning conditions.
    Warn,
    /// Error conditions.
    Error,
    /// The submitting service hit a fatal condition.
    Fatal,
    /// The submitting service panicked.
    Panic,
}

impl LogLevel {
    /// All levels, lowest severity first.
    pub const ALL: [LogLevel; 6] = [
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Fatal,
        Self::Panic,
    ];

    /// Resolves a submitted level string.
    ///
    /// Matching is case-sensitive. `"warning"` is accepted as an alias of
    /// `warn`. Absent and unrecognized levels resolve to [`LogLevel::Info`]:
    /// a log is never rejected because of its level string.
    ///
    /// # Example
    ///
    /// ```
    /// use shared::models::LogLevel;
    ///
    /// assert_eq!(LogLevel::resolve(Some("warning")), LogLevel::Warn);
    /// assert_eq!(LogLevel::resolve(Some("WARN")), LogLevel::Info);
    /// assert_eq!(LogLevel::resolve(None), LogLevel::Info);
    /// ```
    #[must_use]
    pub fn resolve(level: Option<&str>) -> Self {
        match level {
            Some("debug") => Self::Debug,
            Some("info") => Self::Info,
            Some("warn" | "warning") => Self::Warn,
            Some("error") => Self::Error,
            Some("fatal") => Self::Fatal,
            Some("panic") => Self::Panic,
            Some(_) | None => Self::Info,
        }
    }

    /// Returns the priority this level is written at in the local log sink.
    ///
    /// `Fatal` and `Panic` share the highest local priority; the original
    /// severity is kept as an attribute of the sinked event.
    #[must_use]
    pub fn sink_level(self) -> tracing::Level {
        match self {
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error | Self::Fatal | Self::Panic => tracing::Level::ERROR,
        }
    }

    /// Returns the lowercase name used in labels and sink attributes.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
            Self::Panic => "panic",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

/// A log entry as submitted by a client service.
///
/// Only `service_name` and `message` are required. The normalizer turns this
/// into a [`LogEntry`].
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RawLogEntry {
    /// Name of the submitting service.
    #[validate(length(min = 1, message = "service_name cannot be empty"))]
    pub service_name: String,

    /// Level string; resolved with [`LogLevel::resolve`].
    #[serde(default)]
    pub level: Option<String>,

    /// The log message.
    pub message: String,

    /// When the event happened at the source.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    /// Structured attributes attached to the event.
    #[serde(default)]
    pub fields: Option<Map<String, Value>>,

    /// Trace ID for correlation.
    #[serde(default)]
    pub trace_id: Option<String>,

    /// Span ID for correlation.
    #[serde(default)]
    pub span_id: Option<String>,
}

/// A canonical log entry.
///
/// Built once by the normalizer, consumed once by the log router, then
/// discarded. There are no mutating accessors.
///
/// # Example
///
/// ```
/// use shared::models::{LogEntry, LogLevel};
/// use chrono::Utc;
///
/// let entry = LogEntry::new("billing", LogLevel::Warn, "retrying charge", Utc::now())
///     .with_field("attempt", 3)
///     .with_trace_id("trace-abc");
///
/// assert_eq!(entry.level(), LogLevel::Warn);
/// assert_eq!(entry.fields()["attempt"], 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    service_name: String,
    level: LogLevel,
    message: String,
    timestamp: DateTime<Utc>,
    fields: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    span_id: Option<String>,
}

impl LogEntry {
    /// Creates an entry with no fields and no trace correlation.
    #[must_use]
    pub fn new(
        service_name: impl Into<String>,
        level: LogLevel,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            level,
            message: message.into(),
            timestamp,
            fields: Map::new(),
            trace_id: None,
            span_id: None,
        }
    }

    /// Adds a structured field. Fields keep insertion order.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Replaces all structured fields.
    #[must_use]
    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.fields = fields;
        self
    }

    /// Sets the trace ID.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Sets the span ID.
    #[must_use]
    pub fn with_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }

    /// Name of the submitting service.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Resolved severity.
    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// The log message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Source timestamp, or ingestion time when the client sent none.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Structured fields in submission order.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Trace ID, if any.
    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Span ID, if any.
    #[must_use]
    pub fn span_id(&self) -> Option<&str> {
        self.span_id.as_deref()
    }
}
