//! Log ingestion pipeline.
//!
//! - [`normalizer`] turns submitted JSON into canonical [`LogEntry`] values.
//! - [`router`] hands entries to a sink and keeps the pipeline counters.
//! - [`sink`] is the non-blocking destination that writes entries as JSON
//!   lines.
//!
//! [`LogEntry`]: crate::models::LogEntry

pub mod normalizer;
pub mod router;
pub mod sink;

pub use normalizer::{NormalizeError, Normalizer};
pub use router::{BatchSummary, Delivery, LogRouter, RouteError};
pub use sink::{write_entry, ChannelSink, LogSink, SinkError, INGESTED_TARGET};
