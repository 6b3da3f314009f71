//! Telemetry Gateway Shared Library
//!
//! Domain types and engines used by the telemetry gateway: submission
//! models, the log pipeline and the metric registry.
//!
//! # Modules
//!
//! - [`models`] - Log entries, severities and metric submissions
//! - [`logs`] - Normalizer, router and sink for ingested log entries
//! - [`registry`] - Schema-on-first-write metric registry and text exposition
//!
//! # Example
//!
//! ```
//! use shared::logs::Normalizer;
//! use shared::models::LogLevel;
//!
//! let entry = Normalizer::new()
//!     .normalize(br#"{"service_name":"svc","level":"warning","message":"disk low"}"#)
//!     .unwrap();
//!
//! assert_eq!(entry.level(), LogLevel::Warn);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod logs;
pub mod models;
pub mod registry;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
pub use validator;
