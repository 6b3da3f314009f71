//! Gateway operational metrics.
//!
//! The gateway records its own request traffic into the same registry that
//! holds client metrics, under the `telemetry_http_` prefix.

pub mod http;
pub mod in_flight;

pub use http::HttpMetrics;
pub use in_flight::InFlightGuard;
