//! Integration tests for the telemetry gateway.
//!
//! These tests drive the complete router through `tower::ServiceExt::oneshot`
//! and check responses together with the registry state behind them.

mod common;
mod exposition_tests;
mod health_tests;
mod logs_tests;
mod metrics_tests;
