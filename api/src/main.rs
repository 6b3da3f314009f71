//! Telemetry Gateway Binary
//!
//! Entry point for the telemetry ingestion gateway.

#![deny(unsafe_code)]

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let config = api::Config::from_env()?;
    // Held until exit so the file appender flushes.
    let _log_guard = api::init_logging(&config.logging)?;

    api::run_server_with_config(config).await
}
