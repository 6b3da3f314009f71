//! Gateway log output.
//!
//! Installs the global `tracing` subscriber: an `EnvFilter` (`RUST_LOG`,
//! default `info`), a stdout layer in the configured format and, when a log
//! directory is configured, a daily rolling JSON file written through a
//! non-blocking appender.
//!
//! Entries ingested from client services go to a separate non-blocking
//! writer, see [`ingested_writer`].

use crate::config::{LogFormat, LoggingConfig};
use anyhow::{Context, Result};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// File name prefix of the rolling log file.
pub const LOG_FILE_NAME: &str = "telemetry.log";

/// File name prefix of the rolling file holding ingested entries.
pub const INGESTED_FILE_NAME: &str = "ingested.log";

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

/// Installs the global subscriber.
///
/// The returned guard flushes the file appender when dropped and must be held
/// until the process exits.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let mut layers: Vec<BoxedLayer> = vec![stdout_layer(config.format)];

    let guard = match &config.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(fmt::layer().json().with_writer(writer).boxed());
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}

fn stdout_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stdout).boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stdout).boxed(),
    }
}


/// Builds the writer the log sink drains ingested entries into.
///
/// Writes to a daily rolling `ingested.log` in the log directory when one is
/// configured, to stdout otherwise. The guard flushes pending lines when
/// dropped.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created.
pub fn ingested_writer(config: &LoggingConfig) -> Result<(NonBlocking, WorkerGuard)> {
    match &config.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, INGESTED_FILE_NAME);
            Ok(tracing_appender::non_blocking(appender))
        }
        None => Ok(tracing_appender::non_blocking(std::io::stdout())),
    }
}
