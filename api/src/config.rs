//! Server configuration module.
//!
//! Handles loading configuration from environment variables with sensible defaults.

use anyhow::{bail, Context, Result};
use shared::registry::DEFAULT_BUCKETS;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Output format of the gateway's own log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => bail!("unknown log format '{other}', expected json or pretty"),
        }
    }
}

/// Where and how the gateway writes its log.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Directory for a daily rolling `telemetry.log`; stdout only when unset.
    pub directory: Option<PathBuf>,
}

/// Server configuration.
///
/// Configuration values can be set via environment variables (a `.env` file
/// in the working directory is honored):
/// - `TELEMETRY_HOST`: The host address to bind to (default: "0.0.0.0")
/// - `TELEMETRY_PORT`, falling back to `PORT`: The port to listen on (default: 8080)
/// - `TELEMETRY_REQUEST_TIMEOUT_SECS`: Per-request deadline (default: 15)
/// - `TELEMETRY_MAX_BODY_BYTES`: Request body limit (default: 1 MiB)
/// - `TELEMETRY_SINK_CAPACITY`: Log sink queue length (default: 1024)
/// - `TELEMETRY_HISTOGRAM_BUCKETS`: Comma-separated bucket bounds for client histograms
/// - `TELEMETRY_LOG_FORMAT`: `json` or `pretty` (default: json)
/// - `TELEMETRY_LOG_DIR`: Directory for a rolling log file (default: unset)
#[derive(Debug, Clone)]
pub struct Config {
    /// The host address to bind to.
    pub host: String,
    /// The port to listen on.
    pub port: u16,
    /// Deadline for handling one request.
    pub request_timeout: Duration,
    /// Maximum accepted request body size.
    pub max_body_bytes: usize,
    /// Capacity of the bounded log sink queue.
    pub sink_capacity: usize,
    /// Bucket bounds for histogram families created by client submissions.
    pub histogram_buckets: Vec<f64>,
    /// Gateway log output.
    pub logging: LoggingConfig,
    /// The `.env` file values were loaded from, if any.
    pub env_file: Option<PathBuf>,
}

impl Config {
    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let env_file = dotenvy::dotenv().ok();
        Ok(Self {
            env_file,
            ..Self::from_lookup(|key| std::env::var(key).ok())?
        })
    }

    /// Creates a configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("TELEMETRY_HOST").unwrap_or(defaults.host);

        let port = lookup("TELEMETRY_PORT")
            .or_else(|| lookup("PORT"))
            .map(|p| p.parse::<u16>().with_context(|| format!("invalid port '{p}'")))
            .transpose()?
            .unwrap_or(defaults.port);

        let request_timeout = parse_var(&lookup, "TELEMETRY_REQUEST_TIMEOUT_SECS")?
            .map_or(defaults.request_timeout, Duration::from_secs);
        if request_timeout.is_zero() {
            bail!("TELEMETRY_REQUEST_TIMEOUT_SECS must be greater than zero");
        }

        let max_body_bytes =
            parse_var(&lookup, "TELEMETRY_MAX_BODY_BYTES")?.unwrap_or(defaults.max_body_bytes);
        let sink_capacity =
            parse_var(&lookup, "TELEMETRY_SINK_CAPACITY")?.unwrap_or(defaults.sink_capacity);
        if sink_capacity == 0 {
            bail!("TELEMETRY_SINK_CAPACITY must be greater than zero");
        }

        let histogram_buckets = lookup("TELEMETRY_HISTOGRAM_BUCKETS")
            .map(|raw| parse_buckets(&raw))
            .transpose()?
            .unwrap_or(defaults.histogram_buckets);

        let logging = LoggingConfig {
            format: parse_var(&lookup, "TELEMETRY_LOG_FORMAT")?.unwrap_or_default(),
            directory: lookup("TELEMETRY_LOG_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
        };

        Ok(Self {
            host,
            port,
            request_timeout,
            max_body_bytes,
            sink_capacity,
            histogram_buckets,
            logging,
            env_file: None,
        })
    }

    /// Returns the socket address for binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the host and port do not form a valid socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(15),
            max_body_bytes: crate::DEFAULT_MAX_BODY_BYTES,
            sink_capacity: 1024,
            histogram_buckets: DEFAULT_BUCKETS.to_vec(),
            logging: LoggingConfig::default(),
            env_file: None,
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("invalid value '{raw}' for {key}: {e}"))
        })
        .transpose()
}

fn parse_buckets(raw: &str) -> Result<Vec<f64>> {
    let buckets = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .with_context(|| format!("invalid histogram bucket '{s}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    shared::registry::histogram::validate_buckets(&buckets)
        .context("TELEMETRY_HISTOGRAM_BUCKETS")?;
    Ok(buckets)
}
