//! Telemetry CLI
//!
//! Command-line interface for talking to a running telemetry gateway.
//!
//! # Usage
//!
//! ```bash
//! telemetry --help
//! telemetry health
//! telemetry log --service billing --level warn --message "disk low" --field pct=91
//! telemetry log-batch --file entries.json
//! telemetry metric --service billing --name orders_total --type counter --value 1 --label region=eu
//! telemetry scrape --filter custom_
//! ```

#![deny(unsafe_code)]

mod client;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client::GatewayClient;
use serde_json::{json, Map, Value};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Telemetry CLI - submit logs and metrics to the gateway and scrape it
#[derive(Parser)]
#[command(name = "telemetry")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Gateway URL
    #[arg(
        short,
        long,
        env = "TELEMETRY_API_URL",
        default_value = "http://localhost:8080"
    )]
    api_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway health
    Health,

    /// Submit one log entry
    Log {
        /// Name of the submitting service
        #[arg(short, long)]
        service: String,

        /// Severity (debug, info, warn, error, fatal, panic)
        #[arg(short, long, default_value = "info")]
        level: String,

        /// Log message
        #[arg(short, long)]
        message: String,

        /// Structured field as key=value; values that parse as JSON keep their type
        #[arg(short, long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,

        /// Trace ID for correlation
        #[arg(long)]
        trace_id: Option<String>,

        /// Span ID for correlation
        #[arg(long)]
        span_id: Option<String>,
    },

    /// Submit a JSON array of log entries from a file, or stdin with `-`
    LogBatch {
        /// Path to the JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Submit one metric value
    Metric {
        /// Name of the submitting service
        #[arg(short, long)]
        service: String,

        /// Metric name (exposed as custom_<name>)
        #[arg(short, long)]
        name: String,

        /// Metric kind
        #[arg(short = 't', long = "type", value_enum)]
        kind: MetricType,

        /// Value to record
        #[arg(short, long, allow_negative_numbers = true)]
        value: f64,

        /// Label as key=value
        #[arg(short, long = "label", value_parser = parse_key_value)]
        labels: Vec<(String, String)>,
    },

    /// Print the gateway's text exposition
    Scrape {
        /// Only print families whose name starts with this prefix
        #[arg(long)]
        filter: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MetricType {
    Counter,
    Gauge,
    Histogram,
}

impl MetricType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
        }
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

/// Keeps numbers, booleans and JSON literals typed; everything else is a string.
fn field_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn log_entry(
    service: &str,
    level: &str,
    message: &str,
    fields: &[(String, String)],
    trace_id: Option<&str>,
    span_id: Option<&str>,
) -> Value {
    let mut entry = json!({
        "service_name": service,
        "level": level,
        "message": message,
    });
    if !fields.is_empty() {
        let fields: Map<String, Value> = fields
            .iter()
            .map(|(k, v)| (k.clone(), field_value(v)))
            .collect();
        entry["fields"] = Value::Object(fields);
    }
    if let Some(trace_id) = trace_id {
        entry["trace_id"] = json!(trace_id);
    }
    if let Some(span_id) = span_id {
        entry["span_id"] = json!(span_id);
    }
    entry
}

fn metric_submission(
    service: &str,
    name: &str,
    kind: MetricType,
    value: f64,
    labels: &[(String, String)],
) -> Value {
    let labels: Map<String, Value> = labels
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    json!({
        "service_name": service,
        "metric_name": name,
        "metric_type": kind.as_str(),
        "value": value,
        "labels": labels,
    })
}

fn read_batch(file: &Path) -> Result<Value> {
    let raw = if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?
    };

    let batch: Value = serde_json::from_str(&raw).context("batch file is not valid JSON")?;
    if !batch.is_array() {
        bail!("batch file must contain a JSON array of log entries");
    }
    Ok(batch)
}

/// Keeps whole families (HELP, TYPE and samples) whose name starts with `prefix`.
fn filter_exposition(text: &str, prefix: &str) -> String {
    let mut out = String::new();
    let mut keep = false;
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("# HELP ") {
            keep = rest.starts_with(prefix);
        }
        if keep {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = GatewayClient::new(&cli.api_url, Duration::from_secs(cli.timeout))?;

    match cli.command {
        Some(Commands::Health) => print_json(&client.health().await?)?,
        Some(Commands::Log {
            service,
            level,
            message,
            fields,
            trace_id,
            span_id,
        }) => {
            let entry = log_entry(
                &service,
                &level,
                &message,
                &fields,
                trace_id.as_deref(),
                span_id.as_deref(),
            );
            print_json(&client.submit_log(&entry).await?)?;
        }
        Some(Commands::LogBatch { file }) => {
            let batch = read_batch(&file)?;
            print_json(&client.submit_log_batch(&batch).await?)?;
        }
        Some(Commands::Metric {
            service,
            name,
            kind,
            value,
            labels,
        }) => {
            let submission = metric_submission(&service, &name, kind, value, &labels);
            print_json(&client.submit_metric(&submission).await?)?;
        }
        Some(Commands::Scrape { filter }) => {
            let text = client.scrape().await?;
            match filter {
                Some(prefix) => print!("{}", filter_exposition(&text, &prefix)),
                None => print!("{text}"),
            }
        }
        None => {
            println!("Telemetry CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
