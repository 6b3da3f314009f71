//! HTTP client for the gateway API.

use anyhow::{bail, Context, Result};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

/// Thin wrapper over the gateway's HTTP endpoints.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    base_url: String,
}

impl GatewayClient {
    /// Creates a client for the gateway at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `GET /api/v1/health`.
    pub async fn health(&self) -> Result<Value> {
        let response = self.http.get(self.url("/api/v1/health")).send().await?;
        json_or_error(response).await
    }

    /// `POST /api/v1/logs`.
    pub async fn submit_log(&self, entry: &Value) -> Result<Value> {
        self.post("/api/v1/logs", entry).await
    }

    /// `POST /api/v1/logs/batch`.
    pub async fn submit_log_batch(&self, entries: &Value) -> Result<Value> {
        self.post("/api/v1/logs/batch", entries).await
    }

    /// `POST /api/v1/metrics`.
    pub async fn submit_metric(&self, submission: &Value) -> Result<Value> {
        self.post("/api/v1/metrics", submission).await
    }

    /// `GET /metrics`, returned as text.
    pub async fn scrape(&self) -> Result<String> {
        let response = self.http.get(self.url("/metrics")).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            bail!("gateway returned {status}: {text}");
        }
        Ok(text)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!(%url, "Submitting");
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        json_or_error(response).await
    }
}

async fn json_or_error(response: Response) -> Result<Value> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .with_context(|| format!("gateway returned {status} with a non-JSON body"))?;

    if status.is_success() {
        Ok(body)
    } else {
        let reason = body["error"].as_str().unwrap_or("unknown error");
        match body.get("index").and_then(Value::as_u64) {
            Some(index) => bail!("gateway returned {status} for entry {index}: {reason}"),
            None => bail!("gateway returned {status}: {reason}"),
        }
    }
}
