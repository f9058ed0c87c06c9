//! Async HTTP client wrapping the MATM JSON API.

use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use matm_core::SubmissionInput;
use reqwest::{Client, StatusCode};
use serde_json::Value;

/// Connection settings for the MATM API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// The server's answer to one submission.
#[derive(Debug)]
pub struct Submitted {
  pub status:  StatusCode,
  pub body:    Value,
  pub latency: Duration,
}

/// Async HTTP client for the MATM JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  // ── Contacts ──────────────────────────────────────────────────────────────

  /// `POST /contacts`
  ///
  /// Non-success statuses are returned, not raised, so callers can tally them.
  pub async fn submit(&self, input: &SubmissionInput) -> Result<Submitted> {
    let started = Instant::now();
    let resp = self
      .client
      .post(self.url("/contacts"))
      .json(input)
      .send()
      .await
      .context("POST /contacts failed")?;

    let status = resp.status();
    let body = resp.json().await.unwrap_or(Value::Null);
    Ok(Submitted {
      status,
      body,
      latency: started.elapsed(),
    })
  }

  /// `GET /contacts/{id}`, or `None` on 404.
  pub async fn get_contact(&self, id: i64) -> Result<Option<Value>> {
    let resp = self
      .client
      .get(self.url(&format!("/contacts/{id}")))
      .send()
      .await
      .with_context(|| format!("GET /contacts/{id} failed"))?;

    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !resp.status().is_success() {
      return Err(anyhow!("GET /contacts/{id} → {}", resp.status()));
    }
    resp.json().await.map(Some).context("deserialising contact")
  }

  // ── Listings ──────────────────────────────────────────────────────────────

  /// `GET <path>` for one of the collection endpoints.
  pub async fn list(&self, path: &str) -> Result<Value> {
    let resp = self
      .client
      .get(self.url(path))
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET {path} → {}", resp.status()));
    }
    resp.json().await.context("deserialising listing")
  }
}
