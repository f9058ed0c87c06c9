//! Load generator: random submissions, then the same identities under a
//! second owner.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use matm_core::SubmissionInput;
use rand_core::{OsRng, RngCore};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::warn;

use crate::client::ApiClient;

const USERNAME_LEN: usize = 8;
const MIN_PHONE: u64 = 1_000_000_000;
const PHONE_SPAN: u64 = 9_000_000_000;

#[derive(Debug, Clone)]
pub struct StressPlan {
  pub requests:     usize,
  pub concurrency:  usize,
  pub owner:        String,
  pub second_owner: String,
}

/// Per-status tally of one run.
#[derive(Debug, Default)]
pub struct Summary {
  /// Keyed by HTTP status code; `0` counts transport failures.
  pub by_status: BTreeMap<u16, Bucket>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Bucket {
  pub count: usize,
  pub total: Duration,
}

impl Bucket {
  pub fn mean(&self) -> Duration {
    match u32::try_from(self.count) {
      Ok(n) if n > 0 => self.total / n,
      _ => Duration::ZERO,
    }
  }
}

impl Summary {
  fn record(&mut self, status: u16, latency: Duration) {
    let bucket = self.by_status.entry(status).or_default();
    bucket.count += 1;
    bucket.total += latency;
  }

  pub fn total(&self) -> usize { self.by_status.values().map(|b| b.count).sum() }

  pub fn print(&self) {
    println!("{:>6}  {:>8}  {:>12}  {:>12}", "status", "count", "total (s)", "mean (ms)");
    for (status, bucket) in &self.by_status {
      println!(
        "{:>6}  {:>8}  {:>12.3}  {:>12.2}",
        status,
        bucket.count,
        bucket.total.as_secs_f64(),
        bucket.mean().as_secs_f64() * 1000.0,
      );
    }
    println!("{:>6}  {:>8}", "all", self.total());
  }
}

// ─── Generation ──────────────────────────────────────────────────────────────

fn random_username() -> String {
  (0..USERNAME_LEN)
    .map(|_| char::from(b'a' + (OsRng.next_u32() % 26) as u8))
    .collect()
}

fn random_phone() -> i64 {
  // Always ten digits; fits in i64.
  (MIN_PHONE + OsRng.next_u64() % PHONE_SPAN) as i64
}

fn random_submission(owner: &str) -> SubmissionInput {
  let username = random_username();
  SubmissionInput {
    email: format!("{username}@test.com"),
    username,
    phone_number: random_phone(),
    email_opt_in: true,
    sms_opt_in: true,
    country: Some("USA".into()),
    state: Some("NJ".into()),
    matm_owner: owner.to_owned(),
  }
}

// ─── Run ─────────────────────────────────────────────────────────────────────

/// Send every submission at most `concurrency` at a time.
async fn fire(
  client: &ApiClient,
  submissions: Vec<SubmissionInput>,
  concurrency: usize,
  summary: &mut Summary,
) -> Result<()> {
  let permits = Arc::new(Semaphore::new(concurrency.max(1)));
  let mut tasks = JoinSet::new();

  for input in submissions {
    let permit = Arc::clone(&permits)
      .acquire_owned()
      .await
      .context("semaphore closed")?;
    let client = client.clone();
    tasks.spawn(async move {
      let _permit = permit;
      client.submit(&input).await
    });
  }

  while let Some(joined) = tasks.join_next().await {
    match joined.context("request task panicked")? {
      Ok(done) => summary.record(done.status.as_u16(), done.latency),
      Err(e) => {
        warn!(error = %e, "request failed");
        summary.record(0, Duration::ZERO);
      }
    }
  }
  Ok(())
}

/// Run `plan` against the server and tally the responses.
pub async fn run(client: &ApiClient, plan: &StressPlan) -> Result<Summary> {
  let first: Vec<SubmissionInput> =
    (0..plan.requests).map(|_| random_submission(&plan.owner)).collect();
  let second: Vec<SubmissionInput> = first
    .iter()
    .cloned()
    .map(|mut s| {
      s.matm_owner = plan.second_owner.clone();
      s
    })
    .collect();

  let mut summary = Summary::default();
  fire(client, first, plan.concurrency, &mut summary).await?;
  fire(client, second, plan.concurrency, &mut summary).await?;
  Ok(summary)
}
