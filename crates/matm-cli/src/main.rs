//! `matm`: command-line client for the MATM contact ingestion API.
//!
//! # Usage
//!
//! ```
//! matm submit --username alice123 --phone 5551234567 --email a@x.com --owner T1
//! matm list contacts
//! matm --url http://localhost:8000 stress --requests 500 --concurrency 20
//! ```

mod client;
mod stress;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use client::{ApiClient, ApiConfig};
use matm_core::SubmissionInput;
use serde::Deserialize;
use serde_json::Value;
use stress::StressPlan;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://127.0.0.1:8000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "matm", about = "Client for the MATM contact ingestion API")]
struct Args {
  /// Path to a TOML config file (url).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the server (default: http://127.0.0.1:8000).
  #[arg(long, env = "MATM_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Submit one contact.
  Submit {
    #[arg(long)]
    username:     String,
    #[arg(long)]
    phone:        i64,
    #[arg(long)]
    email:        String,
    #[arg(long)]
    email_opt_in: bool,
    #[arg(long)]
    sms_opt_in:   bool,
    #[arg(long)]
    country:      Option<String>,
    #[arg(long)]
    state:        Option<String>,
    #[arg(long)]
    owner:        String,
  },

  /// Print one of the stored collections.
  List {
    #[arg(value_enum)]
    what: Collection,
  },

  /// Print one contact by row id.
  Get { id: i64 },

  /// Send random submissions, then repeat them under a second owner.
  Stress {
    #[arg(long, default_value_t = 100)]
    requests:     usize,
    #[arg(long, default_value_t = 10)]
    concurrency:  usize,
    #[arg(long, default_value = "TestOrg")]
    owner:        String,
    #[arg(long, default_value = "TestOrg2")]
    second_owner: String,
  },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Collection {
  Contacts,
  Email,
  Mobile,
  Individuals,
}

impl Collection {
  fn path(self) -> &'static str {
    match self {
      Collection::Contacts => "/contacts",
      Collection::Email => "/email",
      Collection::Mobile => "/mobile",
      Collection::Individuals => "/individual",
    }
  }
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url: String,
}

/// CLI flag, then config file, then the default.
fn resolve_url(flag: Option<String>, file: &ConfigFile) -> String {
  flag
    .or_else(|| (!file.url.is_empty()).then(|| file.url.clone()))
    .unwrap_or_else(|| DEFAULT_URL.to_string())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let client = ApiClient::new(ApiConfig {
    base_url: resolve_url(args.url, &file_cfg),
  })?;

  match args.command {
    Command::Submit {
      username,
      phone,
      email,
      email_opt_in,
      sms_opt_in,
      country,
      state,
      owner,
    } => {
      let input = SubmissionInput {
        username,
        phone_number: phone,
        email,
        email_opt_in,
        sms_opt_in,
        country,
        state,
        matm_owner: owner,
      };
      let done = client.submit(&input).await?;
      println!("{}", done.status);
      print_json(&done.body)?;
    }
    Command::List { what } => {
      print_json(&client.list(what.path()).await?)?;
    }
    Command::Get { id } => match client.get_contact(id).await? {
      Some(contact) => print_json(&contact)?,
      None => return Err(anyhow!("contact {id} not found")),
    },
    Command::Stress {
      requests,
      concurrency,
      owner,
      second_owner,
    } => {
      let plan = StressPlan {
        requests,
        concurrency,
        owner,
        second_owner,
      };
      let summary = stress::run(&client, &plan).await?;
      summary.print();
    }
  }

  Ok(())
}

fn print_json(value: &Value) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
