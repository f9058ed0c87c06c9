//! HTTP server assembly for MATM contact ingestion.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use matm_core::{ConflictPolicy, Engine, store::ContactStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `MATM_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub store_path:      PathBuf,
  pub conflict_policy: ConflictPolicy,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:            "127.0.0.1".to_string(),
      port:            8000,
      store_path:      PathBuf::from("contacts.db"),
      conflict_policy: ConflictPolicy::Record,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application: the API routes over `store`, traced.
pub fn app<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: ContactStore + 'static,
{
  let engine = Engine::new(store).with_conflict_policy(config.conflict_policy);
  matm_api::api_router(Arc::new(engine)).layer(TraceLayer::new_for_http())
}
