//! JSON REST API for MATM contact ingestion.
//!
//! Exposes an axum [`Router`] backed by an [`Engine`] over any
//! [`matm_core::store::ContactStore`]. Transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = matm_api::api_router(Arc::new(Engine::new(store)));
//! ```

pub mod contacts;
pub mod error;
pub mod points;
pub mod timing;

use std::sync::Arc;

use axum::{Json, Router, middleware, routing::get};
use matm_core::{Engine, store::ContactStore};
use serde_json::{Value, json};

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested or layered by the caller.
pub fn api_router<S>(engine: Arc<Engine<S>>) -> Router<()>
where
  S: ContactStore + 'static,
{
  Router::new()
    // Contacts
    .route("/contacts", get(contacts::list::<S>).post(contacts::create::<S>))
    .route("/contacts/{id}", get(contacts::get_one::<S>))
    // Projections
    .route("/email", get(points::email::<S>))
    .route("/mobile", get(points::mobile::<S>))
    .route("/individual", get(points::individuals::<S>))
    .route("/health", get(health))
    .layer(middleware::from_fn(timing::process_time))
    .with_state(engine)
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
