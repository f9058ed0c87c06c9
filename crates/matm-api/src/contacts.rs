//! Handlers for `/contacts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/contacts` | 201 on create, 200 on update or recorded conflict |
//! | `GET`  | `/contacts` | Every stored contact |
//! | `GET`  | `/contacts/{id}` | By row id; 404 if not found |

use std::{sync::Arc, time::Instant};

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use matm_core::{Engine, SubmissionInput, contact::Contact, store::ContactStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateResponse {
  pub message:    String,
  pub username:   String,
  /// Seconds spent handling the submission.
  #[serde(rename = "time taken")]
  pub time_taken: f64,
}

/// `POST /contacts`
pub async fn create<S>(
  State(engine): State<Arc<Engine<S>>>,
  Json(body): Json<SubmissionInput>,
) -> Result<(StatusCode, Json<CreateResponse>), ApiError>
where
  S: ContactStore + 'static,
{
  let started = Instant::now();
  let submission = body.validate()?;
  let username = submission.username().to_owned();

  let outcome = engine.ingest(submission).await?;
  if outcome.rejected() {
    return Err(ApiError::Conflict(outcome.message));
  }

  let status = if outcome.created() {
    StatusCode::CREATED
  } else {
    StatusCode::OK
  };
  Ok((
    status,
    Json(CreateResponse {
      message: outcome.message,
      username,
      time_taken: started.elapsed().as_secs_f64(),
    }),
  ))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactList {
  pub contacts: Vec<Contact>,
}

/// `GET /contacts`
pub async fn list<S>(
  State(engine): State<Arc<Engine<S>>>,
) -> Result<Json<ContactList>, ApiError>
where
  S: ContactStore + 'static,
{
  let contacts = engine.store().list_contacts().await.map_err(ApiError::store)?;
  Ok(Json(ContactList { contacts }))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactOne {
  pub user: Contact,
}

/// `GET /contacts/{id}`
pub async fn get_one<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(id): Path<i64>,
) -> Result<Json<ContactOne>, ApiError>
where
  S: ContactStore + 'static,
{
  let user = engine
    .store()
    .get_contact(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("contact not found".into()))?;
  Ok(Json(ContactOne { user }))
}
