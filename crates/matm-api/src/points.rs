//! Read-only listings of contact points and individuals.

use std::sync::Arc;

use axum::{Json, extract::State};
use matm_core::{
  Engine,
  contact::{ContactPointEmail, ContactPointPhone, Individual},
  store::ContactStore,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct EmailList {
  pub email: Vec<ContactPointEmail>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PhoneList {
  #[serde(rename = "Phone numbers")]
  pub phone_numbers: Vec<ContactPointPhone>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndividualList {
  pub individuals: Vec<Individual>,
}

/// `GET /email`
pub async fn email<S>(
  State(engine): State<Arc<Engine<S>>>,
) -> Result<Json<EmailList>, ApiError>
where
  S: ContactStore + 'static,
{
  let email = engine
    .store()
    .list_email_points()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(EmailList { email }))
}

/// `GET /mobile`
pub async fn mobile<S>(
  State(engine): State<Arc<Engine<S>>>,
) -> Result<Json<PhoneList>, ApiError>
where
  S: ContactStore + 'static,
{
  let phone_numbers = engine
    .store()
    .list_phone_points()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(PhoneList { phone_numbers }))
}

/// `GET /individual`
pub async fn individuals<S>(
  State(engine): State<Arc<Engine<S>>>,
) -> Result<Json<IndividualList>, ApiError>
where
  S: ContactStore + 'static,
{
  let individuals = engine
    .store()
    .list_individuals()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(IndividualList { individuals }))
}
