//! Incoming contact submissions and their validation.
//!
//! [`SubmissionInput`] is the raw, deserialised request body. The engine only
//! accepts a [`Submission`], which can only be obtained through
//! [`SubmissionInput::validate`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{contact::NewContact, ids::ContactId};

const MIN_USERNAME_LEN: usize = 3;
const MIN_PHONE: i64 = 1_000_000_000;
const MAX_PHONE: i64 = 9_999_999_999;
const MAX_EMAIL_LOCAL_LEN: usize = 64;
const MAX_EMAIL_LEN: usize = 254;

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Why a submission was rejected before matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("username cannot be null")]
  EmptyUsername,

  #[error("username must be at least 3 characters long")]
  UsernameTooShort,

  #[error("phonenumber must be a valid 10-digit integer")]
  InvalidPhoneNumber(i64),

  #[error("value is not a valid email address: {0:?}")]
  InvalidEmail(String),

  #[error("matm_owner cannot be empty")]
  EmptyOwner,
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// The `POST /contacts` body as received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionInput {
  pub username:     String,
  #[serde(rename = "phonenumber")]
  pub phone_number: i64,
  pub email:        String,
  #[serde(rename = "email_opt_in_status")]
  pub email_opt_in: bool,
  #[serde(rename = "sms_opt_in_status")]
  pub sms_opt_in:   bool,
  #[serde(default)]
  pub country:      Option<String>,
  #[serde(default)]
  pub state:        Option<String>,
  pub matm_owner:   String,
}

impl SubmissionInput {
  /// Check every field and produce a [`Submission`] the engine can match.
  pub fn validate(self) -> Result<Submission, ValidationError> {
    if self.username.is_empty() {
      return Err(ValidationError::EmptyUsername);
    }
    if self.username.chars().count() < MIN_USERNAME_LEN {
      return Err(ValidationError::UsernameTooShort);
    }
    if !(MIN_PHONE..=MAX_PHONE).contains(&self.phone_number) {
      return Err(ValidationError::InvalidPhoneNumber(self.phone_number));
    }
    if !is_valid_email(&self.email) {
      return Err(ValidationError::InvalidEmail(self.email));
    }
    if self.matm_owner.trim().is_empty() {
      return Err(ValidationError::EmptyOwner);
    }

    Ok(Submission {
      username:     self.username,
      phone_number: self.phone_number as u64,
      email:        self.email,
      email_opt_in: self.email_opt_in,
      sms_opt_in:   self.sms_opt_in,
      country:      self.country,
      state:        self.state,
      matm_owner:   self.matm_owner,
    })
  }
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// A validated submission. Fields are read-only once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
  username:     String,
  phone_number: u64,
  email:        String,
  email_opt_in: bool,
  sms_opt_in:   bool,
  country:      Option<String>,
  state:        Option<String>,
  matm_owner:   String,
}

impl Submission {
  pub fn username(&self) -> &str { &self.username }

  pub fn phone_number(&self) -> u64 { self.phone_number }

  pub fn email(&self) -> &str { &self.email }

  pub fn email_opt_in(&self) -> bool { self.email_opt_in }

  pub fn sms_opt_in(&self) -> bool { self.sms_opt_in }

  pub fn country(&self) -> Option<&str> { self.country.as_deref() }

  pub fn state(&self) -> Option<&str> { self.state.as_deref() }

  pub fn matm_owner(&self) -> &str { &self.matm_owner }

  /// Build the record that would be stored if this submission becomes a new
  /// contact, under a freshly generated [`ContactId`].
  pub fn to_new_contact(&self, status: impl Into<String>) -> NewContact {
    NewContact {
      contact_id:    ContactId::generate(),
      username:      self.username.clone(),
      phone_number:  self.phone_number,
      email:         self.email.clone(),
      email_opt_in:  self.email_opt_in,
      sms_opt_in:    self.sms_opt_in,
      country:       self.country.clone(),
      state:         self.state.clone(),
      matm_owner:    self.matm_owner.clone(),
      individual_id: None,
      status:        Some(status.into()),
    }
  }
}

// ─── Email syntax ────────────────────────────────────────────────────────────

/// Syntactic check for `local@domain`. No DNS lookups.
fn is_valid_email(address: &str) -> bool {
  if address.len() > MAX_EMAIL_LEN {
    return false;
  }
  let Some((local, domain)) = address.split_once('@') else {
    return false;
  };
  is_valid_local_part(local) && is_valid_domain(domain)
}

fn is_valid_local_part(local: &str) -> bool {
  const SPECIALS: &str = "!#$%&'*+/=?^_`{|}~-.";

  !local.is_empty()
    && local.len() <= MAX_EMAIL_LOCAL_LEN
    && !local.starts_with('.')
    && !local.ends_with('.')
    && !local.contains("..")
    && local
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || SPECIALS.contains(c))
}

fn is_valid_domain(domain: &str) -> bool {
  let labels: Vec<&str> = domain.split('.').collect();
  if labels.len() < 2 {
    return false;
  }
  let labels_ok = labels.iter().all(|label| {
    !label.is_empty()
      && label.len() <= 63
      && !label.starts_with('-')
      && !label.ends_with('-')
      && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
  });
  // The top-level label must not be purely numeric.
  labels_ok
    && labels
      .last()
      .is_some_and(|tld| tld.len() >= 2 && tld.chars().any(|c| c.is_ascii_alphabetic()))
}
