//! Contact records and their contact-point projections.
//!
//! A [`Contact`] is the canonical record for one (owner, identity) pairing.
//! [`ContactPointEmail`] and [`ContactPointPhone`] rows are append-only
//! projections saying "this contact is reachable here"; the matcher reads
//! them, it never reads contacts directly. An [`Individual`] ties together
//! contacts that different owners hold for the same person.
//!
//! JSON field names follow the public wire format (`phonenumber`,
//! `email_opt_in_status`, ...), not the Rust field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ContactId, IndividualId};

// ─── Contact ─────────────────────────────────────────────────────────────────

/// The canonical identity record, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
  /// Storage-assigned row id.
  pub id:            i64,
  pub contact_id:    ContactId,
  pub username:      String,
  #[serde(rename = "phonenumber")]
  pub phone_number:  u64,
  pub email:         String,
  #[serde(rename = "email_opt_in_status")]
  pub email_opt_in:  bool,
  #[serde(rename = "sms_opt_in_status")]
  pub sms_opt_in:    bool,
  pub country:       Option<String>,
  pub state:         Option<String>,
  pub matm_owner:    String,
  pub individual_id: Option<IndividualId>,
  /// Free-text note describing the last operation on this record.
  pub status:        Option<String>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

/// Input to [`crate::store::ContactStore::insert_contact`].
/// `id` and the timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewContact {
  pub contact_id:    ContactId,
  pub username:      String,
  pub phone_number:  u64,
  pub email:         String,
  pub email_opt_in:  bool,
  pub sms_opt_in:    bool,
  pub country:       Option<String>,
  pub state:         Option<String>,
  pub matm_owner:    String,
  pub individual_id: Option<IndividualId>,
  pub status:        Option<String>,
}

/// Fields refreshed when an owner resubmits a contact it already holds.
#[derive(Debug, Clone)]
pub struct LocationUpdate {
  pub country: Option<String>,
  pub state:   Option<String>,
  pub status:  String,
}

// ─── Contact points ──────────────────────────────────────────────────────────

/// A record that `contact_id` is reachable at `email`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactPointEmail {
  pub id:          i64,
  pub username:    String,
  pub email:       String,
  pub country:     Option<String>,
  pub state:       Option<String>,
  pub matm_owner:  String,
  pub contact_id:  ContactId,
  pub recorded_at: DateTime<Utc>,
}

/// A record that `contact_id` is reachable at `phone_number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactPointPhone {
  pub id:           i64,
  pub username:     String,
  #[serde(rename = "phonenumber")]
  pub phone_number: u64,
  pub country:      Option<String>,
  pub state:        Option<String>,
  pub matm_owner:   String,
  pub contact_id:   ContactId,
  pub recorded_at:  DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEmailPoint {
  pub username:   String,
  pub email:      String,
  pub country:    Option<String>,
  pub state:      Option<String>,
  pub matm_owner: String,
  pub contact_id: ContactId,
}

impl NewEmailPoint {
  /// Project `contact` onto its email channel.
  pub fn for_contact(contact: &Contact) -> Self {
    Self {
      username:   contact.username.clone(),
      email:      contact.email.clone(),
      country:    contact.country.clone(),
      state:      contact.state.clone(),
      matm_owner: contact.matm_owner.clone(),
      contact_id: contact.contact_id.clone(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct NewPhonePoint {
  pub username:     String,
  pub phone_number: u64,
  pub country:      Option<String>,
  pub state:        Option<String>,
  pub matm_owner:   String,
  pub contact_id:   ContactId,
}

impl NewPhonePoint {
  /// Project `contact` onto its phone channel.
  pub fn for_contact(contact: &Contact) -> Self {
    Self {
      username:     contact.username.clone(),
      phone_number: contact.phone_number,
      country:      contact.country.clone(),
      state:        contact.state.clone(),
      matm_owner:   contact.matm_owner.clone(),
      contact_id:   contact.contact_id.clone(),
    }
  }
}

// ─── Individual ──────────────────────────────────────────────────────────────

/// Cross-tenant identity shared by contacts of the same person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
  pub id:            i64,
  pub username:      String,
  pub individual_id: IndividualId,
  pub recorded_at:   DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewIndividual {
  pub username:      String,
  pub individual_id: IndividualId,
}
