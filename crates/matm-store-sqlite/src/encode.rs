//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. Phone numbers are stored as
//! INTEGER and must round-trip into `u64`. Tokens are stored as plain text.

use chrono::{DateTime, Utc};
use matm_core::contact::{Contact, ContactPointEmail, ContactPointPhone, Individual};
use rusqlite::Row;

use crate::{Error, Result};

// ─── Column lists ────────────────────────────────────────────────────────────

pub const CONTACT_COLUMNS: &str = "id, contact_id, username, phonenumber, email,
  email_opt_in_status, sms_opt_in_status, country, state, matm_owner,
  individual_id, status, created_at, updated_at";

pub const EMAIL_POINT_COLUMNS: &str =
  "id, username, email, country, state, matm_owner, contact_id, recorded_at";

pub const PHONE_POINT_COLUMNS: &str =
  "id, username, phonenumber, country, state, matm_owner, contact_id, recorded_at";

pub const INDIVIDUAL_COLUMNS: &str = "id, username, individual_id, recorded_at";

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Phone numbers ───────────────────────────────────────────────────────────

/// Ten-digit numbers always fit; anything wider is rejected by validation
/// long before it reaches the store.
pub fn encode_phone(n: u64) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

pub fn decode_phone(n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::PhoneNumber(n))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `contacts` row.
pub struct RawContact {
  pub id:            i64,
  pub contact_id:    String,
  pub username:      String,
  pub phonenumber:   i64,
  pub email:         String,
  pub email_opt_in:  bool,
  pub sms_opt_in:    bool,
  pub country:       Option<String>,
  pub state:         Option<String>,
  pub matm_owner:    String,
  pub individual_id: Option<String>,
  pub status:        Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawContact {
  /// Read a row selected with [`CONTACT_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      contact_id:    row.get(1)?,
      username:      row.get(2)?,
      phonenumber:   row.get(3)?,
      email:         row.get(4)?,
      email_opt_in:  row.get(5)?,
      sms_opt_in:    row.get(6)?,
      country:       row.get(7)?,
      state:         row.get(8)?,
      matm_owner:    row.get(9)?,
      individual_id: row.get(10)?,
      status:        row.get(11)?,
      created_at:    row.get(12)?,
      updated_at:    row.get(13)?,
    })
  }

  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      id:            self.id,
      contact_id:    self.contact_id.into(),
      username:      self.username,
      phone_number:  decode_phone(self.phonenumber)?,
      email:         self.email,
      email_opt_in:  self.email_opt_in,
      sms_opt_in:    self.sms_opt_in,
      country:       self.country,
      state:         self.state,
      matm_owner:    self.matm_owner,
      individual_id: self.individual_id.map(Into::into),
      status:        self.status,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from an `email_opt_in` row.
pub struct RawEmailPoint {
  pub id:          i64,
  pub username:    String,
  pub email:       String,
  pub country:     Option<String>,
  pub state:       Option<String>,
  pub matm_owner:  String,
  pub contact_id:  String,
  pub recorded_at: String,
}

impl RawEmailPoint {
  /// Read a row selected with [`EMAIL_POINT_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      username:    row.get(1)?,
      email:       row.get(2)?,
      country:     row.get(3)?,
      state:       row.get(4)?,
      matm_owner:  row.get(5)?,
      contact_id:  row.get(6)?,
      recorded_at: row.get(7)?,
    })
  }

  pub fn into_point(self) -> Result<ContactPointEmail> {
    Ok(ContactPointEmail {
      id:          self.id,
      username:    self.username,
      email:       self.email,
      country:     self.country,
      state:       self.state,
      matm_owner:  self.matm_owner,
      contact_id:  self.contact_id.into(),
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw values read directly from a `mobile_opt_in` row.
pub struct RawPhonePoint {
  pub id:          i64,
  pub username:    String,
  pub phonenumber: i64,
  pub country:     Option<String>,
  pub state:       Option<String>,
  pub matm_owner:  String,
  pub contact_id:  String,
  pub recorded_at: String,
}

impl RawPhonePoint {
  /// Read a row selected with [`PHONE_POINT_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      username:    row.get(1)?,
      phonenumber: row.get(2)?,
      country:     row.get(3)?,
      state:       row.get(4)?,
      matm_owner:  row.get(5)?,
      contact_id:  row.get(6)?,
      recorded_at: row.get(7)?,
    })
  }

  pub fn into_point(self) -> Result<ContactPointPhone> {
    Ok(ContactPointPhone {
      id:           self.id,
      username:     self.username,
      phone_number: decode_phone(self.phonenumber)?,
      country:      self.country,
      state:        self.state,
      matm_owner:   self.matm_owner,
      contact_id:   self.contact_id.into(),
      recorded_at:  decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw values read directly from an `individual` row.
pub struct RawIndividual {
  pub id:            i64,
  pub username:      String,
  pub individual_id: String,
  pub recorded_at:   String,
}

impl RawIndividual {
  /// Read a row selected with [`INDIVIDUAL_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      username:      row.get(1)?,
      individual_id: row.get(2)?,
      recorded_at:   row.get(3)?,
    })
  }

  pub fn into_individual(self) -> Result<Individual> {
    Ok(Individual {
      id:            self.id,
      username:      self.username,
      individual_id: self.individual_id.into(),
      recorded_at:   decode_dt(&self.recorded_at)?,
    })
  }
}
