//! Opaque identifier tokens.
//!
//! Both tokens are derived from a v4 UUID rendered as lowercase hex without
//! hyphens. A [`ContactId`] keeps only the first eight characters; an
//! [`IndividualId`] keeps all thirty-two.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const CONTACT_ID_LEN: usize = 8;

// ─── ContactId ───────────────────────────────────────────────────────────────

/// Short token assigned to a contact at creation. Never reassigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(String);

impl ContactId {
  /// Generate a fresh 8-character lowercase hex token.
  pub fn generate() -> Self {
    let mut hex = Uuid::new_v4().simple().to_string();
    hex.truncate(CONTACT_ID_LEN);
    Self(hex)
  }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn into_inner(self) -> String { self.0 }
}

impl From<String> for ContactId {
  fn from(s: String) -> Self { Self(s) }
}

impl From<&str> for ContactId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl fmt::Display for ContactId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// ─── IndividualId ────────────────────────────────────────────────────────────

/// Token identifying one real-world person across tenants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndividualId(String);

impl IndividualId {
  pub fn generate() -> Self { Self(Uuid::new_v4().simple().to_string()) }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn into_inner(self) -> String { self.0 }
}

impl From<String> for IndividualId {
  fn from(s: String) -> Self { Self(s) }
}

impl From<&str> for IndividualId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl fmt::Display for IndividualId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}
