//! Classification of a submission against existing contact points.
//!
//! [`classify`] is pure: it sees only the submission and the contact points
//! sharing its email or phone number, and returns a [`Disposition`]. Fetching
//! those contact points is the caller's job (see
//! [`crate::engine::Engine::resolve`]).

use serde::Serialize;

use crate::{
  contact::{ContactPointEmail, ContactPointPhone},
  ids::ContactId,
  submission::Submission,
};

/// Message recorded for a submission that collides with another identity
/// under the same owner.
pub const CONFLICT_MESSAGE: &str = "matching error on contact data";

/// How a submission relates to what is already known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "disposition", content = "contact_id", rename_all = "snake_case")]
pub enum Disposition {
  /// The same owner already holds this contact under the same username.
  SameOwnerMatch(ContactId),
  /// Another owner holds a contact for the same username.
  CrossOwnerMatch(ContactId),
  /// The same owner holds this email or phone under a different username.
  Conflict,
  /// Nothing relevant is known.
  NoMatch,
}

impl Disposition {
  /// Short label used in logs.
  pub fn label(&self) -> &'static str {
    match self {
      Self::SameOwnerMatch(_) => "same_owner_match",
      Self::CrossOwnerMatch(_) => "cross_owner_match",
      Self::Conflict => "conflict",
      Self::NoMatch => "no_match",
    }
  }
}

/// The fields of a contact point the matcher looks at.
struct Hit<'a> {
  matm_owner: &'a str,
  username:   &'a str,
  contact_id: &'a ContactId,
}

impl<'a> From<&'a ContactPointEmail> for Hit<'a> {
  fn from(p: &'a ContactPointEmail) -> Self {
    Self {
      matm_owner: &p.matm_owner,
      username:   &p.username,
      contact_id: &p.contact_id,
    }
  }
}

impl<'a> From<&'a ContactPointPhone> for Hit<'a> {
  fn from(p: &'a ContactPointPhone) -> Self {
    Self {
      matm_owner: &p.matm_owner,
      username:   &p.username,
      contact_id: &p.contact_id,
    }
  }
}

/// Classify `submission` against the email hits, then the phone hits.
///
/// A same-owner, different-username hit anywhere yields
/// [`Disposition::Conflict`] immediately, even if an earlier hit already
/// produced a same-owner candidate. Otherwise the first same-owner candidate
/// wins, then the first cross-owner candidate. Email hits are scanned first,
/// so on a tie the email-derived candidate is chosen.
pub fn classify(
  submission: &Submission,
  email_hits: &[ContactPointEmail],
  phone_hits: &[ContactPointPhone],
) -> Disposition {
  let hits = email_hits
    .iter()
    .map(Hit::from)
    .chain(phone_hits.iter().map(Hit::from));

  let mut same_owner: Option<&ContactId> = None;
  let mut cross_owner: Option<&ContactId> = None;

  for hit in hits {
    let owner_matches = hit.matm_owner == submission.matm_owner();
    let username_matches = hit.username == submission.username();

    match (owner_matches, username_matches) {
      (true, true) => {
        same_owner.get_or_insert(hit.contact_id);
      }
      (true, false) => return Disposition::Conflict,
      (false, true) => {
        cross_owner.get_or_insert(hit.contact_id);
      }
      (false, false) => {}
    }
  }

  match (same_owner, cross_owner) {
    (Some(id), _) => Disposition::SameOwnerMatch(id.clone()),
    (None, Some(id)) => Disposition::CrossOwnerMatch(id.clone()),
    (None, None) => Disposition::NoMatch,
  }
}
