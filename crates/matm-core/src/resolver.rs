//! Turning a [`Disposition`] into the authoritative contact write.
//!
//! Every path writes the contact record at most once. Side effects on the
//! projection tables are left to [`crate::propagator`].

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
  Error, Result,
  contact::{Contact, LocationUpdate, NewContact},
  ids::{ContactId, IndividualId},
  matcher::{CONFLICT_MESSAGE, Disposition},
  store::ContactStore,
  submission::Submission,
};

pub const CREATED_MESSAGE: &str = "Contact added successfully";
pub const UPDATED_MESSAGE: &str = "contact Updated";

const CREATED_STATUS: &str = "created";
const UPDATED_STATUS: &str = "updated";

// ─── Policy ──────────────────────────────────────────────────────────────────

/// What to do with a submission classified as [`Disposition::Conflict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
  /// Persist the submission stamped with the conflict message, for audit.
  #[default]
  Record,
  /// Persist nothing.
  Reject,
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// An individual that must be created because a cross-owner match was found
/// and the matched contact had no individual yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingIndividual {
  pub individual_id: IndividualId,
  pub username:      String,
  /// The other owner's contact, to be linked once the individual exists.
  pub matched:       Option<ContactId>,
}

/// Result of applying a disposition.
#[derive(Debug, Clone)]
pub struct Resolution {
  /// The disposition that was actually applied. Differs from the classified
  /// one only when a same-owner match pointed at a missing contact.
  pub disposition:        Disposition,
  /// The written contact, or `None` when a conflict was rejected.
  pub contact:            Option<Contact>,
  pub message:            String,
  pub pending_individual: Option<PendingIndividual>,
}

// ─── Apply ───────────────────────────────────────────────────────────────────

/// Write the contact `disposition` calls for under `policy`.
pub async fn apply<S: ContactStore>(
  store: &S,
  submission: &Submission,
  disposition: Disposition,
  policy: ConflictPolicy,
) -> Result<Resolution> {
  match disposition {
    Disposition::Conflict => conflict(store, submission, policy).await,
    Disposition::SameOwnerMatch(contact_id) => {
      same_owner(store, submission, contact_id).await
    }
    Disposition::CrossOwnerMatch(contact_id) => {
      cross_owner(store, submission, contact_id).await
    }
    Disposition::NoMatch => no_match(store, submission).await,
  }
}

async fn conflict<S: ContactStore>(
  store: &S,
  submission: &Submission,
  policy: ConflictPolicy,
) -> Result<Resolution> {
  let contact = match policy {
    ConflictPolicy::Record => {
      Some(insert(store, submission.to_new_contact(CONFLICT_MESSAGE)).await?)
    }
    ConflictPolicy::Reject => None,
  };

  Ok(Resolution {
    disposition: Disposition::Conflict,
    contact,
    message: CONFLICT_MESSAGE.to_owned(),
    pending_individual: None,
  })
}

async fn same_owner<S: ContactStore>(
  store: &S,
  submission: &Submission,
  contact_id: ContactId,
) -> Result<Resolution> {
  let update = LocationUpdate {
    country: submission.country().map(str::to_owned),
    state:   submission.state().map(str::to_owned),
    status:  UPDATED_STATUS.to_owned(),
  };

  let updated = store
    .update_location(contact_id.clone(), update)
    .await
    .map_err(Error::store)?;

  match updated {
    Some(contact) => Ok(Resolution {
      disposition: Disposition::SameOwnerMatch(contact_id),
      contact: Some(contact),
      message: UPDATED_MESSAGE.to_owned(),
      pending_individual: None,
    }),
    None => {
      warn!(
        %contact_id,
        "contact point refers to a missing contact; creating a new contact"
      );
      no_match(store, submission).await
    }
  }
}

async fn cross_owner<S: ContactStore>(
  store: &S,
  submission: &Submission,
  contact_id: ContactId,
) -> Result<Resolution> {
  let matched = store
    .find_contact(contact_id.clone())
    .await
    .map_err(Error::store)?;

  let matched_exists = matched.is_some();
  if !matched_exists {
    warn!(%contact_id, "cross-owner match refers to a missing contact");
  }

  let mut new = submission.to_new_contact(CREATED_STATUS);

  // Individuals are created lazily: only when the matched contact is not yet
  // linked to one.
  let pending_individual = match matched.and_then(|c| c.individual_id) {
    Some(existing) => {
      new.individual_id = Some(existing);
      None
    }
    None => {
      let individual_id = IndividualId::generate();
      new.individual_id = Some(individual_id.clone());
      Some(PendingIndividual {
        individual_id,
        username: submission.username().to_owned(),
        matched: matched_exists.then(|| contact_id.clone()),
      })
    }
  };

  let contact = insert(store, new).await?;

  Ok(Resolution {
    disposition: Disposition::CrossOwnerMatch(contact_id),
    contact: Some(contact),
    message: CREATED_MESSAGE.to_owned(),
    pending_individual,
  })
}

async fn no_match<S: ContactStore>(
  store: &S,
  submission: &Submission,
) -> Result<Resolution> {
  let contact = insert(store, submission.to_new_contact(CREATED_MESSAGE)).await?;

  Ok(Resolution {
    disposition: Disposition::NoMatch,
    contact: Some(contact),
    message: CREATED_MESSAGE.to_owned(),
    pending_individual: None,
  })
}

async fn insert<S: ContactStore>(store: &S, new: NewContact) -> Result<Contact> {
  store.insert_contact(new).await.map_err(Error::store)
}
