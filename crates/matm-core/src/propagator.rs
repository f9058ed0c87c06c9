//! Projection writes that follow a committed contact.
//!
//! Failures here are logged and swallowed: the contact itself is already
//! stored, and the caller's response must not depend on these rows.

use tracing::{debug, warn};

use crate::{
  contact::{
    Contact, ContactPointEmail, ContactPointPhone, Individual, NewEmailPoint,
    NewIndividual, NewPhonePoint,
  },
  matcher::Disposition,
  resolver::{PendingIndividual, Resolution},
  store::ContactStore,
};

/// Rows written by [`propagate`]. A `None` means the row was not needed or
/// its write failed.
#[derive(Debug, Clone, Default)]
pub struct Propagation {
  pub email_point: Option<ContactPointEmail>,
  pub phone_point: Option<ContactPointPhone>,
  /// Only set when a cross-owner match created the individual.
  pub individual:  Option<Individual>,
}

/// Write the projections a resolution calls for.
///
/// - new contact: one email and one phone contact point, written
///   concurrently and both awaited;
/// - cross-owner match: the same two contact points for the new owner's
///   contact, plus the pending individual, if any, and the link from the
///   matched contact to it;
/// - same-owner match and conflict: nothing.
pub async fn propagate<S: ContactStore>(
  store: &S,
  resolution: &Resolution,
) -> Propagation {
  match (&resolution.disposition, &resolution.contact) {
    (Disposition::NoMatch, Some(contact)) => contact_points(store, contact).await,
    (Disposition::CrossOwnerMatch(_), Some(contact)) => {
      let (points, individual) = tokio::join!(
        contact_points(store, contact),
        async {
          match &resolution.pending_individual {
            Some(pending) => individual(store, pending).await,
            None => {
              debug!("matched contact already linked to an individual");
              None
            }
          }
        },
      );
      Propagation { individual, ..points }
    }
    _ => Propagation::default(),
  }
}

async fn contact_points<S: ContactStore>(store: &S, contact: &Contact) -> Propagation {
  let (email, phone) = tokio::join!(
    store.insert_email_point(NewEmailPoint::for_contact(contact)),
    store.insert_phone_point(NewPhonePoint::for_contact(contact)),
  );

  let email_point = email
    .inspect_err(|e| {
      warn!(contact_id = %contact.contact_id, error = %e, "failed to write email contact point");
    })
    .ok();
  let phone_point = phone
    .inspect_err(|e| {
      warn!(contact_id = %contact.contact_id, error = %e, "failed to write phone contact point");
    })
    .ok();

  Propagation { email_point, phone_point, individual: None }
}

async fn individual<S: ContactStore>(
  store: &S,
  pending: &PendingIndividual,
) -> Option<Individual> {
  let new = NewIndividual {
    username:      pending.username.clone(),
    individual_id: pending.individual_id.clone(),
  };

  let individual = match store.insert_individual(new).await {
    Ok(i) => i,
    Err(e) => {
      warn!(individual_id = %pending.individual_id, error = %e, "failed to write individual");
      return None;
    }
  };

  if let Some(matched) = &pending.matched {
    match store
      .link_individual(matched.clone(), pending.individual_id.clone())
      .await
    {
      Ok(true) => {}
      Ok(false) => warn!(contact_id = %matched, "matched contact vanished before linking"),
      Err(e) => warn!(contact_id = %matched, error = %e, "failed to link matched contact"),
    }
  }

  Some(individual)
}
