//! [`Engine`]: matcher, resolver and propagator wired to a store.

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
  Error, Result,
  contact::Contact,
  lock::KeyedLocks,
  matcher::{Disposition, classify},
  propagator::{Propagation, propagate},
  resolver::{ConflictPolicy, apply},
  store::ContactStore,
  submission::Submission,
};

/// What happened to one submission.
#[derive(Debug, Clone)]
pub struct Outcome {
  pub disposition: Disposition,
  pub message:     String,
  /// The contact that was written, or `None` if a conflict was rejected.
  pub contact:     Option<Contact>,
  pub propagation: Propagation,
}

impl Outcome {
  /// Whether a new contact record was created for a usable identity.
  pub fn created(&self) -> bool {
    self.contact.is_some()
      && matches!(
        self.disposition,
        Disposition::NoMatch | Disposition::CrossOwnerMatch(_)
      )
  }

  /// Whether the submission was refused without writing anything.
  pub fn rejected(&self) -> bool {
    self.contact.is_none() && self.disposition == Disposition::Conflict
  }
}

/// The identity-resolution engine.
///
/// Submissions sharing an email address or phone number are processed one at
/// a time; all others run concurrently.
pub struct Engine<S> {
  store:           Arc<S>,
  conflict_policy: ConflictPolicy,
  locks:           KeyedLocks,
}

impl<S: ContactStore> Engine<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      conflict_policy: ConflictPolicy::default(),
      locks: KeyedLocks::new(),
    }
  }

  pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
    self.conflict_policy = policy;
    self
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn conflict_policy(&self) -> ConflictPolicy { self.conflict_policy }

  /// Classify `submission` against the stored contact points. Reads only.
  pub async fn resolve(&self, submission: &Submission) -> Result<Disposition> {
    let (email_hits, phone_hits) = tokio::try_join!(
      async {
        self
          .store
          .email_points(submission.email().to_owned())
          .await
          .map_err(Error::store)
      },
      async {
        self
          .store
          .phone_points(submission.phone_number())
          .await
          .map_err(Error::store)
      },
    )?;

    debug!(
      email_hits = email_hits.len(),
      phone_hits = phone_hits.len(),
      "fetched contact points"
    );

    Ok(classify(submission, &email_hits, &phone_hits))
  }

  /// Resolve `submission`, write the contact, and write its projections.
  ///
  /// Propagation failures are logged and do not fail the call; only errors
  /// reading contact points or writing the contact itself are returned.
  pub async fn ingest(&self, submission: Submission) -> Result<Outcome> {
    let _guard = self.locks.acquire(lock_keys(&submission)).await;

    let disposition = self.resolve(&submission).await?;
    let resolution =
      apply(&*self.store, &submission, disposition, self.conflict_policy).await?;
    let propagation = propagate(&*self.store, &resolution).await;

    let outcome = Outcome {
      disposition: resolution.disposition,
      message: resolution.message,
      contact: resolution.contact,
      propagation,
    };

    info!(
      username = submission.username(),
      matm_owner = submission.matm_owner(),
      disposition = outcome.disposition.label(),
      contact_id = outcome.contact.as_ref().map(|c| c.contact_id.as_str()),
      "submission resolved"
    );

    Ok(outcome)
  }
}

fn lock_keys(submission: &Submission) -> Vec<String> {
  vec![
    format!("email:{}", submission.email()),
    format!("phone:{}", submission.phone_number()),
  ]
}
