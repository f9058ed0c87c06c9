//! Engine tests against an in-memory [`ContactStore`].

use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::{
  ConflictPolicy, Disposition, Engine, SubmissionInput,
  contact::{
    Contact, ContactPointEmail, ContactPointPhone, Individual, LocationUpdate,
    NewContact, NewEmailPoint, NewIndividual, NewPhonePoint,
  },
  ids::{ContactId, IndividualId},
  matcher::CONFLICT_MESSAGE,
  resolver::{CREATED_MESSAGE, UPDATED_MESSAGE},
  store::ContactStore,
};

// ─── Test double ─────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("memory store: {0}")]
struct MemoryError(&'static str);

#[derive(Default)]
struct Tables {
  contacts:     Vec<Contact>,
  email_points: Vec<ContactPointEmail>,
  phone_points: Vec<ContactPointPhone>,
  individuals:  Vec<Individual>,
  next_id:      i64,
}

impl Tables {
  fn next_id(&mut self) -> i64 {
    self.next_id += 1;
    self.next_id
  }
}

/// Vec-backed store. Lookups yield to the scheduler so concurrent
/// submissions genuinely interleave.
#[derive(Default)]
struct MemoryStore {
  tables:            Mutex<Tables>,
  fail_email_points: bool,
  fail_phone_points: bool,
}

impl MemoryStore {
  fn failing_email_points() -> Self {
    Self { fail_email_points: true, ..Self::default() }
  }

  fn failing_phone_points() -> Self {
    Self { fail_phone_points: true, ..Self::default() }
  }

  fn contacts(&self) -> Vec<Contact> { self.tables.lock().unwrap().contacts.clone() }

  fn email_rows(&self) -> usize { self.tables.lock().unwrap().email_points.len() }

  fn phone_rows(&self) -> usize { self.tables.lock().unwrap().phone_points.len() }

  fn individuals(&self) -> Vec<Individual> {
    self.tables.lock().unwrap().individuals.clone()
  }
}

impl ContactStore for MemoryStore {
  type Error = MemoryError;

  async fn email_points(&self, email: String) -> Result<Vec<ContactPointEmail>, MemoryError> {
    tokio::task::yield_now().await;
    let t = self.tables.lock().unwrap();
    Ok(t.email_points.iter().filter(|p| p.email == email).cloned().collect())
  }

  async fn phone_points(&self, phone_number: u64) -> Result<Vec<ContactPointPhone>, MemoryError> {
    tokio::task::yield_now().await;
    let t = self.tables.lock().unwrap();
    Ok(
      t.phone_points
        .iter()
        .filter(|p| p.phone_number == phone_number)
        .cloned()
        .collect(),
    )
  }

  async fn find_contact(&self, contact_id: ContactId) -> Result<Option<Contact>, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(t.contacts.iter().find(|c| c.contact_id == contact_id).cloned())
  }

  async fn insert_contact(&self, input: NewContact) -> Result<Contact, MemoryError> {
    tokio::task::yield_now().await;
    let mut t = self.tables.lock().unwrap();
    let now = Utc::now();
    let contact = Contact {
      id:            t.next_id(),
      contact_id:    input.contact_id,
      username:      input.username,
      phone_number:  input.phone_number,
      email:         input.email,
      email_opt_in:  input.email_opt_in,
      sms_opt_in:    input.sms_opt_in,
      country:       input.country,
      state:         input.state,
      matm_owner:    input.matm_owner,
      individual_id: input.individual_id,
      status:        input.status,
      created_at:    now,
      updated_at:    now,
    };
    t.contacts.push(contact.clone());
    Ok(contact)
  }

  async fn update_location(
    &self,
    contact_id: ContactId,
    update: LocationUpdate,
  ) -> Result<Option<Contact>, MemoryError> {
    let mut t = self.tables.lock().unwrap();
    Ok(t.contacts.iter_mut().find(|c| c.contact_id == contact_id).map(|c| {
      c.country = update.country;
      c.state = update.state;
      c.status = Some(update.status);
      c.updated_at = Utc::now();
      c.clone()
    }))
  }

  async fn link_individual(
    &self,
    contact_id: ContactId,
    individual_id: IndividualId,
  ) -> Result<bool, MemoryError> {
    let mut t = self.tables.lock().unwrap();
    match t.contacts.iter_mut().find(|c| c.contact_id == contact_id) {
      Some(c) => {
        c.individual_id = Some(individual_id);
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn insert_email_point(&self, input: NewEmailPoint) -> Result<ContactPointEmail, MemoryError> {
    if self.fail_email_points {
      return Err(MemoryError("email_opt_in is read-only"));
    }
    let mut t = self.tables.lock().unwrap();
    let point = ContactPointEmail {
      id:          t.next_id(),
      username:    input.username,
      email:       input.email,
      country:     input.country,
      state:       input.state,
      matm_owner:  input.matm_owner,
      contact_id:  input.contact_id,
      recorded_at: Utc::now(),
    };
    t.email_points.push(point.clone());
    Ok(point)
  }

  async fn insert_phone_point(&self, input: NewPhonePoint) -> Result<ContactPointPhone, MemoryError> {
    if self.fail_phone_points {
      return Err(MemoryError("mobile_opt_in is read-only"));
    }
    let mut t = self.tables.lock().unwrap();
    let point = ContactPointPhone {
      id:           t.next_id(),
      username:     input.username,
      phone_number: input.phone_number,
      country:      input.country,
      state:        input.state,
      matm_owner:   input.matm_owner,
      contact_id:   input.contact_id,
      recorded_at:  Utc::now(),
    };
    t.phone_points.push(point.clone());
    Ok(point)
  }

  async fn insert_individual(&self, input: NewIndividual) -> Result<Individual, MemoryError> {
    let mut t = self.tables.lock().unwrap();
    let individual = Individual {
      id:            t.next_id(),
      username:      input.username,
      individual_id: input.individual_id,
      recorded_at:   Utc::now(),
    };
    t.individuals.push(individual.clone());
    Ok(individual)
  }

  async fn get_contact(&self, id: i64) -> Result<Option<Contact>, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(t.contacts.iter().find(|c| c.id == id).cloned())
  }

  async fn list_contacts(&self) -> Result<Vec<Contact>, MemoryError> { Ok(self.contacts()) }

  async fn list_email_points(&self) -> Result<Vec<ContactPointEmail>, MemoryError> {
    Ok(self.tables.lock().unwrap().email_points.clone())
  }

  async fn list_phone_points(&self) -> Result<Vec<ContactPointPhone>, MemoryError> {
    Ok(self.tables.lock().unwrap().phone_points.clone())
  }

  async fn list_individuals(&self) -> Result<Vec<Individual>, MemoryError> {
    Ok(self.individuals())
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn engine() -> Engine<MemoryStore> { Engine::new(Arc::new(MemoryStore::default())) }

fn input(username: &str, owner: &str, email: &str, phone: i64) -> SubmissionInput {
  SubmissionInput {
    username:     username.into(),
    phone_number: phone,
    email:        email.into(),
    email_opt_in: true,
    sms_opt_in:   false,
    country:      Some("USA".into()),
    state:        Some("NJ".into()),
    matm_owner:   owner.into(),
  }
}

fn alice(owner: &str) -> SubmissionInput {
  input("alice123", owner, "a@x.com", 5_551_234_567)
}

// ─── No match ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_store_creates_contact_and_both_contact_points() {
  let e = engine();

  let outcome = e.ingest(alice("T1").validate().unwrap()).await.unwrap();

  assert_eq!(outcome.disposition, Disposition::NoMatch);
  assert_eq!(outcome.message, CREATED_MESSAGE);
  assert!(outcome.created());

  let contact = outcome.contact.unwrap();
  assert_eq!(contact.contact_id.as_str().len(), 8);
  assert_eq!(contact.status.as_deref(), Some(CREATED_MESSAGE));

  let email = outcome.propagation.email_point.unwrap();
  let phone = outcome.propagation.phone_point.unwrap();
  assert_eq!(email.contact_id, contact.contact_id);
  assert_eq!(phone.contact_id, contact.contact_id);
  assert_eq!(phone.phone_number, 5_551_234_567);
  assert!(outcome.propagation.individual.is_none());
}

// ─── Same owner ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn resubmission_updates_instead_of_duplicating() {
  let e = engine();

  let first = e.ingest(alice("T1").validate().unwrap()).await.unwrap();
  let mut again = alice("T1");
  again.state = Some("NY".into());
  again.country = Some("US".into());
  let second = e.ingest(again.validate().unwrap()).await.unwrap();

  let id = first.contact.unwrap().contact_id;
  assert_eq!(second.disposition, Disposition::SameOwnerMatch(id.clone()));
  assert_eq!(second.message, UPDATED_MESSAGE);
  assert!(!second.created());

  let updated = second.contact.unwrap();
  assert_eq!(updated.contact_id, id);
  assert_eq!(updated.state.as_deref(), Some("NY"));
  assert_eq!(updated.country.as_deref(), Some("US"));
  assert_eq!(updated.status.as_deref(), Some("updated"));

  let store = e.store();
  assert_eq!(store.contacts().len(), 1);
  assert_eq!(store.email_rows(), 1);
  assert_eq!(store.phone_rows(), 1);
}

#[tokio::test]
async fn update_keeps_channels_and_opt_ins() {
  let e = engine();
  e.ingest(alice("T1").validate().unwrap()).await.unwrap();

  // Same phone, new email and flipped opt-ins: matched through the phone.
  let mut again = input("alice123", "T1", "alice@elsewhere.org", 5_551_234_567);
  again.email_opt_in = false;
  again.sms_opt_in = true;
  let outcome = e.ingest(again.validate().unwrap()).await.unwrap();

  assert!(matches!(outcome.disposition, Disposition::SameOwnerMatch(_)));
  let contact = outcome.contact.unwrap();
  assert_eq!(contact.email, "a@x.com");
  assert!(contact.email_opt_in);
  assert!(!contact.sms_opt_in);
  assert!(outcome.propagation.email_point.is_none());
}

#[tokio::test]
async fn dangling_contact_point_falls_back_to_new_contact() {
  let store = Arc::new(MemoryStore::default());
  store
    .insert_email_point(NewEmailPoint {
      username:   "alice123".into(),
      email:      "a@x.com".into(),
      country:    None,
      state:      None,
      matm_owner: "T1".into(),
      contact_id: "00000000".into(),
    })
    .await
    .unwrap();
  let e = Engine::new(Arc::clone(&store));

  let outcome = e.ingest(alice("T1").validate().unwrap()).await.unwrap();

  assert_eq!(outcome.disposition, Disposition::NoMatch);
  assert_eq!(store.contacts().len(), 1);
}

// ─── Conflict ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn same_owner_different_username_is_recorded_as_conflict() {
  let e = engine();
  e.ingest(alice("T1").validate().unwrap()).await.unwrap();

  let mallory = input("mallory", "T1", "a@x.com", 5_559_999_999);
  let outcome = e.ingest(mallory.validate().unwrap()).await.unwrap();

  assert_eq!(outcome.disposition, Disposition::Conflict);
  assert!(outcome.message.contains("matching error on contact data"));
  assert!(!outcome.created());
  assert!(!outcome.rejected());

  let audit = outcome.contact.unwrap();
  assert_eq!(audit.status.as_deref(), Some(CONFLICT_MESSAGE));

  let store = e.store();
  assert_eq!(store.contacts().len(), 2);
  assert_eq!(store.email_rows(), 1, "conflicts must not propagate");
  assert_eq!(store.phone_rows(), 1);
  assert!(store.individuals().is_empty());
}

#[tokio::test]
async fn reject_policy_persists_nothing() {
  let e = engine().with_conflict_policy(ConflictPolicy::Reject);
  e.ingest(alice("T1").validate().unwrap()).await.unwrap();

  let mallory = input("mallory", "T1", "m@x.com", 5_551_234_567);
  let outcome = e.ingest(mallory.validate().unwrap()).await.unwrap();

  assert!(outcome.rejected());
  assert_eq!(outcome.message, CONFLICT_MESSAGE);
  assert_eq!(e.store().contacts().len(), 1);
}

#[tokio::test]
async fn phone_conflict_beats_email_same_owner_match() {
  let e = engine();
  e.ingest(alice("T1").validate().unwrap()).await.unwrap();
  e.ingest(input("bob456", "T1", "b@x.com", 5_550_000_000).validate().unwrap())
    .await
    .unwrap();

  // Email belongs to alice@T1, phone belongs to bob@T1.
  let mixed = input("alice123", "T1", "a@x.com", 5_550_000_000);
  let outcome = e.ingest(mixed.validate().unwrap()).await.unwrap();

  assert_eq!(outcome.disposition, Disposition::Conflict);
}

// ─── Cross owner ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn other_owner_same_username_links_an_individual() {
  let e = engine();
  let original = e.ingest(alice("T1").validate().unwrap()).await.unwrap().contact.unwrap();

  let outcome = e.ingest(alice("T2").validate().unwrap()).await.unwrap();

  assert_eq!(
    outcome.disposition,
    Disposition::CrossOwnerMatch(original.contact_id.clone())
  );
  assert_eq!(outcome.message, CREATED_MESSAGE);
  assert!(outcome.created());

  let linked = outcome.contact.unwrap();
  assert_ne!(linked.contact_id, original.contact_id);
  assert_eq!(linked.matm_owner, "T2");
  assert_eq!(linked.status.as_deref(), Some("created"));

  let individual = outcome.propagation.individual.unwrap();
  assert_eq!(individual.username, "alice123");
  assert_eq!(linked.individual_id.as_ref(), Some(&individual.individual_id));

  // The other owner's contact now carries the same individual.
  let store = e.store();
  let contacts = store.contacts();
  let original = contacts.iter().find(|c| c.contact_id == original.contact_id).unwrap();
  assert_eq!(original.individual_id, linked.individual_id);

  // The new owner's contact is projected alongside the individual.
  let email_point = outcome.propagation.email_point.unwrap();
  assert_eq!(email_point.contact_id, linked.contact_id);
  assert_eq!(email_point.matm_owner, "T2");
  assert!(outcome.propagation.phone_point.is_some());
  assert_eq!(store.email_rows(), 2);
  assert_eq!(store.phone_rows(), 2);
  assert_eq!(store.individuals().len(), 1);
}

#[tokio::test]
async fn second_owner_resubmission_updates_its_own_contact() {
  let e = engine();
  e.ingest(alice("T1").validate().unwrap()).await.unwrap();
  let linked = e.ingest(alice("T2").validate().unwrap()).await.unwrap().contact.unwrap();

  let mut moved = alice("T2");
  moved.state = Some("NY".into());
  let again = e.ingest(moved.validate().unwrap()).await.unwrap();

  assert_eq!(
    again.disposition,
    Disposition::SameOwnerMatch(linked.contact_id.clone())
  );
  assert_eq!(again.message, UPDATED_MESSAGE);
  assert_eq!(again.contact.unwrap().state.as_deref(), Some("NY"));

  let store = e.store();
  let t2: Vec<_> = store.contacts().into_iter().filter(|c| c.matm_owner == "T2").collect();
  assert_eq!(t2.len(), 1);
  assert_eq!(store.individuals().len(), 1);
  assert_eq!(store.email_rows(), 2);
}

#[tokio::test]
async fn third_owner_inherits_existing_individual() {
  let e = engine();
  e.ingest(alice("T1").validate().unwrap()).await.unwrap();
  let second = e.ingest(alice("T2").validate().unwrap()).await.unwrap();
  let third = e.ingest(alice("T3").validate().unwrap()).await.unwrap();

  assert!(matches!(third.disposition, Disposition::CrossOwnerMatch(_)));
  assert_eq!(
    third.contact.unwrap().individual_id,
    second.contact.unwrap().individual_id
  );
  assert!(third.propagation.individual.is_none());
  assert!(third.propagation.email_point.is_some());
  assert_eq!(e.store().individuals().len(), 1);
}

// ─── Failure handling ────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_contact_point_write_is_swallowed() {
  let e = Engine::new(Arc::new(MemoryStore::failing_email_points()));

  let outcome = e.ingest(alice("T1").validate().unwrap()).await.unwrap();

  assert_eq!(outcome.disposition, Disposition::NoMatch);
  assert!(outcome.contact.is_some());
  assert!(outcome.propagation.email_point.is_none());
  assert!(outcome.propagation.phone_point.is_some(), "sibling write must still land");
}

#[tokio::test]
async fn failed_phone_point_write_is_swallowed() {
  let e = Engine::new(Arc::new(MemoryStore::failing_phone_points()));

  let outcome = e.ingest(alice("T1").validate().unwrap()).await.unwrap();

  assert_eq!(outcome.disposition, Disposition::NoMatch);
  assert!(outcome.contact.is_some());
  assert!(outcome.propagation.phone_point.is_none());
  assert!(outcome.propagation.email_point.is_some(), "sibling write must still land");
  assert_eq!(e.store().email_rows(), 1);
  assert_eq!(e.store().phone_rows(), 0);
}

// ─── Concurrency ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_identical_submissions_create_one_contact() {
  let e = Arc::new(engine());

  let mut tasks = tokio::task::JoinSet::new();
  for _ in 0..16 {
    let e = Arc::clone(&e);
    tasks.spawn(async move { e.ingest(alice("T1").validate().unwrap()).await.unwrap() });
  }

  let mut created = 0;
  let mut updated = 0;
  while let Some(outcome) = tasks.join_next().await {
    match outcome.unwrap().disposition {
      Disposition::NoMatch => created += 1,
      Disposition::SameOwnerMatch(_) => updated += 1,
      other => panic!("unexpected disposition {other:?}"),
    }
  }

  assert_eq!(created, 1);
  assert_eq!(updated, 15);
  assert_eq!(e.store().contacts().len(), 1);
}
