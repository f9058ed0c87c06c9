//! The `ContactStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `matm-store-sqlite`).
//! The engine and the HTTP layer depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use crate::{
  contact::{
    Contact, ContactPointEmail, ContactPointPhone, Individual, LocationUpdate,
    NewContact, NewEmailPoint, NewIndividual, NewPhonePoint,
  },
  ids::{ContactId, IndividualId},
};

/// Abstraction over a contact store backend.
///
/// Contact points and individuals are insert-only. Contacts are inserted once
/// and afterwards only have their location, status, and individual link
/// refreshed.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ContactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Lookups used by the matcher ───────────────────────────────────────

  /// All email contact points for `email`, oldest first.
  fn email_points(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Vec<ContactPointEmail>, Self::Error>> + Send + '_;

  /// All phone contact points for `phone_number`, oldest first.
  fn phone_points(
    &self,
    phone_number: u64,
  ) -> impl Future<Output = Result<Vec<ContactPointPhone>, Self::Error>> + Send + '_;

  /// Look up a contact by its token. Returns `None` if not found.
  fn find_contact(
    &self,
    contact_id: ContactId,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  // ── Contact writes ────────────────────────────────────────────────────

  /// Persist a new contact and return it with its storage id and timestamps.
  fn insert_contact(
    &self,
    input: NewContact,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  /// Refresh `country`, `state` and `status` of an existing contact.
  /// Returns `None` if no contact has that token.
  fn update_location(
    &self,
    contact_id: ContactId,
    update: LocationUpdate,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// Point an existing contact at an individual. Returns `false` if no
  /// contact has that token.
  fn link_individual(
    &self,
    contact_id: ContactId,
    individual_id: IndividualId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Projection writes ─────────────────────────────────────────────────

  fn insert_email_point(
    &self,
    input: NewEmailPoint,
  ) -> impl Future<Output = Result<ContactPointEmail, Self::Error>> + Send + '_;

  fn insert_phone_point(
    &self,
    input: NewPhonePoint,
  ) -> impl Future<Output = Result<ContactPointPhone, Self::Error>> + Send + '_;

  fn insert_individual(
    &self,
    input: NewIndividual,
  ) -> impl Future<Output = Result<Individual, Self::Error>> + Send + '_;

  // ── Reads for the boundary layer ──────────────────────────────────────

  /// Retrieve a contact by storage id. Returns `None` if not found.
  fn get_contact(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  fn list_contacts(
    &self,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  fn list_email_points(
    &self,
  ) -> impl Future<Output = Result<Vec<ContactPointEmail>, Self::Error>> + Send + '_;

  fn list_phone_points(
    &self,
  ) -> impl Future<Output = Result<Vec<ContactPointPhone>, Self::Error>> + Send + '_;

  fn list_individuals(
    &self,
  ) -> impl Future<Output = Result<Vec<Individual>, Self::Error>> + Send + '_;
}
