//! [`SqliteStore`]: the SQLite implementation of [`ContactStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, types::Value};

use matm_core::{
  contact::{
    Contact, ContactPointEmail, ContactPointPhone, Individual, LocationUpdate,
    NewContact, NewEmailPoint, NewIndividual, NewPhonePoint,
  },
  ids::{ContactId, IndividualId},
  store::ContactStore,
};

use crate::{
  Result,
  encode::{
    CONTACT_COLUMNS, EMAIL_POINT_COLUMNS, INDIVIDUAL_COLUMNS, PHONE_POINT_COLUMNS,
    RawContact, RawEmailPoint, RawIndividual, RawPhonePoint, encode_dt, encode_phone,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A contact store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// are serialized onto the connection's worker thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Shared selects ──────────────────────────────────────────────────────

  /// `filter` is a static SQL fragment that may reference `?1`, bound to
  /// `arg` when present.
  async fn select_contacts(&self, filter: &'static str, arg: Option<Value>) -> Result<Vec<Contact>> {
    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts {filter} ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(arg), RawContact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContact::into_contact).collect()
  }

  async fn select_email_points(
    &self,
    filter: &'static str,
    arg: Option<Value>,
  ) -> Result<Vec<ContactPointEmail>> {
    let raws: Vec<RawEmailPoint> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {EMAIL_POINT_COLUMNS} FROM email_opt_in {filter} ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(arg), RawEmailPoint::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEmailPoint::into_point).collect()
  }

  async fn select_phone_points(
    &self,
    filter: &'static str,
    arg: Option<Value>,
  ) -> Result<Vec<ContactPointPhone>> {
    let raws: Vec<RawPhonePoint> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {PHONE_POINT_COLUMNS} FROM mobile_opt_in {filter} ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(arg), RawPhonePoint::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPhonePoint::into_point).collect()
  }
}

// ─── ContactStore impl ───────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  type Error = crate::Error;

  // ── Lookups ───────────────────────────────────────────────────────────────

  async fn email_points(&self, email: String) -> Result<Vec<ContactPointEmail>> {
    self
      .select_email_points("WHERE email = ?1", Some(Value::Text(email)))
      .await
  }

  async fn phone_points(&self, phone_number: u64) -> Result<Vec<ContactPointPhone>> {
    self
      .select_phone_points(
        "WHERE phonenumber = ?1",
        Some(Value::Integer(encode_phone(phone_number))),
      )
      .await
  }

  async fn find_contact(&self, contact_id: ContactId) -> Result<Option<Contact>> {
    let mut found = self
      .select_contacts(
        "WHERE contact_id = ?1",
        Some(Value::Text(contact_id.into_inner())),
      )
      .await?;
    Ok(found.pop())
  }

  // ── Contact writes ────────────────────────────────────────────────────────

  async fn insert_contact(&self, input: NewContact) -> Result<Contact> {
    let now = Utc::now();
    let mut contact = Contact {
      id:            0,
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

    let contact_id_str    = contact.contact_id.as_str().to_owned();
    let username          = contact.username.clone();
    let phone             = encode_phone(contact.phone_number);
    let email             = contact.email.clone();
    let email_opt_in      = contact.email_opt_in;
    let sms_opt_in        = contact.sms_opt_in;
    let country           = contact.country.clone();
    let state             = contact.state.clone();
    let matm_owner        = contact.matm_owner.clone();
    let individual_id_str = contact.individual_id.as_ref().map(|i| i.as_str().to_owned());
    let status            = contact.status.clone();
    let at_str            = encode_dt(now);

    contact.id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO contacts (
             contact_id, username, phonenumber, email,
             email_opt_in_status, sms_opt_in_status, country, state,
             matm_owner, individual_id, status, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
          rusqlite::params![
            contact_id_str,
            username,
            phone,
            email,
            email_opt_in,
            sms_opt_in,
            country,
            state,
            matm_owner,
            individual_id_str,
            status,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(contact)
  }

  async fn update_location(
    &self,
    contact_id: ContactId,
    update: LocationUpdate,
  ) -> Result<Option<Contact>> {
    let id_str = contact_id.into_inner();
    let at_str = encode_dt(Utc::now());

    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE contacts
             SET country = ?1, state = ?2, status = ?3, updated_at = ?4
           WHERE contact_id = ?5",
          rusqlite::params![update.country, update.state, update.status, at_str, id_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }

        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE contact_id = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawContact::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn link_individual(
    &self,
    contact_id: ContactId,
    individual_id: IndividualId,
  ) -> Result<bool> {
    let id_str         = contact_id.into_inner();
    let individual_str = individual_id.into_inner();
    let at_str         = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE contacts SET individual_id = ?1, updated_at = ?2 WHERE contact_id = ?3",
          rusqlite::params![individual_str, at_str, id_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── Projection writes ─────────────────────────────────────────────────────

  async fn insert_email_point(&self, input: NewEmailPoint) -> Result<ContactPointEmail> {
    let mut point = ContactPointEmail {
      id:          0,
      username:    input.username,
      email:       input.email,
      country:     input.country,
      state:       input.state,
      matm_owner:  input.matm_owner,
      contact_id:  input.contact_id,
      recorded_at: Utc::now(),
    };

    let username       = point.username.clone();
    let email          = point.email.clone();
    let country        = point.country.clone();
    let state          = point.state.clone();
    let matm_owner     = point.matm_owner.clone();
    let contact_id_str = point.contact_id.as_str().to_owned();
    let at_str         = encode_dt(point.recorded_at);

    point.id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO email_opt_in (
             username, email, country, state, matm_owner, contact_id, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![username, email, country, state, matm_owner, contact_id_str, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(point)
  }

  async fn insert_phone_point(&self, input: NewPhonePoint) -> Result<ContactPointPhone> {
    let mut point = ContactPointPhone {
      id:           0,
      username:     input.username,
      phone_number: input.phone_number,
      country:      input.country,
      state:        input.state,
      matm_owner:   input.matm_owner,
      contact_id:   input.contact_id,
      recorded_at:  Utc::now(),
    };

    let username       = point.username.clone();
    let phone          = encode_phone(point.phone_number);
    let country        = point.country.clone();
    let state          = point.state.clone();
    let matm_owner     = point.matm_owner.clone();
    let contact_id_str = point.contact_id.as_str().to_owned();
    let at_str         = encode_dt(point.recorded_at);

    point.id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO mobile_opt_in (
             username, phonenumber, country, state, matm_owner, contact_id, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![username, phone, country, state, matm_owner, contact_id_str, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(point)
  }

  async fn insert_individual(&self, input: NewIndividual) -> Result<Individual> {
    let mut individual = Individual {
      id:            0,
      username:      input.username,
      individual_id: input.individual_id,
      recorded_at:   Utc::now(),
    };

    let username       = individual.username.clone();
    let individual_str = individual.individual_id.as_str().to_owned();
    let at_str         = encode_dt(individual.recorded_at);

    individual.id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO individual (username, individual_id, recorded_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![username, individual_str, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(individual)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_contact(&self, id: i64) -> Result<Option<Contact>> {
    let mut found = self
      .select_contacts("WHERE id = ?1", Some(Value::Integer(id)))
      .await?;
    Ok(found.pop())
  }

  async fn list_contacts(&self) -> Result<Vec<Contact>> {
    self.select_contacts("", None).await
  }

  async fn list_email_points(&self) -> Result<Vec<ContactPointEmail>> {
    self.select_email_points("", None).await
  }

  async fn list_phone_points(&self) -> Result<Vec<ContactPointPhone>> {
    self.select_phone_points("", None).await
  }

  async fn list_individuals(&self) -> Result<Vec<Individual>> {
    let raws: Vec<RawIndividual> = self
      .conn
      .call(|conn| {
        let sql = format!("SELECT {INDIVIDUAL_COLUMNS} FROM individual ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawIndividual::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIndividual::into_individual).collect()
  }
}
