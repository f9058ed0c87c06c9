//! Error type for `matm-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored phone number does not fit the domain type.
  #[error("invalid phone number in row: {0}")]
  PhoneNumber(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
