//! Error type for `podio-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A stored discriminant (team, activity type, sides) failed to parse.
  #[error("core error: {0}")]
  Core(#[from] podio_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("invalid column value: {0}")]
  InvalidValue(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
