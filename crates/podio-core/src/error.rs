//! Error types for `podio-core`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown activity type: {0:?}")]
  UnknownActivityType(String),

  #[error("unknown team: {0:?}")]
  UnknownTeam(String),

  #[error("invalid side count {0}; a transaction has 1 or 2 sides")]
  InvalidSides(u8),

  #[error("invalid date range: {start} is after {end}")]
  InvalidRange { start: NaiveDate, end: NaiveDate },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
