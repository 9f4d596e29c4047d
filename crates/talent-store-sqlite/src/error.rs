//! Error type for `talent-store-sqlite`.

use talent_core::error::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] talent_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value that does not decode into the expected shape.
  #[error("corrupt row: {0}")]
  Corrupt(String),
}

impl From<talent_core::validate::Violations> for Error {
  fn from(v: talent_core::validate::Violations) -> Self { Self::Core(v.into()) }
}

impl StoreError for Error {
  fn core(&self) -> Option<&talent_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
