//! Error type for `quiz-store-sqlite`.

use quiz_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] quiz_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("{collection} has no field {field:?}")]
  UnknownField {
    collection: &'static str,
    field:      &'static str,
  },

  #[error("{collection}.{field} holds a value of unsupported type")]
  UnsupportedValue {
    collection: &'static str,
    field:      &'static str,
  },

  #[error("{collection} record not found: {id}")]
  NotFound {
    collection: &'static str,
    id:         uuid::Uuid,
  },
}

impl StoreError for Error {
  /// A unique index on an identity key rejected the write.
  fn is_conflict(&self) -> bool {
    matches!(
      self,
      Error::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _)))
        if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
