//! Error types for `quiz-core`.

use thiserror::Error;

/// A submission rejected before any store call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("answer text is blank")]
  BlankAnswer,

  #[error("no score selected")]
  MissingScore,

  #[error("score {0} is outside the range 0-3")]
  ScoreOutOfRange(u8),

  #[error("comment text is blank")]
  BlankComment,

  #[error("name is blank")]
  BlankName,

  #[error("no student answer to grade")]
  NothingToGrade,

  #[error("item is not editable in its current state")]
  NotEditable,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid submission: {0}")]
  Validation(#[from] ValidationError),

  #[error("{collection} record {id} has no field {field:?}")]
  MissingField {
    collection: &'static str,
    id:         uuid::Uuid,
    field:      &'static str,
  },

  #[error("{collection} record {id}: field {field:?} has the wrong type")]
  FieldType {
    collection: &'static str,
    id:         uuid::Uuid,
    field:      &'static str,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error raised by a [`RecordStore`](crate::store::RecordStore).
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn is_validation(&self) -> bool { matches!(self, Self::Validation(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
