//! The `RecordStore` trait and its query predicate.
//!
//! The trait is implemented by storage backends (e.g. `quiz-store-sqlite`).
//! The workflow depends on this abstraction only; it never sees SQL.

use std::future::Future;

use uuid::Uuid;

use crate::record::{FieldValue, Fields, Record};

// ─── Filter ──────────────────────────────────────────────────────────────────

/// A conjunction of exact field-equality tests.
///
/// Text comparison is byte-wise: case- and whitespace-sensitive. A
/// [`FieldValue::Null`] clause matches only absent values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
  clauses: Fields,
}

impl Filter {
  /// A filter matching every record in the collection.
  pub fn all() -> Self { Self::default() }

  /// Add a `field == value` clause.
  pub fn eq(mut self, field: &'static str, value: impl Into<FieldValue>) -> Self {
    self.clauses.push((field, value.into()));
    self
  }

  pub fn clauses(&self) -> &[(&'static str, FieldValue)] { &self.clauses }

  pub fn is_empty(&self) -> bool { self.clauses.is_empty() }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Classification the workflow needs from a backend error.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// `true` when an insert was rejected because another record already holds
  /// the same identity key (a lost insert race).
  fn is_conflict(&self) -> bool { false }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a generic record store backend.
///
/// Reads return records in insertion order. The store itself assigns ids.
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait RecordStore: Send + Sync {
  type Error: StoreError;

  /// Every record of type `R` matching `filter`, in insertion order.
  fn find<'a, R: Record>(
    &'a self,
    filter: &'a Filter,
  ) -> impl Future<Output = Result<Vec<R>, Self::Error>> + Send + 'a;

  /// The first record of type `R` matching `filter`, if any.
  fn find_one<'a, R: Record>(
    &'a self,
    filter: &'a Filter,
  ) -> impl Future<Output = Result<Option<R>, Self::Error>> + Send + 'a;

  /// Insert a new record and return it with its store-assigned id.
  fn insert<R: Record>(
    &self,
    draft: R::Draft,
  ) -> impl Future<Output = Result<R, Self::Error>> + Send + '_;

  /// Overwrite the fields named by `patch` on the record with `id`, leaving
  /// every other field untouched. Fails if no such record exists.
  fn patch<R: Record>(
    &self,
    id: Uuid,
    patch: R::Patch,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
