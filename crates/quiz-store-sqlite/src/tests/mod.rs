//! Integration tests for `SqliteStore` and the workflow running on top of it,
//! against an in-memory database.

mod records;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use quiz_core::{
  Quiz,
  record::{NewQuestion, Question, Record},
  store::{Filter, RecordStore},
};
use uuid::Uuid;

use crate::{Error, Result, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn quiz() -> Quiz<SqliteStore> { Quiz::new(store().await) }

fn new_question(instruction: Option<&str>, text: &str, reference: Option<&str>) -> NewQuestion {
  NewQuestion {
    instruction: instruction.map(str::to_owned),
    question:    text.into(),
    rubric:      None,
    kind:        None,
    answer:      reference.map(str::to_owned),
  }
}

/// Seed the question bank the way an external authoring tool would.
async fn seed<S: RecordStore>(store: &S, questions: Vec<NewQuestion>) -> Vec<Question> {
  let mut seeded = Vec::new();
  for q in questions {
    seeded.push(store.insert::<Question>(q).await.unwrap());
  }
  seeded
}

// ─── Wrapper stores ──────────────────────────────────────────────────────────

/// Counts writes and can be told to fail them.
struct Flaky {
  inner:       SqliteStore,
  fail_writes: AtomicBool,
  writes:      AtomicUsize,
}

impl Flaky {
  fn new(inner: SqliteStore) -> Self {
    Self { inner, fail_writes: AtomicBool::new(false), writes: AtomicUsize::new(0) }
  }

  fn set_failing(&self, failing: bool) { self.fail_writes.store(failing, Ordering::SeqCst); }

  fn writes(&self) -> usize { self.writes.load(Ordering::SeqCst) }

  fn write_attempt(&self) -> Result<()> {
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(Error::Database(tokio_rusqlite::Error::ConnectionClosed));
    }
    self.writes.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }
}

impl RecordStore for Flaky {
  type Error = Error;

  async fn find<'a, R: Record>(&'a self, filter: &'a Filter) -> Result<Vec<R>> {
    self.inner.find::<R>(filter).await
  }

  async fn find_one<'a, R: Record>(&'a self, filter: &'a Filter) -> Result<Option<R>> {
    self.inner.find_one::<R>(filter).await
  }

  async fn insert<R: Record>(&self, draft: R::Draft) -> Result<R> {
    self.write_attempt()?;
    self.inner.insert::<R>(draft).await
  }

  async fn patch<R: Record>(&self, id: Uuid, patch: R::Patch) -> Result<()> {
    self.write_attempt()?;
    self.inner.patch::<R>(id, patch).await
  }
}

/// Answers its next `blind` `find_one` lookups with "nothing there", the way
/// a lookup that ran just before a concurrent writer's insert would.
struct Stale {
  inner: SqliteStore,
  blind: AtomicUsize,
}

impl Stale {
  fn new(inner: SqliteStore, blind: usize) -> Self { Self { inner, blind: AtomicUsize::new(blind) } }
}

impl RecordStore for Stale {
  type Error = Error;

  async fn find<'a, R: Record>(&'a self, filter: &'a Filter) -> Result<Vec<R>> {
    self.inner.find::<R>(filter).await
  }

  async fn find_one<'a, R: Record>(&'a self, filter: &'a Filter) -> Result<Option<R>> {
    let blind = self
      .blind
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok();
    if blind {
      return Ok(None);
    }
    self.inner.find_one::<R>(filter).await
  }

  async fn insert<R: Record>(&self, draft: R::Draft) -> Result<R> { self.inner.insert::<R>(draft).await }

  async fn patch<R: Record>(&self, id: Uuid, patch: R::Patch) -> Result<()> {
    self.inner.patch::<R>(id, patch).await
  }
}
