//! The caller-facing workflow: validated submissions, per-role reads and the
//! join, all over one shared [`RecordStore`].

use std::sync::{
  Arc,
  atomic::{AtomicU64, Ordering},
};

use crate::{
  Error, Result, ValidationError,
  join::{self, JoinedItem, Snapshot},
  key::{answers_filter, grades_filter},
  record::{Answer, Question, TeacherGrade, User},
  store::{Filter, RecordStore},
  upsert::{self, Registration, Upserted},
};

/// Highest score a teacher may award.
pub const MAX_SCORE: u8 = 3;

/// Workflow facade over a record store.
///
/// Every successful write bumps a revision counter. Snapshots read through
/// this type carry the revision at read time, so a
/// [`JoinedView`](crate::join::JoinedView) can tell when it needs rebuilding.
pub struct Quiz<S> {
  store:    Arc<S>,
  revision: AtomicU64,
}

impl<S: RecordStore> Quiz<S> {
  pub fn new(store: S) -> Self { Self::from_shared(Arc::new(store)) }

  pub fn from_shared(store: Arc<S>) -> Self {
    Self { store, revision: AtomicU64::new(0) }
  }

  pub fn store(&self) -> &S { &self.store }

  /// Number of successful writes made through this instance.
  pub fn revision(&self) -> u64 { self.revision.load(Ordering::Acquire) }

  fn bump(&self) { self.revision.fetch_add(1, Ordering::AcqRel); }

  async fn snapshot<R: crate::record::Record>(&self, filter: Filter) -> Result<Snapshot<R>> {
    let revision = self.revision();
    let records = self.store.find::<R>(&filter).await.map_err(Error::store)?;
    Ok(Snapshot::new(revision, records))
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  /// Register `name`, or return the existing user of that name.
  pub async fn register_user(&self, name: &str) -> Result<Registration> {
    if name.trim().is_empty() {
      return Err(ValidationError::BlankName.into());
    }
    let registration = upsert::register_user(self.store.as_ref(), name).await?;
    self.bump();
    Ok(registration)
  }

  pub async fn users(&self) -> Result<Vec<User>> {
    self
      .store
      .find::<User>(&Filter::all())
      .await
      .map_err(Error::store)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub async fn questions(&self) -> Result<Snapshot<Question>> {
    self.snapshot(Filter::all()).await
  }

  /// Every answer `student` has submitted.
  pub async fn answers_for(&self, student: &str) -> Result<Snapshot<Answer>> {
    self.snapshot(answers_filter(student)).await
  }

  /// Every grade `teacher` has given `student`, orphaned ones included.
  pub async fn grades_for(&self, teacher: &str, student: &str) -> Result<Snapshot<TeacherGrade>> {
    self.snapshot(grades_filter(teacher, student)).await
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Record a student's answer, replacing any earlier answer for the same
  /// `(student, instruction, question)`.
  ///
  /// Blank (or whitespace-only) answers are rejected without touching the
  /// store. The text is stored as given.
  pub async fn submit_answer(
    &self,
    student:     &str,
    instruction: &str,
    question:    &str,
    answer_text: &str,
  ) -> Result<Upserted> {
    if answer_text.trim().is_empty() {
      return Err(ValidationError::BlankAnswer.into());
    }
    let upserted =
      upsert::upsert_answer(self.store.as_ref(), student, instruction, question, answer_text)
        .await?;
    self.bump();
    Ok(upserted)
  }

  /// Record a teacher's grade for one answer text.
  ///
  /// `score` must be within `0..=MAX_SCORE` and `comments` must not be blank;
  /// comments are stored trimmed. A blank `answer_text` means there is
  /// nothing to grade.
  #[allow(clippy::too_many_arguments)]
  pub async fn submit_grade(
    &self,
    student:     &str,
    teacher:     &str,
    instruction: &str,
    question:    &str,
    answer_text: &str,
    score:       u8,
    comments:    &str,
  ) -> Result<TeacherGrade> {
    if answer_text.is_empty() {
      return Err(ValidationError::NothingToGrade.into());
    }
    if score > MAX_SCORE {
      return Err(ValidationError::ScoreOutOfRange(score).into());
    }
    let comments = comments.trim();
    if comments.is_empty() {
      return Err(ValidationError::BlankComment.into());
    }

    let grade = upsert::upsert_grade(
      self.store.as_ref(),
      student,
      teacher,
      instruction,
      question,
      answer_text,
      score,
      comments,
    )
    .await?;
    self.bump();
    Ok(grade)
  }

  // ── Join ──────────────────────────────────────────────────────────────────

  /// See [`join::join`].
  pub fn join<'a>(
    &self,
    questions: &'a [Question],
    answers:   &'a [Answer],
    grades:    &'a [TeacherGrade],
  ) -> Vec<JoinedItem<'a>> {
    join::join(questions, answers, grades)
  }
}
