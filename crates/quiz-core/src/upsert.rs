//! Natural-key upsert engine.
//!
//! Each operation looks up the record holding the identity key, patches it if
//! found and inserts otherwise. Callers never see two live records per key:
//! when a backend rejects an insert because a concurrent writer won the race
//! (see [`StoreError::is_conflict`]), the winner is re-read and patched
//! instead.
//!
//! These functions do no input validation; see [`crate::workflow::Quiz`] for
//! the caller-facing entry points.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  key::{AnswerKey, GradeKey, ItemKey, user_filter},
  record::{
    Answer, AnswerPatch, GradePatch, NewAnswer, NewGrade, NewUser, Record, TeacherGrade, User,
  },
  store::{Filter, RecordStore, StoreError as _},
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertStatus {
  Created,
  Updated,
}

/// Result of [`upsert_answer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upserted {
  pub status: UpsertStatus,
  pub id:     Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
  Exists,
  Created,
}

/// Result of [`register_user`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
  pub status: RegistrationStatus,
  pub user:   User,
}

// ─── Generic insert-or-patch ─────────────────────────────────────────────────

/// Patch the record matching `filter`, or insert `draft` if there is none.
///
/// For [`UpsertStatus::Updated`] the returned record is the stored one as it
/// was *before* the patch.
async fn upsert_by_key<S, R>(
  store:  &S,
  filter: &Filter,
  draft:  R::Draft,
  patch:  R::Patch,
) -> Result<(UpsertStatus, R)>
where
  S: RecordStore,
  R: Record,
{
  if let Some(existing) = store.find_one::<R>(filter).await.map_err(Error::store)? {
    store
      .patch::<R>(existing.id(), patch)
      .await
      .map_err(Error::store)?;
    tracing::debug!(collection = %R::COLLECTION, id = %existing.id(), "patched existing record");
    return Ok((UpsertStatus::Updated, existing));
  }

  match store.insert::<R>(draft).await {
    Ok(created) => {
      tracing::debug!(collection = %R::COLLECTION, id = %created.id(), "inserted new record");
      Ok((UpsertStatus::Created, created))
    }
    Err(e) if e.is_conflict() => {
      tracing::warn!(collection = %R::COLLECTION, "insert lost a race on its identity key; patching the winner");
      let winner = store
        .find_one::<R>(filter)
        .await
        .map_err(Error::store)?
        .ok_or_else(|| Error::store(e))?;
      store
        .patch::<R>(winner.id(), patch)
        .await
        .map_err(Error::store)?;
      Ok((UpsertStatus::Updated, winner))
    }
    Err(e) => Err(Error::store(e)),
  }
}

// ─── Answers ─────────────────────────────────────────────────────────────────

/// Create or overwrite the answer `student_name` gave for the
/// `(instruction, question)` item.
///
/// On update only the answer text changes; the id and key fields are kept.
pub async fn upsert_answer<S: RecordStore>(
  store:        &S,
  student_name: &str,
  instruction:  &str,
  question:     &str,
  answer_text:  &str,
) -> Result<Upserted> {
  let key = AnswerKey::new(student_name, ItemKey::new(instruction, question));
  let draft = NewAnswer {
    student_name: student_name.to_owned(),
    instruction:  instruction.to_owned(),
    question:     question.to_owned(),
    answer:       answer_text.to_owned(),
  };
  let patch = AnswerPatch { answer: answer_text.to_owned() };

  let (status, record) = upsert_by_key::<S, Answer>(store, &key.filter(), draft, patch).await?;
  Ok(Upserted { status, id: record.id })
}

// ─── Grades ──────────────────────────────────────────────────────────────────

/// Create or overwrite the grade `teacher` gave `student` for one specific
/// answer text. Returns the grade as now stored.
///
/// The answer text is part of the key: grading a changed answer creates a new
/// record and leaves the earlier grade orphaned. `score` is written as given;
/// range checks belong to the caller.
#[allow(clippy::too_many_arguments)]
pub async fn upsert_grade<S: RecordStore>(
  store:       &S,
  student:     &str,
  teacher:     &str,
  instruction: &str,
  question:    &str,
  answer_text: &str,
  score:       u8,
  comments:    &str,
) -> Result<TeacherGrade> {
  let key = GradeKey::new(
    teacher,
    student,
    ItemKey::new(instruction, question).with_answer(answer_text),
  );
  let draft = NewGrade {
    student:     student.to_owned(),
    teacher:     teacher.to_owned(),
    instruction: instruction.to_owned(),
    question:    question.to_owned(),
    answer:      answer_text.to_owned(),
    score,
    comments:    comments.to_owned(),
  };
  let patch = GradePatch { score, comments: comments.to_owned() };

  let (status, record) =
    upsert_by_key::<S, TeacherGrade>(store, &key.filter(), draft, patch).await?;

  Ok(match status {
    UpsertStatus::Created => record,
    UpsertStatus::Updated => TeacherGrade { score, comments: comments.to_owned(), ..record },
  })
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// Return the user called `name`, creating it on first appearance.
pub async fn register_user<S: RecordStore>(store: &S, name: &str) -> Result<Registration> {
  let filter = user_filter(name);

  if let Some(user) = store.find_one::<User>(&filter).await.map_err(Error::store)? {
    return Ok(Registration { status: RegistrationStatus::Exists, user });
  }

  match store.insert::<User>(NewUser { name: name.to_owned() }).await {
    Ok(user) => {
      tracing::debug!(id = %user.id, name, "registered user");
      Ok(Registration { status: RegistrationStatus::Created, user })
    }
    Err(e) if e.is_conflict() => {
      let user = store
        .find_one::<User>(&filter)
        .await
        .map_err(Error::store)?
        .ok_or_else(|| Error::store(e))?;
      Ok(Registration { status: RegistrationStatus::Exists, user })
    }
    Err(e) => Err(Error::store(e)),
  }
}
