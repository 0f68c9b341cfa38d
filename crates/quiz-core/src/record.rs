//! Record types held by the store, and the field-level plumbing that lets a
//! generic [`RecordStore`](crate::store::RecordStore) persist them.
//!
//! Records are addressed by a surrogate `id` for patching only. Their identity
//! as far as the workflow is concerned is the natural key derived in
//! [`crate::key`].

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Collections ─────────────────────────────────────────────────────────────

/// The named collections the workflow reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
  Users,
  Questions,
  Answers,
  Grades,
}

impl Collection {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Users => "users",
      Self::Questions => "questions",
      Self::Answers => "answers",
      Self::Grades => "grades",
    }
  }
}

impl fmt::Display for Collection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Field names ─────────────────────────────────────────────────────────────

/// Stored field names. Backends use these verbatim as column names.
pub mod field {
  pub const NAME: &str = "name";
  pub const INSTRUCTION: &str = "instruction";
  pub const QUESTION: &str = "question";
  pub const RUBRIC: &str = "rubric";
  pub const KIND: &str = "type";
  pub const ANSWER: &str = "answer";
  pub const STUDENT_NAME: &str = "student_name";
  pub const STUDENT: &str = "student";
  pub const TEACHER: &str = "teacher";
  pub const SCORE: &str = "score";
  pub const COMMENTS: &str = "comments";
}

// ─── Field values ────────────────────────────────────────────────────────────

/// A scalar stored in a single record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
  Null,
  Text(String),
  Integer(i64),
}

impl From<String> for FieldValue {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl From<&str> for FieldValue {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<i64> for FieldValue {
  fn from(n: i64) -> Self { Self::Integer(n) }
}

impl From<u8> for FieldValue {
  fn from(n: u8) -> Self { Self::Integer(i64::from(n)) }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Null, Into::into) }
}

/// Named field values in storage order.
pub type Fields = Vec<(&'static str, FieldValue)>;

/// Conversion of a draft or patch into the field values it writes.
pub trait IntoFields {
  fn into_fields(self) -> Fields;
}

/// Patch type for records the workflow never mutates. Uninhabited, so
/// [`RecordStore::patch`](crate::store::RecordStore::patch) cannot be called
/// for them.
#[derive(Debug, Clone, Copy)]
pub enum Immutable {}

impl IntoFields for Immutable {
  fn into_fields(self) -> Fields { match self {} }
}

/// Raw field values read back from the store for one record, consumed by
/// [`Record::from_fields`].
#[derive(Debug)]
pub struct FieldMap {
  collection: Collection,
  id:         Uuid,
  values:     Fields,
}

impl FieldMap {
  pub fn new(collection: Collection, id: Uuid, values: Fields) -> Self {
    Self { collection, id, values }
  }

  pub fn id(&self) -> Uuid { self.id }

  fn take(&mut self, field: &'static str) -> FieldValue {
    match self.values.iter().position(|(name, _)| *name == field) {
      Some(i) => self.values.swap_remove(i).1,
      None => FieldValue::Null,
    }
  }

  fn missing(&self, field: &'static str) -> Error {
    Error::MissingField { collection: self.collection.as_str(), id: self.id, field }
  }

  fn wrong_type(&self, field: &'static str) -> Error {
    Error::FieldType { collection: self.collection.as_str(), id: self.id, field }
  }

  pub fn text(&mut self, field: &'static str) -> Result<String> {
    self
      .optional_text(field)?
      .ok_or_else(|| self.missing(field))
  }

  pub fn optional_text(&mut self, field: &'static str) -> Result<Option<String>> {
    match self.take(field) {
      FieldValue::Null => Ok(None),
      FieldValue::Text(s) => Ok(Some(s)),
      FieldValue::Integer(_) => Err(self.wrong_type(field)),
    }
  }

  pub fn integer(&mut self, field: &'static str) -> Result<i64> {
    match self.take(field) {
      FieldValue::Null => Err(self.missing(field)),
      FieldValue::Integer(n) => Ok(n),
      FieldValue::Text(_) => Err(self.wrong_type(field)),
    }
  }
}

// ─── Record trait ────────────────────────────────────────────────────────────

/// A record type stored in one [`Collection`].
pub trait Record: Sized + Send + Sync + 'static {
  const COLLECTION: Collection;

  /// Every stored field except `id`, in storage order.
  const FIELDS: &'static [&'static str];

  /// Input to [`RecordStore::insert`](crate::store::RecordStore::insert); the
  /// store assigns the id.
  type Draft: IntoFields + Send + 'static;

  /// Input to [`RecordStore::patch`](crate::store::RecordStore::patch).
  type Patch: IntoFields + Send + 'static;

  fn id(&self) -> Uuid;

  fn from_fields(fields: FieldMap) -> Result<Self>;
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A participant, identified by unique name. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:   Uuid,
  pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
  pub name: String,
}

impl IntoFields for NewUser {
  fn into_fields(self) -> Fields { vec![(field::NAME, self.name.into())] }
}

impl Record for User {
  const COLLECTION: Collection = Collection::Users;
  const FIELDS: &'static [&'static str] = &[field::NAME];

  type Draft = NewUser;
  type Patch = Immutable;

  fn id(&self) -> Uuid { self.id }

  fn from_fields(mut f: FieldMap) -> Result<Self> {
    Ok(Self { id: f.id(), name: f.text(field::NAME)? })
  }
}

// ─── Question ────────────────────────────────────────────────────────────────

/// An authored question. Read-only to the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
  pub id:          Uuid,
  pub instruction: Option<String>,
  pub question:    String,
  pub rubric:      Option<String>,
  #[serde(rename = "type")]
  pub kind:        Option<String>,
  /// Reference answer; when present the question is graded automatically.
  pub answer:      Option<String>,
}

impl Question {
  pub fn is_auto_graded(&self) -> bool { self.answer.is_some() }
}

/// Question bank entry as written by an external authoring tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewQuestion {
  #[serde(default)]
  pub instruction: Option<String>,
  pub question:    String,
  #[serde(default)]
  pub rubric:      Option<String>,
  #[serde(default, rename = "type")]
  pub kind:        Option<String>,
  #[serde(default)]
  pub answer:      Option<String>,
}

impl IntoFields for NewQuestion {
  fn into_fields(self) -> Fields {
    vec![
      (field::INSTRUCTION, self.instruction.into()),
      (field::QUESTION, self.question.into()),
      (field::RUBRIC, self.rubric.into()),
      (field::KIND, self.kind.into()),
      (field::ANSWER, self.answer.into()),
    ]
  }
}

impl Record for Question {
  const COLLECTION: Collection = Collection::Questions;
  const FIELDS: &'static [&'static str] = &[
    field::INSTRUCTION,
    field::QUESTION,
    field::RUBRIC,
    field::KIND,
    field::ANSWER,
  ];

  type Draft = NewQuestion;
  type Patch = Immutable;

  fn id(&self) -> Uuid { self.id }

  fn from_fields(mut f: FieldMap) -> Result<Self> {
    Ok(Self {
      id:          f.id(),
      instruction: f.optional_text(field::INSTRUCTION)?,
      question:    f.text(field::QUESTION)?,
      rubric:      f.optional_text(field::RUBRIC)?,
      kind:        f.optional_text(field::KIND)?,
      answer:      f.optional_text(field::ANSWER)?,
    })
  }
}

// ─── Answer ──────────────────────────────────────────────────────────────────

/// A student's submission for one question. Only `answer` is ever patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
  pub id:           Uuid,
  pub student_name: String,
  pub instruction:  String,
  pub question:     String,
  pub answer:       String,
}

#[derive(Debug, Clone)]
pub struct NewAnswer {
  pub student_name: String,
  pub instruction:  String,
  pub question:     String,
  pub answer:       String,
}

impl IntoFields for NewAnswer {
  fn into_fields(self) -> Fields {
    vec![
      (field::STUDENT_NAME, self.student_name.into()),
      (field::INSTRUCTION, self.instruction.into()),
      (field::QUESTION, self.question.into()),
      (field::ANSWER, self.answer.into()),
    ]
  }
}

/// Replacement answer text.
#[derive(Debug, Clone)]
pub struct AnswerPatch {
  pub answer: String,
}

impl IntoFields for AnswerPatch {
  fn into_fields(self) -> Fields { vec![(field::ANSWER, self.answer.into())] }
}

impl Record for Answer {
  const COLLECTION: Collection = Collection::Answers;
  const FIELDS: &'static [&'static str] = &[
    field::STUDENT_NAME,
    field::INSTRUCTION,
    field::QUESTION,
    field::ANSWER,
  ];

  type Draft = NewAnswer;
  type Patch = AnswerPatch;

  fn id(&self) -> Uuid { self.id }

  fn from_fields(mut f: FieldMap) -> Result<Self> {
    Ok(Self {
      id:           f.id(),
      student_name: f.text(field::STUDENT_NAME)?,
      instruction:  f.text(field::INSTRUCTION)?,
      question:     f.text(field::QUESTION)?,
      answer:       f.text(field::ANSWER)?,
    })
  }
}

// ─── TeacherGrade ────────────────────────────────────────────────────────────

/// A teacher's grade for one specific answer text. Only `score` and
/// `comments` are ever patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherGrade {
  pub id:          Uuid,
  pub student:     String,
  pub teacher:     String,
  pub instruction: String,
  pub question:    String,
  /// The answer text this grade was given for.
  pub answer:      String,
  pub score:       u8,
  pub comments:    String,
}

#[derive(Debug, Clone)]
pub struct NewGrade {
  pub student:     String,
  pub teacher:     String,
  pub instruction: String,
  pub question:    String,
  pub answer:      String,
  pub score:       u8,
  pub comments:    String,
}

impl IntoFields for NewGrade {
  fn into_fields(self) -> Fields {
    vec![
      (field::STUDENT, self.student.into()),
      (field::TEACHER, self.teacher.into()),
      (field::INSTRUCTION, self.instruction.into()),
      (field::QUESTION, self.question.into()),
      (field::ANSWER, self.answer.into()),
      (field::SCORE, self.score.into()),
      (field::COMMENTS, self.comments.into()),
    ]
  }
}

#[derive(Debug, Clone)]
pub struct GradePatch {
  pub score:    u8,
  pub comments: String,
}

impl IntoFields for GradePatch {
  fn into_fields(self) -> Fields {
    vec![
      (field::SCORE, self.score.into()),
      (field::COMMENTS, self.comments.into()),
    ]
  }
}

impl Record for TeacherGrade {
  const COLLECTION: Collection = Collection::Grades;
  const FIELDS: &'static [&'static str] = &[
    field::STUDENT,
    field::TEACHER,
    field::INSTRUCTION,
    field::QUESTION,
    field::ANSWER,
    field::SCORE,
    field::COMMENTS,
  ];

  type Draft = NewGrade;
  type Patch = GradePatch;

  fn id(&self) -> Uuid { self.id }

  fn from_fields(mut f: FieldMap) -> Result<Self> {
    let raw_score = f.integer(field::SCORE)?;
    let score = u8::try_from(raw_score).map_err(|_| Error::FieldType {
      collection: Collection::Grades.as_str(),
      id:         f.id(),
      field:      field::SCORE,
    })?;

    Ok(Self {
      id: f.id(),
      student: f.text(field::STUDENT)?,
      teacher: f.text(field::TEACHER)?,
      instruction: f.text(field::INSTRUCTION)?,
      question: f.text(field::QUESTION)?,
      answer: f.text(field::ANSWER)?,
      score,
      comments: f.text(field::COMMENTS)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn field_map_decodes_optional_question_fields() {
    let id = Uuid::new_v4();
    let map = FieldMap::new(Collection::Questions, id, vec![
      (field::INSTRUCTION, FieldValue::Null),
      (field::QUESTION, "Capital of France?".into()),
      (field::RUBRIC, FieldValue::Null),
      (field::KIND, "short".into()),
      (field::ANSWER, "Paris".into()),
    ]);

    let q = Question::from_fields(map).unwrap();
    assert_eq!(q.id, id);
    assert_eq!(q.instruction, None);
    assert_eq!(q.kind.as_deref(), Some("short"));
    assert!(q.is_auto_graded());
  }

  #[test]
  fn field_map_reports_missing_required_field() {
    let map = FieldMap::new(Collection::Users, Uuid::new_v4(), vec![]);
    let err = User::from_fields(map).unwrap_err();
    assert!(matches!(err, Error::MissingField { field: "name", .. }));
  }

  #[test]
  fn negative_score_is_a_type_error() {
    let map = FieldMap::new(Collection::Grades, Uuid::new_v4(), vec![
      (field::STUDENT, "Ann".into()),
      (field::TEACHER, "Poi".into()),
      (field::INSTRUCTION, "Define".into()),
      (field::QUESTION, "X?".into()),
      (field::ANSWER, "Y".into()),
      (field::SCORE, FieldValue::Integer(-1)),
      (field::COMMENTS, "ok".into()),
    ]);
    let err = TeacherGrade::from_fields(map).unwrap_err();
    assert!(matches!(err, Error::FieldType { field: "score", .. }));
  }

  #[test]
  fn question_serialises_kind_as_type() {
    let q = NewQuestion {
      question: "X?".into(),
      kind: Some("essay".into()),
      ..Default::default()
    };
    let json = serde_json::to_value(&q).unwrap();
    assert_eq!(json["type"], "essay");
  }
}
