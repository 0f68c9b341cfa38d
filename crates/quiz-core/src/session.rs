//! Per-item submission state machines and the sessions that group them.
//!
//! A student item moves `Unanswered -> Submitted` and back via
//! [`StudentItem::edit`]; a grading item moves `Ungraded -> Graded` and back
//! via [`GradeItem::edit`]. Transitions that write take `&mut self` across the
//! await, so one item never has two writes in flight. A failed write leaves
//! the item where it was.
//!
//! Sessions are rebuilt from a fresh join and carry a session key. Restarting
//! bumps the key and returns every item to its initial state; persisted
//! records are untouched.

use serde::Serialize;

use crate::{
  Result, ValidationError,
  join::JoinedItem,
  record::{Answer, Question, TeacherGrade},
  store::RecordStore,
  upsert::Upserted,
  workflow::{MAX_SCORE, Quiz},
};

// ─── Auto-grading ────────────────────────────────────────────────────────────

/// What a submitted student item shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentOutcome {
  /// Matched the question's reference answer.
  Correct,
  /// Did not match the question's reference answer.
  Incorrect,
  /// No reference answer; the answer was stored for a teacher to grade.
  Recorded,
}

/// Compare a submission with a reference answer, ignoring case and
/// surrounding whitespace.
pub fn auto_grade(reference: &str, submitted: &str) -> StudentOutcome {
  if reference.trim().to_lowercase() == submitted.trim().to_lowercase() {
    StudentOutcome::Correct
  } else {
    StudentOutcome::Incorrect
  }
}

// ─── Student item ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "outcome", rename_all = "snake_case")]
pub enum StudentState {
  Unanswered,
  Submitted(StudentOutcome),
}

/// One question as a student interacts with it.
#[derive(Debug, Clone)]
pub struct StudentItem {
  question: Question,
  draft:    String,
  state:    StudentState,
}

impl StudentItem {
  /// A fresh item. `previous` pre-fills the input with the student's stored
  /// answer, if any.
  pub fn new(question: Question, previous: Option<&Answer>) -> Self {
    Self {
      question,
      draft: previous.map(|a| a.answer.clone()).unwrap_or_default(),
      state: StudentState::Unanswered,
    }
  }

  pub fn question(&self) -> &Question { &self.question }

  pub fn draft(&self) -> &str { &self.draft }

  pub fn state(&self) -> StudentState { self.state }

  /// Whether the answer input accepts text.
  pub fn is_editable(&self) -> bool { self.state == StudentState::Unanswered }

  pub fn can_submit(&self) -> bool { self.is_editable() && !self.draft.trim().is_empty() }

  pub fn set_draft(&mut self, text: impl Into<String>) -> Result<(), ValidationError> {
    if !self.is_editable() {
      return Err(ValidationError::NotEditable);
    }
    self.draft = text.into();
    Ok(())
  }

  /// Submit the current draft.
  ///
  /// Auto-graded questions resolve locally with no store write. Others are
  /// upserted once and resolve to [`StudentOutcome::Recorded`].
  pub async fn submit<S: RecordStore>(
    &mut self,
    quiz:    &Quiz<S>,
    student: &str,
  ) -> Result<StudentOutcome> {
    if !self.is_editable() {
      return Err(ValidationError::NotEditable.into());
    }
    if self.draft.trim().is_empty() {
      return Err(ValidationError::BlankAnswer.into());
    }

    let outcome = match &self.question.answer {
      Some(reference) => auto_grade(reference, &self.draft),
      None => {
        let Upserted { status, id } = quiz
          .submit_answer(
            student,
            self.question.instruction.as_deref().unwrap_or(""),
            &self.question.question,
            &self.draft,
          )
          .await?;
        tracing::debug!(%id, ?status, student, "answer recorded");
        StudentOutcome::Recorded
      }
    };

    self.state = StudentState::Submitted(outcome);
    Ok(outcome)
  }

  /// Re-open a submitted item. The stored answer stays until the next
  /// submission overwrites it.
  pub fn edit(&mut self) -> Result<(), ValidationError> {
    match self.state {
      StudentState::Submitted(_) => {
        self.state = StudentState::Unanswered;
        Ok(())
      }
      StudentState::Unanswered => Err(ValidationError::NotEditable),
    }
  }
}

// ─── Grading item ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeState {
  Ungraded,
  Graded,
}

/// One question as a teacher grades it.
#[derive(Debug, Clone)]
pub struct GradeItem {
  question: Question,
  answer:   Option<Answer>,
  score:    Option<u8>,
  comments: String,
  state:    GradeState,
}

impl GradeItem {
  /// A fresh item for `question`. The score and comment inputs are pre-filled
  /// from `existing`, the grade currently matched to `answer`, if any.
  pub fn new(question: Question, answer: Option<Answer>, existing: Option<&TeacherGrade>) -> Self {
    Self {
      question,
      answer,
      score: existing.map(|g| g.score),
      comments: existing.map(|g| g.comments.clone()).unwrap_or_default(),
      state: GradeState::Ungraded,
    }
  }

  pub fn question(&self) -> &Question { &self.question }

  pub fn answer(&self) -> Option<&Answer> { self.answer.as_ref() }

  pub fn score(&self) -> Option<u8> { self.score }

  pub fn comments(&self) -> &str { &self.comments }

  pub fn state(&self) -> GradeState { self.state }

  /// Whether there is an answer to grade at all.
  pub fn is_gradable(&self) -> bool { self.answer.is_some() }

  /// Whether the score and comment inputs accept changes.
  pub fn controls_enabled(&self) -> bool {
    self.is_gradable() && self.state == GradeState::Ungraded
  }

  pub fn can_submit(&self) -> bool {
    self.controls_enabled() && self.score.is_some() && !self.comments.trim().is_empty()
  }

  fn check_controls(&self) -> Result<(), ValidationError> {
    if !self.is_gradable() {
      return Err(ValidationError::NothingToGrade);
    }
    if self.state != GradeState::Ungraded {
      return Err(ValidationError::NotEditable);
    }
    Ok(())
  }

  pub fn select_score(&mut self, score: u8) -> Result<(), ValidationError> {
    self.check_controls()?;
    if score > MAX_SCORE {
      return Err(ValidationError::ScoreOutOfRange(score));
    }
    self.score = Some(score);
    Ok(())
  }

  pub fn set_comments(&mut self, text: impl Into<String>) -> Result<(), ValidationError> {
    self.check_controls()?;
    self.comments = text.into();
    Ok(())
  }

  /// Submit the selected score and comments for the matched answer text.
  pub async fn submit<S: RecordStore>(
    &mut self,
    quiz:    &Quiz<S>,
    teacher: &str,
    student: &str,
  ) -> Result<TeacherGrade> {
    self.check_controls()?;
    let Some(answer) = &self.answer else {
      return Err(ValidationError::NothingToGrade.into());
    };
    let Some(score) = self.score else {
      return Err(ValidationError::MissingScore.into());
    };
    if self.comments.trim().is_empty() {
      return Err(ValidationError::BlankComment.into());
    }

    let grade = quiz
      .submit_grade(
        student,
        teacher,
        self.question.instruction.as_deref().unwrap_or(""),
        &self.question.question,
        &answer.answer,
        score,
        &self.comments,
      )
      .await?;

    self.state = GradeState::Graded;
    Ok(grade)
  }

  /// Re-open a graded item. The stored grade stays until the next
  /// submission overwrites it.
  pub fn edit(&mut self) -> Result<(), ValidationError> {
    match self.state {
      GradeState::Graded => {
        self.state = GradeState::Ungraded;
        Ok(())
      }
      GradeState::Ungraded => Err(ValidationError::NotEditable),
    }
  }
}

// ─── Student session ─────────────────────────────────────────────────────────

/// Counts of student items by state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StudentTally {
  pub correct:    usize,
  pub incorrect:  usize,
  pub recorded:   usize,
  pub unanswered: usize,
}

#[derive(Debug, Clone)]
pub struct StudentSession {
  student: String,
  key:     u64,
  items:   Vec<StudentItem>,
}

impl StudentSession {
  pub fn new(student: impl Into<String>, joined: &[JoinedItem<'_>]) -> Self {
    Self { student: student.into(), key: 0, items: Self::build(joined) }
  }

  fn build(joined: &[JoinedItem<'_>]) -> Vec<StudentItem> {
    joined
      .iter()
      .map(|j| StudentItem::new(j.question.clone(), j.answer))
      .collect()
  }

  pub fn student(&self) -> &str { &self.student }

  pub fn key(&self) -> u64 { self.key }

  pub fn items(&self) -> &[StudentItem] { &self.items }

  pub fn item_mut(&mut self, index: usize) -> Option<&mut StudentItem> {
    self.items.get_mut(index)
  }

  /// Submit the item at `index` on behalf of this session's student.
  pub async fn submit<S: RecordStore>(
    &mut self,
    index: usize,
    quiz:  &Quiz<S>,
  ) -> Option<Result<StudentOutcome>> {
    let item = self.items.get_mut(index)?;
    Some(item.submit(quiz, &self.student).await)
  }

  /// Reset every item from a freshly computed join and bump the session key.
  pub fn restart(&mut self, joined: &[JoinedItem<'_>]) {
    self.key += 1;
    self.items = Self::build(joined);
  }

  pub fn tally(&self) -> StudentTally {
    let mut tally = StudentTally::default();
    for item in &self.items {
      match item.state {
        StudentState::Unanswered => tally.unanswered += 1,
        StudentState::Submitted(StudentOutcome::Correct) => tally.correct += 1,
        StudentState::Submitted(StudentOutcome::Incorrect) => tally.incorrect += 1,
        StudentState::Submitted(StudentOutcome::Recorded) => tally.recorded += 1,
      }
    }
    tally
  }
}

// ─── Review session ──────────────────────────────────────────────────────────

/// The teacher and student a review session is about. Both must be named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationTarget {
  teacher: String,
  student: String,
}

impl EvaluationTarget {
  pub fn new(teacher: impl Into<String>, student: impl Into<String>) -> Result<Self, ValidationError> {
    let (teacher, student) = (teacher.into(), student.into());
    if teacher.trim().is_empty() || student.trim().is_empty() {
      return Err(ValidationError::BlankName);
    }
    Ok(Self { teacher, student })
  }

  pub fn teacher(&self) -> &str { &self.teacher }

  pub fn student(&self) -> &str { &self.student }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewProgress {
  pub graded:   usize,
  /// Items with an answer to grade.
  pub gradable: usize,
  pub total:    usize,
}

#[derive(Debug, Clone)]
pub struct ReviewSession {
  target: EvaluationTarget,
  key:    u64,
  items:  Vec<GradeItem>,
}

impl ReviewSession {
  pub fn new(target: EvaluationTarget, joined: &[JoinedItem<'_>]) -> Self {
    Self { target, key: 0, items: Self::build(joined) }
  }

  fn build(joined: &[JoinedItem<'_>]) -> Vec<GradeItem> {
    joined
      .iter()
      .map(|j| GradeItem::new(j.question.clone(), j.answer.cloned(), j.grade))
      .collect()
  }

  pub fn target(&self) -> &EvaluationTarget { &self.target }

  pub fn key(&self) -> u64 { self.key }

  pub fn items(&self) -> &[GradeItem] { &self.items }

  pub fn item_mut(&mut self, index: usize) -> Option<&mut GradeItem> {
    self.items.get_mut(index)
  }

  /// Submit the item at `index` as this session's teacher.
  pub async fn submit<S: RecordStore>(
    &mut self,
    index: usize,
    quiz:  &Quiz<S>,
  ) -> Option<Result<TeacherGrade>> {
    let item = self.items.get_mut(index)?;
    Some(item.submit(quiz, &self.target.teacher, &self.target.student).await)
  }

  /// Reset every item from a freshly computed join and bump the session key.
  pub fn restart(&mut self, joined: &[JoinedItem<'_>]) {
    self.key += 1;
    self.items = Self::build(joined);
  }

  pub fn progress(&self) -> ReviewProgress {
    ReviewProgress {
      graded:   self.items.iter().filter(|i| i.state == GradeState::Graded).count(),
      gradable: self.items.iter().filter(|i| i.is_gradable()).count(),
      total:    self.items.len(),
    }
  }
}
