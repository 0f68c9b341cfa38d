//! Cross-collection joiner.
//!
//! Questions, answers and grades are written independently and carry no
//! references to one another. The views each role sees are rebuilt on every
//! read by matching key fields (see [`crate::key`]). Everything here is a pure
//! function of its inputs.

use serde::Serialize;

use crate::{
  key::{GradedItem, ItemKey},
  record::{Answer, Question, TeacherGrade},
};

// ─── Matching ────────────────────────────────────────────────────────────────

/// The answer for `question`, taken from one student's answers.
///
/// If the list holds several answers for the same item the first one wins.
pub fn match_answer<'a>(question: &Question, answers: &'a [Answer]) -> Option<&'a Answer> {
  let item = ItemKey::of_question(question);
  answers.iter().find(|a| ItemKey::of_answer(a) == item)
}

/// The grade for `answer` to `question`, taken from one (teacher, student)
/// pair's grades. Grades given for a different answer text do not match.
pub fn match_grade<'a>(
  question: &Question,
  answer:   &Answer,
  grades:   &'a [TeacherGrade],
) -> Option<&'a TeacherGrade> {
  let graded = ItemKey::of_question(question).with_answer(&answer.answer);
  grades.iter().find(|g| GradedItem::of_grade(g) == graded)
}

// ─── Join ────────────────────────────────────────────────────────────────────

/// One question with whatever currently matches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JoinedItem<'a> {
  pub question: &'a Question,
  pub answer:   Option<&'a Answer>,
  pub grade:    Option<&'a TeacherGrade>,
}

/// Match every question against one student's answers and one
/// (teacher, student) pair's grades. Output order follows `questions`.
pub fn join<'a>(
  questions: &'a [Question],
  answers:   &'a [Answer],
  grades:    &'a [TeacherGrade],
) -> Vec<JoinedItem<'a>> {
  questions
    .iter()
    .map(|question| {
      let answer = match_answer(question, answers);
      let grade = answer.and_then(|a| match_grade(question, a, grades));
      JoinedItem { question, answer, grade }
    })
    .collect()
}

// ─── Snapshots ───────────────────────────────────────────────────────────────

/// Records read from one collection, tagged with the write revision current
/// when they were read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot<T> {
  pub revision: u64,
  pub records:  Vec<T>,
}

impl<T> Snapshot<T> {
  pub fn new(revision: u64, records: Vec<T>) -> Self { Self { revision, records } }
}

/// A join over three snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinedView<'a> {
  /// Revision of the oldest input snapshot.
  pub revision: u64,
  pub items:    Vec<JoinedItem<'a>>,
}

impl JoinedView<'_> {
  /// `true` once a write newer than the oldest input has happened; the inputs
  /// must be re-read and the join recomputed.
  pub fn is_stale(&self, current_revision: u64) -> bool { self.revision < current_revision }
}

pub fn join_snapshots<'a>(
  questions: &'a Snapshot<Question>,
  answers:   &'a Snapshot<Answer>,
  grades:    &'a Snapshot<TeacherGrade>,
) -> JoinedView<'a> {
  JoinedView {
    revision: questions.revision.min(answers.revision).min(grades.revision),
    items:    join(&questions.records, &answers.records, &grades.records),
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  fn question(instruction: Option<&str>, text: &str) -> Question {
    Question {
      id:          Uuid::new_v4(),
      instruction: instruction.map(str::to_owned),
      question:    text.into(),
      rubric:      None,
      kind:        None,
      answer:      None,
    }
  }

  fn answer(student: &str, instruction: &str, text: &str, body: &str) -> Answer {
    Answer {
      id:           Uuid::new_v4(),
      student_name: student.into(),
      instruction:  instruction.into(),
      question:     text.into(),
      answer:       body.into(),
    }
  }

  fn grade(instruction: &str, text: &str, body: &str, score: u8) -> TeacherGrade {
    TeacherGrade {
      id:          Uuid::new_v4(),
      student:     "Ann".into(),
      teacher:     "Poi".into(),
      instruction: instruction.into(),
      question:    text.into(),
      answer:      body.into(),
      score,
      comments:    "noted".into(),
    }
  }

  #[test]
  fn matches_answer_by_instruction_and_question() {
    let questions = [question(Some("Define"), "X?")];
    let ann = [answer("Ann", "Define", "X?", "Y")];

    let view = join(&questions, &ann, &[]);
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].answer, Some(&ann[0]));
    assert_eq!(view[0].grade, None);
  }

  #[test]
  fn other_students_answers_are_not_in_the_input() {
    let questions = [question(Some("Define"), "X?")];
    let bob = answer("Bob", "Define", "X?", "W");
    let ann: Vec<Answer> = vec![];

    let view = join(&questions, &ann, &[]);
    assert_eq!(view[0].answer, None);
    assert_ne!(view[0].answer, Some(&bob));
  }

  #[test]
  fn missing_instruction_joins_against_empty_string() {
    let questions = [question(None, "X?")];
    let answers = [answer("Ann", "", "X?", "Y")];
    assert_eq!(join(&questions, &answers, &[])[0].answer, Some(&answers[0]));
  }

  #[test]
  fn first_duplicate_answer_wins() {
    let questions = [question(Some("Define"), "X?")];
    let answers = [
      answer("Ann", "Define", "X?", "first"),
      answer("Ann", "Define", "X?", "second"),
    ];
    let view = join(&questions, &answers, &[]);
    assert_eq!(view[0].answer.map(|a| a.answer.as_str()), Some("first"));
  }

  #[test]
  fn duplicate_questions_share_one_answer() {
    let questions = [question(Some("Define"), "X?"), question(Some("Define"), "X?")];
    let answers = [answer("Ann", "Define", "X?", "Y")];
    let view = join(&questions, &answers, &[]);
    assert_eq!(view[0].answer, Some(&answers[0]));
    assert_eq!(view[1].answer, Some(&answers[0]));
  }

  #[test]
  fn grade_matches_only_the_graded_answer_text() {
    let questions = [question(Some("Define"), "X?")];
    let grades = [grade("Define", "X?", "Y", 2)];

    let graded = [answer("Ann", "Define", "X?", "Y")];
    let view = join(&questions, &graded, &grades);
    assert_eq!(view[0].grade.map(|g| g.score), Some(2));

    // The student changed their answer after grading: the grade is orphaned.
    let changed = [answer("Ann", "Define", "X?", "Z")];
    let view = join(&questions, &changed, &grades);
    assert!(view[0].answer.is_some());
    assert_eq!(view[0].grade, None);
  }

  #[test]
  fn no_grade_without_an_answer() {
    let questions = [question(Some("Define"), "X?")];
    let grades = [grade("Define", "X?", "Y", 3)];
    let view = join(&questions, &[], &grades);
    assert_eq!(view[0].grade, None);
  }

  #[test]
  fn join_is_repeatable_and_ordered_by_questions() {
    let questions = [question(Some("A"), "1?"), question(Some("B"), "2?")];
    let answers = [
      answer("Ann", "B", "2?", "two"),
      answer("Ann", "A", "1?", "one"),
    ];
    let first = join(&questions, &answers, &[]);
    let second = join(&questions, &answers, &[]);
    assert_eq!(first, second);
    assert_eq!(first[0].answer.map(|a| a.answer.as_str()), Some("one"));
    assert_eq!(first[1].answer.map(|a| a.answer.as_str()), Some("two"));
  }

  #[test]
  fn snapshot_view_tracks_oldest_revision() {
    let questions = Snapshot::new(4, vec![question(Some("Define"), "X?")]);
    let answers = Snapshot::new(2, vec![answer("Ann", "Define", "X?", "Y")]);
    let grades = Snapshot::new(3, vec![]);

    let view = join_snapshots(&questions, &answers, &grades);
    assert_eq!(view.revision, 2);
    assert!(!view.is_stale(2));
    assert!(view.is_stale(3));
  }
}
