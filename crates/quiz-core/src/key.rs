//! Identity keys.
//!
//! Records never reference each other by id. Two records describe the same
//! logical entity when their key fields are equal, so every comparison the
//! upsert engine and the joiner make is derived here.

use crate::{
  record::{Answer, Question, TeacherGrade, field},
  store::Filter,
};

/// Names one question item: its `(instruction, question)` text.
///
/// A question without an instruction compares as the empty string, so absent
/// and empty instructions are the same item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemKey<'a> {
  pub instruction: &'a str,
  pub question:    &'a str,
}

impl<'a> ItemKey<'a> {
  pub fn new(instruction: &'a str, question: &'a str) -> Self {
    Self { instruction, question }
  }

  pub fn of_question(q: &'a Question) -> Self {
    Self::new(q.instruction.as_deref().unwrap_or(""), &q.question)
  }

  pub fn of_answer(a: &'a Answer) -> Self { Self::new(&a.instruction, &a.question) }

  pub fn of_grade(g: &'a TeacherGrade) -> Self { Self::new(&g.instruction, &g.question) }

  /// This item paired with a specific answer text.
  pub fn with_answer(self, answer: &'a str) -> GradedItem<'a> {
    GradedItem { item: self, answer }
  }
}

/// A question item together with the answer text a grade applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GradedItem<'a> {
  pub item:   ItemKey<'a>,
  pub answer: &'a str,
}

impl<'a> GradedItem<'a> {
  pub fn of_grade(g: &'a TeacherGrade) -> Self {
    ItemKey::of_grade(g).with_answer(&g.answer)
  }
}

/// Identity of an [`Answer`]: `(student_name, instruction, question)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnswerKey<'a> {
  pub student_name: &'a str,
  pub item:         ItemKey<'a>,
}

impl<'a> AnswerKey<'a> {
  pub fn new(student_name: &'a str, item: ItemKey<'a>) -> Self {
    Self { student_name, item }
  }

  pub fn of(a: &'a Answer) -> Self { Self::new(&a.student_name, ItemKey::of_answer(a)) }

  pub fn matches(&self, a: &Answer) -> bool { AnswerKey::of(a) == *self }

  pub fn filter(&self) -> Filter {
    Filter::all()
      .eq(field::STUDENT_NAME, self.student_name)
      .eq(field::INSTRUCTION, self.item.instruction)
      .eq(field::QUESTION, self.item.question)
  }
}

/// Identity of a [`TeacherGrade`]:
/// `(teacher, student, instruction, question, answer)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GradeKey<'a> {
  pub teacher: &'a str,
  pub student: &'a str,
  pub graded:  GradedItem<'a>,
}

impl<'a> GradeKey<'a> {
  pub fn new(teacher: &'a str, student: &'a str, graded: GradedItem<'a>) -> Self {
    Self { teacher, student, graded }
  }

  pub fn of(g: &'a TeacherGrade) -> Self {
    Self::new(&g.teacher, &g.student, GradedItem::of_grade(g))
  }

  pub fn matches(&self, g: &TeacherGrade) -> bool { GradeKey::of(g) == *self }

  pub fn filter(&self) -> Filter {
    Filter::all()
      .eq(field::TEACHER, self.teacher)
      .eq(field::STUDENT, self.student)
      .eq(field::INSTRUCTION, self.graded.item.instruction)
      .eq(field::QUESTION, self.graded.item.question)
      .eq(field::ANSWER, self.graded.answer)
  }
}

/// Filter selecting a user by name.
pub fn user_filter(name: &str) -> Filter { Filter::all().eq(field::NAME, name) }

/// Filter selecting every answer written by `student_name`.
pub fn answers_filter(student_name: &str) -> Filter {
  Filter::all().eq(field::STUDENT_NAME, student_name)
}

/// Filter selecting every grade `teacher` gave `student`.
pub fn grades_filter(teacher: &str, student: &str) -> Filter {
  Filter::all()
    .eq(field::TEACHER, teacher)
    .eq(field::STUDENT, student)
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;
  use crate::record::FieldValue;

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

  #[test]
  fn absent_and_empty_instruction_are_the_same_item() {
    let absent = question(None, "X?");
    let empty = question(Some(""), "X?");
    assert_eq!(ItemKey::of_question(&absent), ItemKey::of_question(&empty));
  }

  #[test]
  fn item_key_is_case_and_whitespace_sensitive() {
    let q = question(Some("Define"), "X?");
    let a = answer("Ann", "define", "X?", "Y");
    let b = answer("Ann", "Define", "X? ", "Y");
    assert_ne!(ItemKey::of_question(&q), ItemKey::of_answer(&a));
    assert_ne!(ItemKey::of_question(&q), ItemKey::of_answer(&b));
  }

  #[test]
  fn answer_key_filter_matches_what_it_compares() {
    let a = answer("Ann", "Define", "X?", "Y");
    let key = AnswerKey::of(&a);
    assert!(key.matches(&a));
    assert!(!key.matches(&answer("Bob", "Define", "X?", "Y")));
    // The answer body is not part of the key.
    assert!(key.matches(&answer("Ann", "Define", "X?", "Z")));

    let fields: Vec<_> = key.filter().clauses().iter().map(|(f, _)| *f).collect();
    assert_eq!(fields, [field::STUDENT_NAME, field::INSTRUCTION, field::QUESTION]);
  }

  #[test]
  fn grade_key_includes_answer_text() {
    let g = TeacherGrade {
      id:          Uuid::new_v4(),
      student:     "Ann".into(),
      teacher:     "Poi".into(),
      instruction: "Define".into(),
      question:    "X?".into(),
      answer:      "Y".into(),
      score:       2,
      comments:    "good".into(),
    };
    let key = GradeKey::of(&g);
    assert!(key.matches(&g));

    let mut changed = g.clone();
    changed.answer = "Z".into();
    assert!(!key.matches(&changed));

    assert!(
      key
        .filter()
        .clauses()
        .contains(&(field::ANSWER, FieldValue::Text("Y".into())))
    );
  }
}
