use quiz_core::{
  record::{Answer, AnswerPatch, FieldValue, NewAnswer, NewUser, Question, User, field},
  store::{Filter, RecordStore, StoreError},
};
use uuid::Uuid;

use super::{new_question, seed, store};

fn new_answer(student: &str, question: &str, body: &str) -> NewAnswer {
  NewAnswer {
    student_name: student.into(),
    instruction:  "Define".into(),
    question:     question.into(),
    answer:       body.into(),
  }
}

// ─── Inserts and reads ───────────────────────────────────────────────────────

#[tokio::test]
async fn insert_assigns_id_and_reads_back() {
  let s = store().await;

  let user = s.insert::<User>(NewUser { name: "Ann".into() }).await.unwrap();
  assert_eq!(user.name, "Ann");

  let fetched = s
    .find_one::<User>(&Filter::all().eq(field::NAME, "Ann"))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(fetched, user);
}

#[tokio::test]
async fn find_returns_insertion_order() {
  let s = store().await;
  for name in ["Cleo", "Ann", "Bob"] {
    s.insert::<User>(NewUser { name: name.into() }).await.unwrap();
  }

  let names: Vec<_> = s
    .find::<User>(&Filter::all())
    .await
    .unwrap()
    .into_iter()
    .map(|u| u.name)
    .collect();
  assert_eq!(names, ["Cleo", "Ann", "Bob"]);
}

#[tokio::test]
async fn filter_is_exact_and_case_sensitive() {
  let s = store().await;
  s.insert::<Answer>(new_answer("Ann", "X?", "Y")).await.unwrap();
  s.insert::<Answer>(new_answer("ann", "X?", "Y")).await.unwrap();
  s.insert::<Answer>(new_answer("Ann ", "X?", "Y")).await.unwrap();

  let found = s
    .find::<Answer>(&Filter::all().eq(field::STUDENT_NAME, "Ann"))
    .await
    .unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].student_name, "Ann");
}

#[tokio::test]
async fn find_one_missing_returns_none() {
  let s = store().await;
  let result = s
    .find_one::<User>(&Filter::all().eq(field::NAME, "nobody"))
    .await
    .unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn null_clause_matches_absent_field() {
  let s = store().await;
  seed(&s, vec![
    new_question(None, "No instruction?", None),
    new_question(Some("Define"), "X?", Some("Y")),
  ])
  .await;

  let found = s
    .find::<Question>(&Filter::all().eq(field::INSTRUCTION, FieldValue::Null))
    .await
    .unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].question, "No instruction?");
  assert_eq!(found[0].instruction, None);
  assert_eq!(found[0].answer, None);
}

#[tokio::test]
async fn unknown_filter_field_is_rejected() {
  let s = store().await;
  let err = s
    .find::<User>(&Filter::all().eq(field::SCORE, 1u8))
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::UnknownField { collection: "users", field: "score" }));
}

// ─── Patches ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn patch_touches_only_named_fields() {
  let s = store().await;
  let original = s.insert::<Answer>(new_answer("Ann", "X?", "first")).await.unwrap();

  s.patch::<Answer>(original.id, AnswerPatch { answer: "second".into() })
    .await
    .unwrap();

  let all = s.find::<Answer>(&Filter::all()).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0], Answer { answer: "second".into(), ..original });
}

#[tokio::test]
async fn patch_missing_record_errors() {
  let s = store().await;
  let err = s
    .patch::<Answer>(Uuid::new_v4(), AnswerPatch { answer: "x".into() })
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::NotFound { collection: "answers", .. }));
}

// ─── Identity-key constraints ────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_identity_key_insert_is_a_conflict() {
  let s = store().await;
  s.insert::<Answer>(new_answer("Ann", "X?", "Y")).await.unwrap();

  let err = s
    .insert::<Answer>(new_answer("Ann", "X?", "different body"))
    .await
    .unwrap_err();
  assert!(err.is_conflict());

  // A different key is fine.
  s.insert::<Answer>(new_answer("Bob", "X?", "Y")).await.unwrap();
}

#[tokio::test]
async fn duplicate_user_name_is_a_conflict() {
  let s = store().await;
  s.insert::<User>(NewUser { name: "Ann".into() }).await.unwrap();
  let err = s.insert::<User>(NewUser { name: "Ann".into() }).await.unwrap_err();
  assert!(err.is_conflict());
}

#[tokio::test]
async fn closed_connection_is_not_a_conflict() {
  let err = crate::Error::Database(tokio_rusqlite::Error::ConnectionClosed);
  assert!(!err.is_conflict());
}

#[tokio::test]
async fn reopening_a_file_keeps_records() {
  let dir = std::env::temp_dir().join(format!("quiz-store-{}", Uuid::new_v4()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("quiz.sqlite");

  {
    let s = crate::SqliteStore::open(&path).await.unwrap();
    s.insert::<User>(NewUser { name: "Ann".into() }).await.unwrap();
  }

  let s = crate::SqliteStore::open(&path).await.unwrap();
  let users = s.find::<User>(&Filter::all()).await.unwrap();
  assert_eq!(users.len(), 1);

  std::fs::remove_dir_all(&dir).ok();
}
