//! `quiz`: command-line driver for the quiz workflow.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store and runs one command against it. Results are printed as JSON.
//!
//! # Usage
//!
//! ```
//! quiz import-questions bank.toml
//! quiz register Ann
//! quiz answer Ann 1 "Paris"
//! quiz grade Poi Ann 2 3 "Clear and complete"
//! quiz review Poi Ann
//! ```

mod settings;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail, ensure};
use clap::{Parser, Subcommand};
use quiz_core::{
  Quiz,
  record::{NewQuestion, Question},
  session::{EvaluationTarget, ReviewSession, StudentSession},
  store::RecordStore,
};
use quiz_store_sqlite::SqliteStore;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::AppConfig;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Quiz answers and grading")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// List registered users.
  Users,
  /// Register a user, or report that they already exist.
  Register { name: String },
  /// Load questions from a TOML question bank.
  ImportQuestions { file: PathBuf },
  /// Submit a student's answer to question NUMBER (1-based).
  Answer { student: String, number: usize, text: String },
  /// Grade a student's answer to question NUMBER (1-based) with a 0-3 score.
  Grade {
    teacher:  String,
    student:  String,
    number:   usize,
    score:    u8,
    comments: String,
  },
  /// Show every question with the student's answer and the teacher's grade.
  Review { teacher: String, student: String },
}

/// Shape of a question bank file.
#[derive(Deserialize)]
struct QuestionBank {
  #[serde(default)]
  questions: Vec<NewQuestion>,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("QUIZ"))
    .build()
    .context("failed to read config file")?;
  let cfg: AppConfig = settings
    .try_deserialize()
    .context("failed to deserialise AppConfig")?;

  let store_path = expand_tilde(&cfg.store_path);
  if let Some(parent) = store_path.parent() {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let quiz = Quiz::new(store);

  match cli.command {
    Command::Users => print(&quiz.users().await?),
    Command::Register { name } => print(&quiz.register_user(&name).await?),
    Command::ImportQuestions { file } => import_questions(&quiz, &file).await,
    Command::Answer { student, number, text } => answer(&quiz, &student, number, text).await,
    Command::Grade { teacher, student, number, score, comments } => {
      ensure!(cfg.is_teacher(&teacher), "{teacher} is not on the teacher roster");
      grade(&quiz, &teacher, &student, number, score, comments).await
    }
    Command::Review { teacher, student } => {
      ensure!(cfg.is_teacher(&teacher), "{teacher} is not on the teacher roster");
      review(&quiz, &teacher, &student).await
    }
  }
}

// ─── Commands ────────────────────────────────────────────────────────────────

async fn import_questions(quiz: &Quiz<SqliteStore>, file: &Path) -> anyhow::Result<()> {
  let raw = std::fs::read_to_string(file)
    .with_context(|| format!("reading question bank {}", file.display()))?;
  let bank: QuestionBank = toml::from_str(&raw).context("parsing question bank")?;

  let mut imported = Vec::with_capacity(bank.questions.len());
  for draft in bank.questions {
    if draft.question.trim().is_empty() {
      bail!("question bank entry {} has no question text", imported.len() + 1);
    }
    imported.push(quiz.store().insert::<Question>(draft).await?);
  }
  tracing::info!(count = imported.len(), "imported questions");
  print(&imported)
}

async fn answer(
  quiz:    &Quiz<SqliteStore>,
  student: &str,
  number:  usize,
  text:    String,
) -> anyhow::Result<()> {
  let questions = quiz.questions().await?;
  let answers = quiz.answers_for(student).await?;
  let joined = quiz.join(&questions.records, &answers.records, &[]);
  let mut session = StudentSession::new(student, &joined);

  let index = item_index(number, session.items().len())?;
  if let Some(item) = session.item_mut(index) {
    item.set_draft(text)?;
  }
  let outcome = session
    .submit(index, quiz)
    .await
    .context("no such question")??;

  #[derive(Serialize)]
  struct Report<'a> {
    question: &'a Question,
    outcome:  quiz_core::session::StudentOutcome,
  }
  print(&Report { question: session.items()[index].question(), outcome })
}

async fn grade(
  quiz:     &Quiz<SqliteStore>,
  teacher:  &str,
  student:  &str,
  number:   usize,
  score:    u8,
  comments: String,
) -> anyhow::Result<()> {
  let mut session = review_session(quiz, EvaluationTarget::new(teacher, student)?).await?;

  let index = item_index(number, session.items().len())?;
  if let Some(item) = session.item_mut(index) {
    item.select_score(score)?;
    item.set_comments(comments)?;
  }
  let grade = session
    .submit(index, quiz)
    .await
    .context("no such question")??;
  print(&grade)
}

async fn review(quiz: &Quiz<SqliteStore>, teacher: &str, student: &str) -> anyhow::Result<()> {
  let target = EvaluationTarget::new(teacher, student)?;
  let questions = quiz.questions().await?;
  let answers = quiz.answers_for(target.student()).await?;
  let grades = quiz.grades_for(target.teacher(), target.student()).await?;
  let joined = quiz.join(&questions.records, &answers.records, &grades.records);
  let session = ReviewSession::new(target, &joined);

  #[derive(Serialize)]
  struct Report<'a> {
    progress: quiz_core::session::ReviewProgress,
    items:    &'a [quiz_core::join::JoinedItem<'a>],
  }
  print(&Report { progress: session.progress(), items: &joined })
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn review_session(
  quiz:   &Quiz<SqliteStore>,
  target: EvaluationTarget,
) -> anyhow::Result<ReviewSession> {
  let questions = quiz.questions().await?;
  let answers = quiz.answers_for(target.student()).await?;
  let grades = quiz.grades_for(target.teacher(), target.student()).await?;
  let joined = quiz.join(&questions.records, &answers.records, &grades.records);
  Ok(ReviewSession::new(target, &joined))
}

/// Convert a 1-based question number to an index.
fn item_index(number: usize, len: usize) -> anyhow::Result<usize> {
  match number.checked_sub(1) {
    Some(i) if i < len => Ok(i),
    _ => bail!("question {number} does not exist (the quiz has {len})"),
  }
}

fn print<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
