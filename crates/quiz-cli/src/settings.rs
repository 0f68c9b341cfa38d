use std::path::PathBuf;

use serde::Deserialize;

/// Settings read from `config.toml` and `QUIZ_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// SQLite file holding every collection. A leading `~/` is expanded.
  pub store_path: PathBuf,
  /// Teachers who may grade.
  pub teachers:   Vec<String>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("~/.local/share/quiz/quiz.sqlite"),
      teachers:   ["Poi", "Nae", "AI"].map(String::from).to_vec(),
    }
  }
}

impl AppConfig {
  pub fn is_teacher(&self, name: &str) -> bool { self.teachers.iter().any(|t| t == name) }
}
