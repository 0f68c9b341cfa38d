//! SQL schema for the quiz SQLite store.
//!
//! Executed once at connection startup. Column names match
//! [`quiz_core::record::field`] exactly; the store builds its statements from
//! those names.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS users (
    id    TEXT PRIMARY KEY,
    name  TEXT NOT NULL
);

-- Authored externally; the workflow only reads this table.
CREATE TABLE IF NOT EXISTS questions (
    id          TEXT PRIMARY KEY,
    instruction TEXT,
    question    TEXT NOT NULL,
    rubric      TEXT,
    type        TEXT,
    answer      TEXT               -- reference answer; enables auto-grading
);

CREATE TABLE IF NOT EXISTS answers (
    id           TEXT PRIMARY KEY,
    student_name TEXT NOT NULL,
    instruction  TEXT NOT NULL,
    question     TEXT NOT NULL,
    answer       TEXT NOT NULL
);

-- The graded answer text is part of the key: a changed answer needs a new
-- grade and the old one is left behind.
CREATE TABLE IF NOT EXISTS grades (
    id          TEXT PRIMARY KEY,
    student     TEXT NOT NULL,
    teacher     TEXT NOT NULL,
    instruction TEXT NOT NULL,
    question    TEXT NOT NULL,
    answer      TEXT NOT NULL,
    score       INTEGER NOT NULL CHECK (score >= 0),
    comments    TEXT NOT NULL
);

-- One live record per identity key. Racing inserts fail here and the
-- upsert engine falls back to patching the winner.
CREATE UNIQUE INDEX IF NOT EXISTS users_identity_key   ON users(name);
CREATE UNIQUE INDEX IF NOT EXISTS answers_identity_key ON answers(student_name, instruction, question);
CREATE UNIQUE INDEX IF NOT EXISTS grades_identity_key  ON grades(teacher, student, instruction, question, answer);

PRAGMA user_version = 1;
";
