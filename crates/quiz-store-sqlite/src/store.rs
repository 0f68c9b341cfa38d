//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::path::Path;

use quiz_core::{
  record::{FieldMap, IntoFields, Record},
  store::{Filter, RecordStore},
};
use rusqlite::{params_from_iter, types::Value};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{RawRecord, check_fields, encode_uuid, encode_value, quote},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A quiz record store backed by a single SQLite file.
///
/// Clones share one connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `SELECT` over `R`'s table. Rows come back in insertion order.
  async fn select<R: Record>(&self, filter: &Filter, limit: Option<usize>) -> Result<Vec<R>> {
    check_fields::<R>(filter.clauses())?;

    let columns = R::FIELDS
      .iter()
      .map(|f| quote(f))
      .collect::<Vec<_>>()
      .join(", ");
    let mut sql = format!(
      "SELECT \"id\", {columns} FROM {table}",
      table = quote(R::COLLECTION.as_str()),
    );

    // `IS` rather than `=` so a NULL clause matches absent values.
    if !filter.is_empty() {
      let conds = filter
        .clauses()
        .iter()
        .enumerate()
        .map(|(i, (field, _))| format!("{} IS ?{}", quote(field), i + 1))
        .collect::<Vec<_>>()
        .join(" AND ");
      sql.push_str(&format!(" WHERE {conds}"));
    }
    sql.push_str(" ORDER BY rowid");
    if let Some(n) = limit {
      sql.push_str(&format!(" LIMIT {n}"));
    }

    let params: Vec<Value> = filter.clauses().iter().map(|(_, v)| encode_value(v)).collect();
    let width = R::FIELDS.len();

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(params.iter()), |row| {
            let values = (1..=width)
              .map(|i| row.get::<_, Value>(i))
              .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(RawRecord { id: row.get(0)?, values })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record::<R>).collect()
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn find<'a, R: Record>(&'a self, filter: &'a Filter) -> Result<Vec<R>> {
    self.select::<R>(filter, None).await
  }

  async fn find_one<'a, R: Record>(&'a self, filter: &'a Filter) -> Result<Option<R>> {
    Ok(self.select::<R>(filter, Some(1)).await?.into_iter().next())
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn insert<R: Record>(&self, draft: R::Draft) -> Result<R> {
    let fields = draft.into_fields();
    check_fields::<R>(&fields)?;

    let id = Uuid::new_v4();
    let columns = fields
      .iter()
      .map(|(f, _)| quote(f))
      .collect::<Vec<_>>()
      .join(", ");
    let placeholders = (2..=fields.len() + 1)
      .map(|i| format!("?{i}"))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!(
      "INSERT INTO {table} (\"id\", {columns}) VALUES (?1, {placeholders})",
      table = quote(R::COLLECTION.as_str()),
    );

    let params: Vec<Value> = std::iter::once(Value::Text(encode_uuid(id)))
      .chain(fields.iter().map(|(_, v)| encode_value(v)))
      .collect();

    self
      .conn
      .call(move |conn| {
        conn.execute(&sql, params_from_iter(params.iter()))?;
        Ok(())
      })
      .await?;

    Ok(R::from_fields(FieldMap::new(R::COLLECTION, id, fields))?)
  }

  async fn patch<R: Record>(&self, id: Uuid, patch: R::Patch) -> Result<()> {
    let fields = patch.into_fields();
    check_fields::<R>(&fields)?;
    if fields.is_empty() {
      return Ok(());
    }

    let assignments = fields
      .iter()
      .enumerate()
      .map(|(i, (f, _))| format!("{} = ?{}", quote(f), i + 1))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!(
      "UPDATE {table} SET {assignments} WHERE \"id\" = ?{n}",
      table = quote(R::COLLECTION.as_str()),
      n = fields.len() + 1,
    );

    let params: Vec<Value> = fields
      .iter()
      .map(|(_, v)| encode_value(v))
      .chain(std::iter::once(Value::Text(encode_uuid(id))))
      .collect();

    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, params_from_iter(params.iter()))?))
      .await?;

    if changed == 0 {
      return Err(Error::NotFound { collection: R::COLLECTION.as_str(), id });
    }
    Ok(())
  }
}
