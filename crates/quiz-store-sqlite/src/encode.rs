//! Encoding and decoding helpers between record fields and the values stored
//! in SQLite columns.
//!
//! UUIDs are stored as hyphenated lowercase strings. Field values map onto
//! SQLite's `NULL`, `TEXT` and `INTEGER` storage classes; `REAL` and `BLOB`
//! are never written and are rejected on read.

use quiz_core::record::{FieldMap, FieldValue, Fields, Record};
use rusqlite::types::Value;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Field values ────────────────────────────────────────────────────────────

pub fn encode_value(v: &FieldValue) -> Value {
  match v {
    FieldValue::Null => Value::Null,
    FieldValue::Text(s) => Value::Text(s.clone()),
    FieldValue::Integer(n) => Value::Integer(*n),
  }
}

pub fn decode_value(
  collection: &'static str,
  field:      &'static str,
  v:          Value,
) -> Result<FieldValue> {
  match v {
    Value::Null => Ok(FieldValue::Null),
    Value::Text(s) => Ok(FieldValue::Text(s)),
    Value::Integer(n) => Ok(FieldValue::Integer(n)),
    Value::Real(_) | Value::Blob(_) => Err(Error::UnsupportedValue { collection, field }),
  }
}

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Quote an SQL identifier.
pub fn quote(ident: &str) -> String { format!("\"{}\"", ident.replace('"', "\"\"")) }

/// Reject field names that are not columns of `R`'s table. Column names only
/// ever come from this check's whitelist, never from values.
pub fn check_fields<R: Record>(fields: &[(&'static str, FieldValue)]) -> Result<()> {
  match fields.iter().find(|(name, _)| !R::FIELDS.contains(name)) {
    Some((field, _)) => Err(Error::UnknownField {
      collection: R::COLLECTION.as_str(),
      field:      *field,
    }),
    None => Ok(()),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a row: `id` followed by `R::FIELDS` in order.
pub struct RawRecord {
  pub id:     String,
  pub values: Vec<Value>,
}

impl RawRecord {
  pub fn into_record<R: Record>(self) -> Result<R> {
    let id = decode_uuid(&self.id)?;
    let collection = R::COLLECTION.as_str();

    let fields: Fields = R::FIELDS
      .iter()
      .zip(self.values)
      .map(|(&field, v)| Ok((field, decode_value(collection, field, v)?)))
      .collect::<Result<_>>()?;

    Ok(R::from_fields(FieldMap::new(R::COLLECTION, id, fields))?)
  }
}
