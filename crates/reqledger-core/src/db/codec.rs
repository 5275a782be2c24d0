//! Mapping between versioned records and `request_versions`-style rows.
//!
//! Every ledger table shares the same frame: `id`, `version`, then the
//! snapshot columns, then `created_at_us` and `updated_at_us`. A snapshot
//! type only describes its own columns through [`RowCodec`].

use crate::ledger::{Snapshot, Version, VersionedRecord};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::{Type, Value};
use std::fmt::Write as _;
use uuid::Uuid;

/// Column layout of a snapshot type.
pub trait RowCodec: Snapshot {
    /// Table holding one row per `(id, version)`.
    const TABLE: &'static str;

    /// Snapshot columns, in the order of [`RowCodec::to_values`].
    const COLUMNS: &'static [&'static str];

    /// Columns that may appear in a listing equality filter.
    const FILTER_COLUMNS: &'static [&'static str];

    /// SQL values for [`RowCodec::COLUMNS`].
    fn to_values(&self) -> Vec<Value>;

    /// Read the snapshot columns starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if a column is missing or has the wrong type.
    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self>;
}

/// Frame column count before the snapshot columns.
const HEAD: usize = 2;

/// Comma-separated select list, each column qualified with `alias`.
#[must_use]
pub fn select_columns<S: RowCodec>(alias: &str) -> String {
    let mut out = format!("{alias}.id, {alias}.version");
    for column in S::COLUMNS {
        let _ = write!(out, ", {alias}.{column}");
    }
    let _ = write!(out, ", {alias}.created_at_us, {alias}.updated_at_us");
    out
}

/// `INSERT` statement for one full row.
#[must_use]
pub fn insert_sql<S: RowCodec>() -> String {
    let columns = S::COLUMNS.join(", ");
    let placeholders = (1..=S::COLUMNS.len() + HEAD + 2)
        .map(|n| format!("?{n}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} (id, version, {columns}, created_at_us, updated_at_us) \
         VALUES ({placeholders})",
        S::TABLE
    )
}

/// Bind values for [`insert_sql`].
#[must_use]
pub fn record_values<S: RowCodec>(record: &VersionedRecord<S>) -> Vec<Value> {
    let mut values = Vec::with_capacity(S::COLUMNS.len() + HEAD + 2);
    values.push(uuid_value(record.id));
    values.push(version_value(record.version));
    values.extend(record.snapshot.to_values());
    values.push(Value::Integer(record.created_at.timestamp_micros()));
    values.push(Value::Integer(record.updated_at.timestamp_micros()));
    values
}

/// Decode a row selected with [`select_columns`].
///
/// # Errors
///
/// Returns an error if any frame or snapshot column fails to decode.
pub fn record_from_row<S: RowCodec>(row: &Row<'_>) -> rusqlite::Result<VersionedRecord<S>> {
    let tail = HEAD + S::COLUMNS.len();
    Ok(VersionedRecord {
        id: uuid_from_row(row, 0)?,
        version: version_from_row(row, 1)?,
        snapshot: S::from_row(row, HEAD)?,
        created_at: micros_from_row(row, tail)?,
        updated_at: micros_from_row(row, tail + 1)?,
    })
}

#[must_use]
pub fn uuid_value(id: Uuid) -> Value {
    Value::Text(id.hyphenated().to_string())
}

#[must_use]
pub fn version_value(version: Version) -> Value {
    // Version::MAX fits in i64.
    Value::Integer(i64::try_from(version.get()).unwrap_or(i64::MAX))
}

#[must_use]
pub fn text_value(value: &str) -> Value {
    Value::Text(value.to_owned())
}

#[must_use]
pub fn opt_text_value(value: Option<&str>) -> Value {
    value.map_or(Value::Null, text_value)
}

#[must_use]
pub fn opt_int_value(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

#[must_use]
pub fn opt_micros_value(value: Option<DateTime<Utc>>) -> Value {
    opt_int_value(value.map(|at| at.timestamp_micros()))
}

/// # Errors
///
/// Returns an error if the column is not a valid UUID string.
pub fn uuid_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

/// # Errors
///
/// Returns an error if the column is not a positive integer.
pub fn version_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<Version> {
    let raw: i64 = row.get(idx)?;
    u64::try_from(raw)
        .ok()
        .and_then(Version::new)
        .ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Integer,
                format!("invalid version {raw}").into(),
            )
        })
}

/// # Errors
///
/// Returns an error if the column is not a representable timestamp.
pub fn micros_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: i64 = row.get(idx)?;
    micros_to_datetime(raw, idx)
}

/// # Errors
///
/// Returns an error if a non-null column is not a representable timestamp.
pub fn opt_micros_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<i64> = row.get(idx)?;
    raw.map(|raw| micros_to_datetime(raw, idx)).transpose()
}

fn micros_to_datetime(raw: i64, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp {raw}us out of range").into(),
        )
    })
}
