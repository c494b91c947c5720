use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::RepositoryError;

pub(crate) fn text(row: &SqliteRow, column: &str) -> Result<String, RepositoryError> {
    row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
}

pub(crate) fn optional_text(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<String>, RepositoryError> {
    row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
}

pub(crate) fn unsigned(row: &SqliteRow, column: &str) -> Result<u64, RepositoryError> {
    let value: i64 = row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))?;
    u64::try_from(value)
        .map_err(|_| RepositoryError::Decode(format!("column `{column}` is negative: {value}")))
}

pub(crate) fn decimal(row: &SqliteRow, column: &str) -> Result<Decimal, RepositoryError> {
    let raw = text(row, column)?;
    Decimal::from_str(&raw)
        .map_err(|e| RepositoryError::Decode(format!("column `{column}` ({raw}): {e}")))
}

pub(crate) fn timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, RepositoryError> {
    let raw = text(row, column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("column `{column}` ({raw}): {e}")))
}

pub(crate) fn json<T: serde::de::DeserializeOwned>(
    row: &SqliteRow,
    column: &str,
) -> Result<T, RepositoryError> {
    let raw = text(row, column)?;
    serde_json::from_str(&raw).map_err(|e| RepositoryError::Decode(format!("column `{column}`: {e}")))
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Decode(e.to_string()))
}

pub(crate) fn parse_label<T: FromStr>(row: &SqliteRow, column: &str) -> Result<T, RepositoryError>
where
    T::Err: std::fmt::Display,
{
    let raw = text(row, column)?;
    raw.parse::<T>().map_err(|e| RepositoryError::Decode(e.to_string()))
}

/// Fixed-width so timestamps order lexically.
pub(crate) fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
