//! Database access for cipa-server
//!
//! One module per table. Functions take `&SqlitePool` and return
//! `cipa_common::Result`; ids, dates and timestamps are stored as TEXT.

pub mod action_plans;
pub mod branches;
pub mod candidates;
pub mod certificates;
pub mod collaborators;
pub mod handoffs;
pub mod meetings;
pub mod members;
pub mod milestones;
pub mod terms;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use cipa_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

pub(crate) fn get_uuid(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let value: String = row.get(column);
    cipa_common::uuid_utils::parse_stored(column, &value)
}

pub(crate) fn get_opt_uuid(row: &SqliteRow, column: &str) -> Result<Option<Uuid>> {
    let value: Option<String> = row.get(column);
    value
        .map(|v| cipa_common::uuid_utils::parse_stored(column, &v))
        .transpose()
}

pub(crate) fn get_date(row: &SqliteRow, column: &str) -> Result<NaiveDate> {
    let value: String = row.get(column);
    parse_date(column, &value)
}

pub(crate) fn get_opt_date(row: &SqliteRow, column: &str) -> Result<Option<NaiveDate>> {
    let value: Option<String> = row.get(column);
    value.map(|v| parse_date(column, &v)).transpose()
}

pub(crate) fn get_opt_time(row: &SqliteRow, column: &str) -> Result<Option<NaiveTime>> {
    let value: Option<String> = row.get(column);
    value
        .map(|v| {
            NaiveTime::parse_from_str(&v, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(&v, "%H:%M"))
                .map_err(|e| Error::Internal(format!("Failed to parse {}: {}", column, e)))
        })
        .transpose()
}

pub(crate) fn get_timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let value: String = row.get(column);
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse {}: {}", column, e)))
}

/// Parse a stored enum code
pub(crate) fn get_enum<T>(row: &SqliteRow, column: &str) -> Result<T>
where
    T: FromStr<Err = Error>,
{
    let value: String = row.get(column);
    value
        .parse()
        .map_err(|e| Error::Internal(format!("Invalid value in column {}: {}", column, e)))
}

fn parse_date(column: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| Error::Internal(format!("Failed to parse {}: {}", column, e)))
}

pub(crate) fn date_text(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn time_text(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}
