//! Term persistence
//!
//! Field updates are last-write-wins; no version column is kept.

use cipa_common::models::{Term, TermStatus};
use cipa_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{
    date_text, get_date, get_enum, get_opt_date, get_opt_time, get_opt_uuid, get_timestamp,
    get_uuid, time_text,
};

fn from_row(row: &SqliteRow) -> Result<Term> {
    Ok(Term {
        id: get_uuid(row, "id")?,
        branch_id: get_uuid(row, "branch_id")?,
        year_label: row.get("year_label"),
        start_date: get_date(row, "start_date")?,
        end_date: get_date(row, "end_date")?,
        status: get_enum(row, "status")?,
        previous_posse_date: get_opt_date(row, "previous_posse_date")?,
        employer_representative_id: get_opt_uuid(row, "employer_representative_id")?,
        president_id: get_opt_uuid(row, "president_id")?,
        election_location: row.get("election_location"),
        election_start_time: get_opt_time(row, "election_start_time")?,
        election_end_time: get_opt_time(row, "election_end_time")?,
        created_at: get_timestamp(row, "created_at")?,
        updated_at: get_timestamp(row, "updated_at")?,
    })
}

/// Insert or overwrite every column of a term
pub async fn save_term(pool: &SqlitePool, term: &Term) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO terms (
            id, branch_id, year_label, start_date, end_date, status,
            previous_posse_date, employer_representative_id, president_id,
            election_location, election_start_time, election_end_time,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            year_label = excluded.year_label,
            start_date = excluded.start_date,
            end_date = excluded.end_date,
            status = excluded.status,
            previous_posse_date = excluded.previous_posse_date,
            employer_representative_id = excluded.employer_representative_id,
            president_id = excluded.president_id,
            election_location = excluded.election_location,
            election_start_time = excluded.election_start_time,
            election_end_time = excluded.election_end_time,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(term.id.to_string())
    .bind(term.branch_id.to_string())
    .bind(&term.year_label)
    .bind(date_text(term.start_date))
    .bind(date_text(term.end_date))
    .bind(term.status.as_str())
    .bind(term.previous_posse_date.map(date_text))
    .bind(term.employer_representative_id.map(|id| id.to_string()))
    .bind(term.president_id.map(|id| id.to_string()))
    .bind(&term.election_location)
    .bind(term.election_start_time.map(time_text))
    .bind(term.election_end_time.map(time_text))
    .bind(term.created_at.to_rfc3339())
    .bind(term.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_term(pool: &SqlitePool, id: Uuid) -> Result<Option<Term>> {
    let row = sqlx::query("SELECT * FROM terms WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn require_term(pool: &SqlitePool, id: Uuid) -> Result<Term> {
    load_term(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Term {}", id)))
}

/// Terms of a branch, newest first
pub async fn list_by_branch(pool: &SqlitePool, branch_id: Uuid) -> Result<Vec<Term>> {
    let rows = sqlx::query("SELECT * FROM terms WHERE branch_id = ? ORDER BY start_date DESC")
        .bind(branch_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(from_row).collect()
}

pub async fn update_status(
    pool: &SqlitePool,
    id: Uuid,
    status: TermStatus,
    updated_at: chrono::DateTime<chrono::Utc>,
) -> Result<()> {
    sqlx::query("UPDATE terms SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(updated_at.to_rfc3339())
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete a term and, through cascades, everything scoped by it
pub async fn delete_term(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM terms WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
