//! Meeting persistence

use cipa_common::models::Meeting;
use cipa_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{date_text, get_date, get_enum, get_uuid};

fn from_row(row: &SqliteRow) -> Result<Meeting> {
    Ok(Meeting {
        id: get_uuid(row, "id")?,
        term_id: get_uuid(row, "term_id")?,
        kind: get_enum(row, "kind")?,
        date: get_date(row, "date")?,
        title: row.get("title"),
        description: row.get("description"),
    })
}

pub async fn save_meeting(pool: &SqlitePool, meeting: &Meeting) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO meetings (id, term_id, kind, date, title, description)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            kind = excluded.kind,
            date = excluded.date,
            title = excluded.title,
            description = excluded.description
        "#,
    )
    .bind(meeting.id.to_string())
    .bind(meeting.term_id.to_string())
    .bind(meeting.kind.as_str())
    .bind(date_text(meeting.date))
    .bind(&meeting.title)
    .bind(&meeting.description)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_meeting(pool: &SqlitePool, id: Uuid) -> Result<Option<Meeting>> {
    let row = sqlx::query("SELECT * FROM meetings WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn require_meeting(pool: &SqlitePool, id: Uuid) -> Result<Meeting> {
    load_meeting(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Meeting {}", id)))
}

/// Meetings of a term, most recent first
pub async fn list_by_term(pool: &SqlitePool, term_id: Uuid) -> Result<Vec<Meeting>> {
    let rows = sqlx::query("SELECT * FROM meetings WHERE term_id = ? ORDER BY date DESC")
        .bind(term_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(from_row).collect()
}

pub async fn delete_meeting(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM meetings WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
