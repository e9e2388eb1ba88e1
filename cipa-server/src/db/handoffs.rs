//! Remote-signature hand-off sessions

use chrono::{DateTime, Utc};
use cipa_common::models::{HandoffSession, HandoffStatus};
use cipa_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{get_enum, get_timestamp, get_uuid};

fn from_row(row: &SqliteRow) -> Result<HandoffSession> {
    Ok(HandoffSession {
        token: get_uuid(row, "token")?,
        candidate_id: get_uuid(row, "candidate_id")?,
        status: get_enum(row, "status")?,
        created_at: get_timestamp(row, "created_at")?,
        expires_at: get_timestamp(row, "expires_at")?,
    })
}

pub async fn insert_session(pool: &SqlitePool, session: &HandoffSession) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO handoff_sessions (token, candidate_id, status, created_at, expires_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(session.token.to_string())
    .bind(session.candidate_id.to_string())
    .bind(session.status.as_str())
    .bind(session.created_at.to_rfc3339())
    .bind(session.expires_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_session(pool: &SqlitePool, token: Uuid) -> Result<Option<HandoffSession>> {
    let row = sqlx::query("SELECT * FROM handoff_sessions WHERE token = ?")
        .bind(token.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// Move an OPEN session to `status`; returns false if it was no longer open
pub async fn close_session(pool: &SqlitePool, token: Uuid, status: HandoffStatus) -> Result<bool> {
    let result = sqlx::query("UPDATE handoff_sessions SET status = ? WHERE token = ? AND status = ?")
        .bind(status.as_str())
        .bind(token.to_string())
        .bind(HandoffStatus::Open.as_str())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Close every OPEN session of a candidate; a new hand-off supersedes older ones
pub async fn close_open_for_candidate(
    pool: &SqlitePool,
    candidate_id: Uuid,
    status: HandoffStatus,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE handoff_sessions SET status = ? WHERE candidate_id = ? AND status = ?",
    )
    .bind(status.as_str())
    .bind(candidate_id.to_string())
    .bind(HandoffStatus::Open.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Mark sessions past their deadline as EXPIRED
pub async fn expire_stale(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE handoff_sessions SET status = ? WHERE status = ? AND expires_at <= ?",
    )
    .bind(HandoffStatus::Expired.as_str())
    .bind(HandoffStatus::Open.as_str())
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
