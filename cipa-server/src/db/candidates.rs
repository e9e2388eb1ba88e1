//! Candidate persistence
//!
//! The approval write is conditional on the row still being
//! `PENDING_SIGNATURE`, so exactly one caller observes the transition.

use cipa_common::models::{Candidate, CandidateStatus};
use cipa_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{get_enum, get_timestamp, get_uuid};

fn from_row(row: &SqliteRow) -> Result<Candidate> {
    Ok(Candidate {
        id: get_uuid(row, "id")?,
        term_id: get_uuid(row, "term_id")?,
        collaborator_id: get_uuid(row, "collaborator_id")?,
        registered_at: get_timestamp(row, "registered_at")?,
        signature_url: row.get("signature_url"),
        status: get_enum(row, "status")?,
    })
}

/// Insert a new candidacy; the UNIQUE (term, collaborator) constraint backs
/// the duplicate check done before calling this
pub async fn insert_candidate(pool: &SqlitePool, candidate: &Candidate) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO candidates (id, term_id, collaborator_id, registered_at, signature_url, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(candidate.id.to_string())
    .bind(candidate.term_id.to_string())
    .bind(candidate.collaborator_id.to_string())
    .bind(candidate.registered_at.to_rfc3339())
    .bind(&candidate.signature_url)
    .bind(candidate.status.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_candidate(pool: &SqlitePool, id: Uuid) -> Result<Option<Candidate>> {
    let row = sqlx::query("SELECT * FROM candidates WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn require_candidate(pool: &SqlitePool, id: Uuid) -> Result<Candidate> {
    load_candidate(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Candidate {}", id)))
}

pub async fn find_by_collaborator(
    pool: &SqlitePool,
    term_id: Uuid,
    collaborator_id: Uuid,
) -> Result<Option<Candidate>> {
    let row = sqlx::query("SELECT * FROM candidates WHERE term_id = ? AND collaborator_id = ?")
        .bind(term_id.to_string())
        .bind(collaborator_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// Candidates of a term in registration order
pub async fn list_by_term(pool: &SqlitePool, term_id: Uuid) -> Result<Vec<Candidate>> {
    let rows = sqlx::query("SELECT * FROM candidates WHERE term_id = ? ORDER BY registered_at")
        .bind(term_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(from_row).collect()
}

/// PENDING_SIGNATURE → APPROVED; returns false when the row was not pending
pub async fn approve_if_pending(pool: &SqlitePool, id: Uuid, signature_url: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE candidates
        SET signature_url = ?, status = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(signature_url)
    .bind(CandidateStatus::Approved.as_str())
    .bind(id.to_string())
    .bind(CandidateStatus::PendingSignature.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn delete_candidate(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM candidates WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Signature references still used by any candidate
pub async fn signature_in_use(pool: &SqlitePool, signature_url: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM candidates WHERE signature_url = ?")
        .bind(signature_url)
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}
