//! Medical certificate persistence

use cipa_common::models::MedicalCertificate;
use cipa_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{date_text, get_date, get_uuid};

fn from_row(row: &SqliteRow) -> Result<MedicalCertificate> {
    Ok(MedicalCertificate {
        id: get_uuid(row, "id")?,
        collaborator_id: get_uuid(row, "collaborator_id")?,
        start_date: get_date(row, "start_date")?,
        days: row.get("days"),
        cid: row.get("cid"),
        reason: row.get("reason"),
    })
}

pub async fn insert_certificate(pool: &SqlitePool, certificate: &MedicalCertificate) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO medical_certificates (id, collaborator_id, start_date, days, cid, reason)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(certificate.id.to_string())
    .bind(certificate.collaborator_id.to_string())
    .bind(date_text(certificate.start_date))
    .bind(certificate.days)
    .bind(&certificate.cid)
    .bind(&certificate.reason)
    .execute(pool)
    .await?;

    Ok(())
}

/// Certificates of one collaborator, most recent first
pub async fn list_by_collaborator(
    pool: &SqlitePool,
    collaborator_id: Uuid,
) -> Result<Vec<MedicalCertificate>> {
    let rows = sqlx::query(
        "SELECT * FROM medical_certificates WHERE collaborator_id = ? ORDER BY start_date DESC",
    )
    .bind(collaborator_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

/// Every certificate of a branch's collaborators
pub async fn list_by_branch(pool: &SqlitePool, branch_id: Uuid) -> Result<Vec<MedicalCertificate>> {
    let rows = sqlx::query(
        r#"
        SELECT mc.* FROM medical_certificates mc
        JOIN collaborators c ON c.id = mc.collaborator_id
        WHERE c.branch_id = ?
        ORDER BY mc.start_date
        "#,
    )
    .bind(branch_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

pub async fn delete_certificate(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM medical_certificates WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
