//! Collaborator read model

use cipa_common::models::Collaborator;
use cipa_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

use super::get_uuid;

fn from_row(row: &SqliteRow) -> Result<Collaborator> {
    let active: i64 = row.get("active");
    Ok(Collaborator {
        id: get_uuid(row, "id")?,
        branch_id: get_uuid(row, "branch_id")?,
        name: row.get("name"),
        job_title: row.get("job_title"),
        email: row.get("email"),
        active: active != 0,
    })
}

pub async fn insert_collaborator(pool: &SqlitePool, collaborator: &Collaborator) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO collaborators (id, branch_id, name, job_title, email, active)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(collaborator.id.to_string())
    .bind(collaborator.branch_id.to_string())
    .bind(&collaborator.name)
    .bind(&collaborator.job_title)
    .bind(&collaborator.email)
    .bind(collaborator.active as i64)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_collaborator(pool: &SqlitePool, id: Uuid) -> Result<Option<Collaborator>> {
    let row = sqlx::query("SELECT * FROM collaborators WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn require_collaborator(pool: &SqlitePool, id: Uuid) -> Result<Collaborator> {
    load_collaborator(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Collaborator {}", id)))
}

pub async fn list_by_branch(pool: &SqlitePool, branch_id: Uuid) -> Result<Vec<Collaborator>> {
    let rows = sqlx::query("SELECT * FROM collaborators WHERE branch_id = ? ORDER BY name")
        .bind(branch_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(from_row).collect()
}

/// Active headcount used for dimensioning
pub async fn count_active(pool: &SqlitePool, branch_id: Uuid) -> Result<u32> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM collaborators WHERE branch_id = ? AND active = 1",
    )
    .bind(branch_id.to_string())
    .fetch_one(pool)
    .await?;

    Ok(count as u32)
}

/// Collaborators keyed by id, for joining names into documents and listings
pub async fn load_many(pool: &SqlitePool, ids: &[Uuid]) -> Result<HashMap<Uuid, Collaborator>> {
    let mut found = HashMap::with_capacity(ids.len());
    for id in ids {
        if found.contains_key(id) {
            continue;
        }
        if let Some(collaborator) = load_collaborator(pool, *id).await? {
            found.insert(*id, collaborator);
        }
    }
    Ok(found)
}
