//! Committee member persistence

use cipa_common::models::Member;
use cipa_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{get_enum, get_uuid};

fn from_row(row: &SqliteRow) -> Result<Member> {
    Ok(Member {
        id: get_uuid(row, "id")?,
        term_id: get_uuid(row, "term_id")?,
        collaborator_id: get_uuid(row, "collaborator_id")?,
        role: get_enum(row, "role")?,
        origin: get_enum(row, "origin")?,
        votes: row.get("votes"),
    })
}

pub async fn save_member(pool: &SqlitePool, member: &Member) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO members (id, term_id, collaborator_id, role, origin, votes)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            role = excluded.role,
            origin = excluded.origin,
            votes = excluded.votes
        "#,
    )
    .bind(member.id.to_string())
    .bind(member.term_id.to_string())
    .bind(member.collaborator_id.to_string())
    .bind(member.role.as_str())
    .bind(member.origin.as_str())
    .bind(member.votes)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_member(pool: &SqlitePool, id: Uuid) -> Result<Option<Member>> {
    let row = sqlx::query("SELECT * FROM members WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn require_member(pool: &SqlitePool, id: Uuid) -> Result<Member> {
    load_member(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Member {}", id)))
}

pub async fn find_by_collaborator(
    pool: &SqlitePool,
    term_id: Uuid,
    collaborator_id: Uuid,
) -> Result<Option<Member>> {
    let row = sqlx::query("SELECT * FROM members WHERE term_id = ? AND collaborator_id = ?")
        .bind(term_id.to_string())
        .bind(collaborator_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn list_by_term(pool: &SqlitePool, term_id: Uuid) -> Result<Vec<Member>> {
    let rows = sqlx::query("SELECT * FROM members WHERE term_id = ?")
        .bind(term_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(from_row).collect()
}

pub async fn delete_member(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM members WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
