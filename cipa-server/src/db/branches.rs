//! Branch read model

use cipa_common::models::Branch;
use cipa_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::get_uuid;

fn from_row(row: &SqliteRow) -> Result<Branch> {
    Ok(Branch {
        id: get_uuid(row, "id")?,
        company_name: row.get("company_name"),
        branch_name: row.get("branch_name"),
        cnpj: row.get("cnpj"),
        cnae: row.get("cnae"),
        city: row.get("city"),
        logo_url: row.get("logo_url"),
    })
}

pub async fn insert_branch(pool: &SqlitePool, branch: &Branch) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO branches (id, company_name, branch_name, cnpj, cnae, city, logo_url)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(branch.id.to_string())
    .bind(&branch.company_name)
    .bind(&branch.branch_name)
    .bind(&branch.cnpj)
    .bind(&branch.cnae)
    .bind(&branch.city)
    .bind(&branch.logo_url)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_branch(pool: &SqlitePool, id: Uuid) -> Result<Option<Branch>> {
    let row = sqlx::query("SELECT * FROM branches WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// Load or fail with [`Error::NotFound`]
pub async fn require_branch(pool: &SqlitePool, id: Uuid) -> Result<Branch> {
    load_branch(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Branch {}", id)))
}

pub async fn list_branches(pool: &SqlitePool) -> Result<Vec<Branch>> {
    let rows = sqlx::query("SELECT * FROM branches ORDER BY company_name, branch_name")
        .fetch_all(pool)
        .await?;

    rows.iter().map(from_row).collect()
}
