//! Action plan persistence

use cipa_common::models::ActionPlan;
use cipa_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{date_text, get_date, get_enum, get_opt_uuid, get_uuid};

fn from_row(row: &SqliteRow) -> Result<ActionPlan> {
    Ok(ActionPlan {
        id: get_uuid(row, "id")?,
        meeting_id: get_uuid(row, "meeting_id")?,
        description: row.get("description"),
        deadline: get_date(row, "deadline")?,
        responsible_id: get_opt_uuid(row, "responsible_id")?,
        status: get_enum(row, "status")?,
    })
}

pub async fn save_action_plan(pool: &SqlitePool, plan: &ActionPlan) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO action_plans (id, meeting_id, description, deadline, responsible_id, status)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            description = excluded.description,
            deadline = excluded.deadline,
            responsible_id = excluded.responsible_id,
            status = excluded.status
        "#,
    )
    .bind(plan.id.to_string())
    .bind(plan.meeting_id.to_string())
    .bind(&plan.description)
    .bind(date_text(plan.deadline))
    .bind(plan.responsible_id.map(|id| id.to_string()))
    .bind(plan.status.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_action_plan(pool: &SqlitePool, id: Uuid) -> Result<Option<ActionPlan>> {
    let row = sqlx::query("SELECT * FROM action_plans WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn require_action_plan(pool: &SqlitePool, id: Uuid) -> Result<ActionPlan> {
    load_action_plan(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Action plan {}", id)))
}

pub async fn list_by_meeting(pool: &SqlitePool, meeting_id: Uuid) -> Result<Vec<ActionPlan>> {
    let rows = sqlx::query("SELECT * FROM action_plans WHERE meeting_id = ? ORDER BY deadline")
        .bind(meeting_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(from_row).collect()
}

/// Action plans of every meeting in a term
pub async fn list_by_term(pool: &SqlitePool, term_id: Uuid) -> Result<Vec<ActionPlan>> {
    let rows = sqlx::query(
        r#"
        SELECT a.* FROM action_plans a
        JOIN meetings m ON m.id = a.meeting_id
        WHERE m.term_id = ?
        ORDER BY a.deadline
        "#,
    )
    .bind(term_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

pub async fn delete_action_plan(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM action_plans WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
