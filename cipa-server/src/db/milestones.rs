//! Persisted milestone completions

use chrono::{DateTime, Utc};
use cipa_common::election::{ElectionProgress, MilestoneId};
use cipa_common::Result;
use sqlx::{Row, SqlitePool};
use tracing::warn;
use uuid::Uuid;

/// Rebuild a term's progress from stored completions
pub async fn load_progress(pool: &SqlitePool, term_id: Uuid) -> Result<ElectionProgress> {
    let rows = sqlx::query("SELECT milestone_id, completed_at FROM term_milestones WHERE term_id = ?")
        .bind(term_id.to_string())
        .fetch_all(pool)
        .await?;

    let mut completions = Vec::with_capacity(rows.len());
    for row in &rows {
        let milestone: String = row.get("milestone_id");
        let Ok(id) = milestone.parse::<MilestoneId>() else {
            warn!(term_id = %term_id, "Ignoring unknown milestone {}", milestone);
            continue;
        };
        completions.push((id, super::get_timestamp(row, "completed_at")?));
    }

    Ok(ElectionProgress::from_completions(completions))
}

pub async fn mark_completed(
    pool: &SqlitePool,
    term_id: Uuid,
    milestone: MilestoneId,
    at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO term_milestones (term_id, milestone_id, completed_at)
        VALUES (?, ?, ?)
        ON CONFLICT(term_id, milestone_id) DO NOTHING
        "#,
    )
    .bind(term_id.to_string())
    .bind(milestone.as_str())
    .bind(at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn clear_completed(pool: &SqlitePool, term_id: Uuid, milestone: MilestoneId) -> Result<()> {
    sqlx::query("DELETE FROM term_milestones WHERE term_id = ? AND milestone_id = ?")
        .bind(term_id.to_string())
        .bind(milestone.as_str())
        .execute(pool)
        .await?;

    Ok(())
}
