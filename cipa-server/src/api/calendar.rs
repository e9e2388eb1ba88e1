//! Election calendar and progress endpoints

use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use chrono::NaiveDate;
use cipa_common::election::{self, ElectionCalendar, MilestoneId, ProgressView, MILESTONE_RULES};
use cipa_common::events::CipaEvent;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{db, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct TermCalendarResponse {
    pub term_id: Uuid,
    pub anchor: Option<NaiveDate>,
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
    /// Milestones with completion flags; absent until the anchor date is set
    pub calendar: Option<ProgressView>,
}

#[derive(Debug, Deserialize)]
pub struct MilestoneUpdate {
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct MilestoneUpdateResponse {
    pub term_id: Uuid,
    pub milestone_id: MilestoneId,
    pub completed: bool,
    pub percentage: u8,
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub anchor: NaiveDate,
}

/// GET /api/terms/:id/calendar
pub async fn term_calendar(
    State(state): State<AppState>,
    Path(term_id): Path<Uuid>,
) -> ApiResult<Json<TermCalendarResponse>> {
    let term = db::terms::require_term(&state.db, term_id).await?;
    let progress = db::milestones::load_progress(&state.db, term_id).await?;

    Ok(Json(TermCalendarResponse {
        term_id,
        anchor: term.previous_posse_date,
        completed: progress.completed_count(),
        total: MILESTONE_RULES.len(),
        percentage: progress.percentage(),
        calendar: term
            .previous_posse_date
            .map(|anchor| progress.view(&election::generate(anchor))),
    }))
}

/// PUT /api/terms/:id/milestones/:milestone_id
///
/// **Request:** `{"completed": true}`
pub async fn update_milestone(
    State(state): State<AppState>,
    Path((term_id, milestone)): Path<(Uuid, String)>,
    Json(update): Json<MilestoneUpdate>,
) -> ApiResult<Json<MilestoneUpdateResponse>> {
    let milestone: MilestoneId = milestone.parse()?;
    db::terms::require_term(&state.db, term_id).await?;

    let now = cipa_common::time::now();
    if update.completed {
        db::milestones::mark_completed(&state.db, term_id, milestone, now).await?;
    } else {
        db::milestones::clear_completed(&state.db, term_id, milestone).await?;
    }
    let percentage = db::milestones::load_progress(&state.db, term_id)
        .await?
        .percentage();

    info!(
        term_id = %term_id,
        milestone = %milestone,
        completed = update.completed,
        percentage,
        "Milestone updated"
    );
    state.event_bus.emit_lossy(CipaEvent::MilestoneUpdated {
        term_id,
        milestone_id: milestone.as_str().to_string(),
        completed: update.completed,
        percentage,
        timestamp: now,
    });

    Ok(Json(MilestoneUpdateResponse {
        term_id,
        milestone_id: milestone,
        completed: update.completed,
        percentage,
    }))
}

/// GET /api/calendar/preview?anchor=YYYY-MM-DD
///
/// Calendar for an anchor date without any term.
pub async fn preview_calendar(Query(query): Query<PreviewQuery>) -> Json<ElectionCalendar> {
    Json(election::generate(query.anchor))
}

/// Build calendar routes
pub fn calendar_routes() -> Router<AppState> {
    Router::new()
        .route("/api/terms/:id/calendar", get(term_calendar))
        .route("/api/terms/:id/milestones/:milestone_id", put(update_milestone))
        .route("/api/calendar/preview", get(preview_calendar))
}
