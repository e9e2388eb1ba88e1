//! Meeting and action plan endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use chrono::NaiveDate;
use cipa_common::models::{ActionPlan, ActionPlanStatus, Meeting, MeetingKind, Term};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{db, ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct MeetingRequest {
    pub kind: MeetingKind,
    pub date: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ActionPlanRequest {
    pub description: String,
    pub deadline: NaiveDate,
    pub responsible_id: Option<Uuid>,
    #[serde(default = "default_plan_status")]
    pub status: ActionPlanStatus,
}

fn default_plan_status() -> ActionPlanStatus {
    ActionPlanStatus::Pending
}

fn non_blank(value: &str, field: &str) -> ApiResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// The responsible person must work at the term's branch
async fn check_responsible(state: &AppState, term: &Term, responsible: Option<Uuid>) -> ApiResult<()> {
    let Some(id) = responsible else {
        return Ok(());
    };
    match db::collaborators::load_collaborator(&state.db, id).await? {
        Some(c) if c.branch_id == term.branch_id => Ok(()),
        _ => Err(ApiError::BadRequest(
            "responsible_id does not reference a collaborator of this branch".to_string(),
        )),
    }
}

// ========================================
// Meetings
// ========================================

/// GET /api/terms/:id/meetings
pub async fn list_meetings(
    State(state): State<AppState>,
    Path(term_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Meeting>>> {
    db::terms::require_term(&state.db, term_id).await?;
    Ok(Json(db::meetings::list_by_term(&state.db, term_id).await?))
}

/// POST /api/terms/:id/meetings
pub async fn create_meeting(
    State(state): State<AppState>,
    Path(term_id): Path<Uuid>,
    Json(request): Json<MeetingRequest>,
) -> ApiResult<(StatusCode, Json<Meeting>)> {
    db::terms::require_term(&state.db, term_id).await?;

    let meeting = Meeting {
        id: Uuid::new_v4(),
        term_id,
        kind: request.kind,
        date: request.date,
        title: non_blank(&request.title, "title")?,
        description: request.description.trim().to_string(),
    };
    db::meetings::save_meeting(&state.db, &meeting).await?;

    info!(meeting_id = %meeting.id, term_id = %term_id, kind = %meeting.kind, "Meeting created");
    Ok((StatusCode::CREATED, Json(meeting)))
}

/// GET /api/meetings/:id
pub async fn get_meeting(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Meeting>> {
    Ok(Json(db::meetings::require_meeting(&state.db, id).await?))
}

/// PUT /api/meetings/:id
pub async fn update_meeting(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MeetingRequest>,
) -> ApiResult<Json<Meeting>> {
    let mut meeting = db::meetings::require_meeting(&state.db, id).await?;
    meeting.kind = request.kind;
    meeting.date = request.date;
    meeting.title = non_blank(&request.title, "title")?;
    meeting.description = request.description.trim().to_string();
    db::meetings::save_meeting(&state.db, &meeting).await?;
    Ok(Json(meeting))
}

/// DELETE /api/meetings/:id
///
/// Action plans of the meeting go with it.
pub async fn delete_meeting(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !db::meetings::delete_meeting(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("Meeting {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ========================================
// Action plans
// ========================================

/// GET /api/meetings/:id/action-plans
pub async fn list_meeting_plans(
    State(state): State<AppState>,
    Path(meeting_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ActionPlan>>> {
    db::meetings::require_meeting(&state.db, meeting_id).await?;
    Ok(Json(db::action_plans::list_by_meeting(&state.db, meeting_id).await?))
}

/// GET /api/terms/:id/action-plans
pub async fn list_term_plans(
    State(state): State<AppState>,
    Path(term_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ActionPlan>>> {
    db::terms::require_term(&state.db, term_id).await?;
    Ok(Json(db::action_plans::list_by_term(&state.db, term_id).await?))
}

/// POST /api/meetings/:id/action-plans
pub async fn create_action_plan(
    State(state): State<AppState>,
    Path(meeting_id): Path<Uuid>,
    Json(request): Json<ActionPlanRequest>,
) -> ApiResult<(StatusCode, Json<ActionPlan>)> {
    let meeting = db::meetings::require_meeting(&state.db, meeting_id).await?;
    let term = db::terms::require_term(&state.db, meeting.term_id).await?;
    check_responsible(&state, &term, request.responsible_id).await?;

    let plan = ActionPlan {
        id: Uuid::new_v4(),
        meeting_id,
        description: non_blank(&request.description, "description")?,
        deadline: request.deadline,
        responsible_id: request.responsible_id,
        status: request.status,
    };
    db::action_plans::save_action_plan(&state.db, &plan).await?;

    Ok((StatusCode::CREATED, Json(plan)))
}

/// PUT /api/action-plans/:id
pub async fn update_action_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ActionPlanRequest>,
) -> ApiResult<Json<ActionPlan>> {
    let mut plan = db::action_plans::require_action_plan(&state.db, id).await?;
    let meeting = db::meetings::require_meeting(&state.db, plan.meeting_id).await?;
    let term = db::terms::require_term(&state.db, meeting.term_id).await?;
    check_responsible(&state, &term, request.responsible_id).await?;

    plan.description = non_blank(&request.description, "description")?;
    plan.deadline = request.deadline;
    plan.responsible_id = request.responsible_id;
    plan.status = request.status;
    db::action_plans::save_action_plan(&state.db, &plan).await?;
    Ok(Json(plan))
}

/// DELETE /api/action-plans/:id
pub async fn delete_action_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !db::action_plans::delete_action_plan(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("Action plan {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Build meeting and action plan routes
pub fn meeting_routes() -> Router<AppState> {
    Router::new()
        .route("/api/terms/:id/meetings", get(list_meetings).post(create_meeting))
        .route(
            "/api/meetings/:id",
            get(get_meeting).put(update_meeting).delete(delete_meeting),
        )
        .route(
            "/api/meetings/:id/action-plans",
            get(list_meeting_plans).post(create_action_plan),
        )
        .route("/api/terms/:id/action-plans", get(list_term_plans))
        .route(
            "/api/action-plans/:id",
            put(update_action_plan).delete(delete_action_plan),
        )
}
