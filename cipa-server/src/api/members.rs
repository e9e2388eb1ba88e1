//! Committee member (cipeiro) endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use cipa_common::models::{CommitteeRole, Member, MemberOrigin};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{db, ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateMemberRequest {
    pub collaborator_id: Uuid,
    pub role: CommitteeRole,
    pub origin: MemberOrigin,
    pub votes: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: CommitteeRole,
    pub origin: MemberOrigin,
    pub votes: Option<i64>,
}

/// Member with the collaborator's display data
#[derive(Debug, Serialize)]
pub struct MemberView {
    #[serde(flatten)]
    pub member: Member,
    pub collaborator_name: Option<String>,
    pub job_title: Option<String>,
}

/// GET /api/terms/:id/members
pub async fn list_members(
    State(state): State<AppState>,
    Path(term_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MemberView>>> {
    db::terms::require_term(&state.db, term_id).await?;
    let members = db::members::list_by_term(&state.db, term_id).await?;
    let ids: Vec<Uuid> = members.iter().map(|m| m.collaborator_id).collect();
    let collaborators = db::collaborators::load_many(&state.db, &ids).await?;

    let mut views: Vec<MemberView> = members
        .into_iter()
        .map(|member| {
            let collaborator = collaborators.get(&member.collaborator_id);
            MemberView {
                collaborator_name: collaborator.map(|c| c.name.clone()),
                job_title: collaborator.and_then(|c| c.job_title.clone()),
                member,
            }
        })
        .collect();
    views.sort_by_key(|v| v.member.role as u8);

    Ok(Json(views))
}

/// POST /api/terms/:id/members
pub async fn create_member(
    State(state): State<AppState>,
    Path(term_id): Path<Uuid>,
    Json(request): Json<CreateMemberRequest>,
) -> ApiResult<(StatusCode, Json<Member>)> {
    let term = db::terms::require_term(&state.db, term_id).await?;
    let collaborator =
        db::collaborators::require_collaborator(&state.db, request.collaborator_id).await?;
    if collaborator.branch_id != term.branch_id {
        return Err(ApiError::BadRequest(
            "Collaborator does not belong to the term's branch".to_string(),
        ));
    }
    if db::members::find_by_collaborator(&state.db, term_id, request.collaborator_id)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "{} is already a member of this term",
            collaborator.name
        )));
    }

    let member = Member {
        id: Uuid::new_v4(),
        term_id,
        collaborator_id: request.collaborator_id,
        role: request.role,
        origin: request.origin,
        votes: request.votes,
    };
    member.validate()?;
    db::members::save_member(&state.db, &member).await?;

    Ok((StatusCode::CREATED, Json(member)))
}

/// PUT /api/members/:id
pub async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMemberRequest>,
) -> ApiResult<Json<Member>> {
    let mut member = db::members::require_member(&state.db, id).await?;
    member.role = request.role;
    member.origin = request.origin;
    member.votes = request.votes;
    member.validate()?;
    db::members::save_member(&state.db, &member).await?;
    Ok(Json(member))
}

/// DELETE /api/members/:id
pub async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !db::members::delete_member(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("Member {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Build member routes
pub fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/api/terms/:id/members", get(list_members).post(create_member))
        .route("/api/members/:id", put(update_member).delete(delete_member))
}
