//! Term (gestão) endpoints
//!
//! Field updates are last-write-wins. Status changes go through
//! [`TermStatus::transition`] only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, NaiveTime};
use cipa_common::events::CipaEvent;
use cipa_common::models::{Term, TermStatus};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::info;
use uuid::Uuid;

use crate::services::approval;
use crate::{db, ApiError, ApiResult, AppState};

/// Editable term fields; optional fields left out are cleared
#[derive(Debug, Deserialize)]
pub struct TermRequest {
    pub year_label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub previous_posse_date: Option<NaiveDate>,
    pub employer_representative_id: Option<Uuid>,
    pub president_id: Option<Uuid>,
    pub election_location: Option<String>,
    pub election_start_time: Option<NaiveTime>,
    pub election_end_time: Option<NaiveTime>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: TermStatus,
}

/// Validate the request and copy it onto `term`
async fn apply(state: &AppState, term: &mut Term, request: TermRequest) -> ApiResult<()> {
    let year_label = request.year_label.trim();
    if year_label.is_empty() {
        return Err(ApiError::BadRequest("year_label is required".to_string()));
    }
    if request.end_date < request.start_date {
        return Err(ApiError::BadRequest(
            "end_date must not precede start_date".to_string(),
        ));
    }
    if let (Some(start), Some(end)) = (request.election_start_time, request.election_end_time) {
        if end <= start {
            return Err(ApiError::BadRequest(
                "election_end_time must be after election_start_time".to_string(),
            ));
        }
    }

    for (field, id) in [
        ("employer_representative_id", request.employer_representative_id),
        ("president_id", request.president_id),
    ] {
        let Some(id) = id else { continue };
        match db::collaborators::load_collaborator(&state.db, id).await? {
            Some(c) if c.branch_id == term.branch_id => {}
            _ => {
                return Err(ApiError::BadRequest(format!(
                    "{} does not reference a collaborator of this branch",
                    field
                )))
            }
        }
    }

    term.year_label = year_label.to_string();
    term.start_date = request.start_date;
    term.end_date = request.end_date;
    term.previous_posse_date = request.previous_posse_date;
    term.employer_representative_id = request.employer_representative_id;
    term.president_id = request.president_id;
    term.election_location = request
        .election_location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());
    term.election_start_time = request.election_start_time;
    term.election_end_time = request.election_end_time;
    Ok(())
}

/// GET /api/branches/:id/terms
pub async fn list_terms(
    State(state): State<AppState>,
    Path(branch_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Term>>> {
    db::branches::require_branch(&state.db, branch_id).await?;
    Ok(Json(db::terms::list_by_branch(&state.db, branch_id).await?))
}

/// POST /api/branches/:id/terms
///
/// New terms start in ELECTION.
pub async fn create_term(
    State(state): State<AppState>,
    Path(branch_id): Path<Uuid>,
    Json(request): Json<TermRequest>,
) -> ApiResult<(StatusCode, Json<Term>)> {
    db::branches::require_branch(&state.db, branch_id).await?;

    let now = cipa_common::time::now();
    let mut term = Term {
        id: Uuid::new_v4(),
        branch_id,
        year_label: String::new(),
        start_date: request.start_date,
        end_date: request.end_date,
        status: TermStatus::Election,
        previous_posse_date: None,
        employer_representative_id: None,
        president_id: None,
        election_location: None,
        election_start_time: None,
        election_end_time: None,
        created_at: now,
        updated_at: now,
    };
    apply(&state, &mut term, request).await?;
    db::terms::save_term(&state.db, &term).await?;

    info!(term_id = %term.id, branch_id = %branch_id, year = %term.year_label, "Term created");
    Ok((StatusCode::CREATED, Json(term)))
}

/// GET /api/terms/:id
pub async fn get_term(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Term>> {
    Ok(Json(db::terms::require_term(&state.db, id).await?))
}

/// PUT /api/terms/:id
pub async fn update_term(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TermRequest>,
) -> ApiResult<Json<Term>> {
    let mut term = db::terms::require_term(&state.db, id).await?;
    apply(&state, &mut term, request).await?;
    term.updated_at = cipa_common::time::now();
    db::terms::save_term(&state.db, &term).await?;
    Ok(Json(term))
}

/// DELETE /api/terms/:id
///
/// Removes the term with its members, meetings, candidates and hand-offs.
/// Signature files no other candidacy references are deleted too.
pub async fn delete_term(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let candidates = db::candidates::list_by_term(&state.db, id).await?;
    if !db::terms::delete_term(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("Term {}", id)));
    }
    for candidate in &candidates {
        state.pollers.cancel(candidate.id).await;
    }

    let urls: BTreeSet<&str> = candidates
        .iter()
        .filter_map(|c| c.signature_url.as_deref())
        .collect();
    for url in urls {
        approval::release_signature(&state, url).await?;
    }

    info!(term_id = %id, candidates = candidates.len(), "Term deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/terms/:id/status
///
/// ELECTION → ACTIVE → FINISHED; anything else is 422.
pub async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Json<Term>> {
    let mut term = db::terms::require_term(&state.db, id).await?;
    let old_status = term.status;
    let new_status = old_status.transition(request.status)?;
    if new_status == old_status {
        return Ok(Json(term));
    }

    let now = cipa_common::time::now();
    db::terms::update_status(&state.db, id, new_status, now).await?;
    term.status = new_status;
    term.updated_at = now;

    info!(term_id = %id, from = %old_status, to = %new_status, "Term status changed");
    state.event_bus.emit_lossy(CipaEvent::TermStatusChanged {
        term_id: id,
        old_status,
        new_status,
        timestamp: now,
    });

    Ok(Json(term))
}

/// Build term routes
pub fn term_routes() -> Router<AppState> {
    Router::new()
        .route("/api/branches/:id/terms", get(list_terms).post(create_term))
        .route(
            "/api/terms/:id",
            get(get_term).put(update_term).delete(delete_term),
        )
        .route("/api/terms/:id/status", post(change_status))
}
