//! Remote signing endpoints used by the secondary device
//!
//! The hand-off token in the URL is the only credential: anyone holding an
//! open, unexpired token can sign for that candidate. Sessions are single-use
//! and expire after the configured TTL.

use axum::{
    extract::{Path, Request, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use cipa_common::models::{CandidateStatus, HandoffSession, HandoffStatus};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::signatures::signature_from_request;
use crate::services::approval;
use crate::{db, ApiError, ApiResult, AppState};

/// What the signing page shows before the collaborator signs
#[derive(Debug, Serialize)]
pub struct SigningInfo {
    pub token: Uuid,
    pub candidate_id: Uuid,
    pub collaborator_name: String,
    pub branch_name: String,
    pub company_name: String,
    pub term_year_label: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SigningResult {
    pub candidate_id: Uuid,
    pub status: CandidateStatus,
    pub signature_url: Option<String>,
}

/// Load a session and reject it unless it can still be used
async fn usable_session(state: &AppState, token: Uuid) -> ApiResult<HandoffSession> {
    let session = db::handoffs::load_session(&state.db, token)
        .await?
        .ok_or_else(|| ApiError::NotFound("Signing link not found".to_string()))?;

    if !session.is_usable(cipa_common::time::now()) {
        let reason = match session.status {
            HandoffStatus::Completed => "This signing link has already been used",
            _ => "This signing link has expired",
        };
        return Err(ApiError::Gone(reason.to_string()));
    }
    Ok(session)
}

/// GET /api/sign/:token
pub async fn signing_info(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> ApiResult<Json<SigningInfo>> {
    let session = usable_session(&state, token).await?;
    let candidate = db::candidates::require_candidate(&state.db, session.candidate_id).await?;
    let collaborator =
        db::collaborators::require_collaborator(&state.db, candidate.collaborator_id).await?;
    let term = db::terms::require_term(&state.db, candidate.term_id).await?;
    let branch = db::branches::require_branch(&state.db, term.branch_id).await?;

    Ok(Json(SigningInfo {
        token,
        candidate_id: candidate.id,
        collaborator_name: collaborator.name,
        branch_name: branch.branch_name,
        company_name: branch.company_name,
        term_year_label: term.year_label,
        expires_at: session.expires_at,
    }))
}

/// POST /api/sign/:token
///
/// Accepts `{"data_url": "data:image/png;base64,..."}` or a multipart
/// `signature` file. Approves the candidacy and closes the session.
pub async fn submit_signature(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
    request: Request,
) -> ApiResult<Json<SigningResult>> {
    let session = usable_session(&state, token).await?;
    let input = signature_from_request(request, false).await?;

    let outcome = approval::attach_signature(&state, session.candidate_id, input).await?;
    db::handoffs::close_session(&state.db, token, HandoffStatus::Completed).await?;
    state.pollers.cancel(session.candidate_id).await;

    info!(candidate_id = %session.candidate_id, "Remote signature received");
    let candidate = outcome.candidate();
    Ok(Json(SigningResult {
        candidate_id: candidate.id,
        status: candidate.status,
        signature_url: candidate.signature_url.clone(),
    }))
}

/// Build remote signing routes
pub fn signing_routes() -> Router<AppState> {
    Router::new().route("/api/sign/:token", get(signing_info).post(submit_signature))
}
