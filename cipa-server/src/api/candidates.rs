//! Candidate registration, signature and remote hand-off endpoints
//!
//! A candidacy is created in person (optionally signed on the spot) or left
//! PENDING_SIGNATURE and handed off to a second device. The registering
//! client follows completion through `/status` polling or the `/events`
//! stream.

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    response::sse::{Event, Sse},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use cipa_common::candidacy::{self, CandidacyState};
use cipa_common::events::CipaEvent;
use cipa_common::models::{Candidate, CandidateStatus, HandoffStatus};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::info;
use uuid::Uuid;

use super::signatures::signature_from_request;
use crate::services::{approval, spawn_handoff_watch, SignatureInput};
use crate::{db, ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub collaborator_id: Uuid,
    /// Signature drawn in person, as a data URL
    pub data_url: Option<String>,
    /// Signature uploaded earlier through `POST /api/signatures`
    pub signature_url: Option<String>,
}

/// Candidate with the collaborator's display data
#[derive(Debug, Serialize)]
pub struct CandidateView {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub collaborator_name: Option<String>,
    pub job_title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub candidate_id: Uuid,
    pub status: CandidateStatus,
    pub state: CandidacyState,
    pub signature_url: Option<String>,
    /// A hand-off is open and being watched
    pub awaiting_remote_signature: bool,
}

#[derive(Debug, Serialize)]
pub struct AttachResponse {
    pub candidate: Candidate,
    /// False when the same signature had already been applied
    pub transitioned: bool,
}

#[derive(Debug, Serialize)]
pub struct HandoffResponse {
    pub token: Uuid,
    pub candidate_id: Uuid,
    /// Link rendered as a QR code for the signing device
    pub signing_url: String,
    pub status_url: String,
    pub events_url: String,
    pub expires_at: DateTime<Utc>,
}

/// GET /api/terms/:id/candidates
pub async fn list_candidates(
    State(state): State<AppState>,
    Path(term_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CandidateView>>> {
    db::terms::require_term(&state.db, term_id).await?;
    let candidates = db::candidates::list_by_term(&state.db, term_id).await?;
    let ids: Vec<Uuid> = candidates.iter().map(|c| c.collaborator_id).collect();
    let collaborators = db::collaborators::load_many(&state.db, &ids).await?;

    let views = candidates
        .into_iter()
        .map(|candidate| {
            let collaborator = collaborators.get(&candidate.collaborator_id);
            CandidateView {
                collaborator_name: collaborator.map(|c| c.name.clone()),
                job_title: collaborator.and_then(|c| c.job_title.clone()),
                candidate,
            }
        })
        .collect();

    Ok(Json(views))
}

/// POST /api/terms/:id/candidates
///
/// **Errors:**
/// - 409 DUPLICATE_CANDIDACY with the existing record under `existing`
/// - 400 for an unusable signature (nothing is created)
pub async fn register_candidate(
    State(state): State<AppState>,
    Path(term_id): Path<Uuid>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Candidate>)> {
    let signature = match (request.data_url, request.signature_url) {
        (Some(data_url), _) => Some(SignatureInput::DataUrl(data_url)),
        (None, Some(url)) => Some(SignatureInput::Url(url)),
        (None, None) => None,
    };

    let candidate =
        approval::register_candidate(&state, term_id, request.collaborator_id, signature).await?;
    Ok((StatusCode::CREATED, Json(candidate)))
}

/// DELETE /api/candidates/:id
pub async fn delete_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let candidate = db::candidates::require_candidate(&state.db, id).await?;
    state.pollers.cancel(id).await;
    db::candidates::delete_candidate(&state.db, id).await?;

    if let Some(url) = &candidate.signature_url {
        approval::release_signature(&state, url).await?;
    }

    info!(candidate_id = %id, term_id = %candidate.term_id, "Candidate removed");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/candidates/:id/status
pub async fn candidate_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StatusResponse>> {
    let candidate = db::candidates::require_candidate(&state.db, id).await?;
    Ok(Json(StatusResponse {
        candidate_id: candidate.id,
        status: candidate.status,
        state: CandidacyState::of(Some(&candidate)),
        awaiting_remote_signature: state.pollers.is_active(id).await,
        signature_url: candidate.signature_url,
    }))
}

/// POST /api/candidates/:id/signature
///
/// In-person signature for a pending candidacy. Accepts JSON
/// (`data_url` or `signature_url`) or multipart (`signature` field).
pub async fn attach_signature(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Request,
) -> ApiResult<Json<AttachResponse>> {
    let input = signature_from_request(request, true).await?;
    let outcome = approval::attach_signature(&state, id, input).await?;
    Ok(Json(AttachResponse {
        transitioned: outcome.transitioned(),
        candidate: outcome.candidate().clone(),
    }))
}

/// POST /api/candidates/:id/handoff
///
/// Opens a remote-signing session and starts watching it. Any earlier open
/// session of the candidate is expired.
pub async fn open_handoff(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<HandoffResponse>)> {
    let candidate = db::candidates::require_candidate(&state.db, id).await?;
    let session = candidacy::open_handoff(
        &candidate,
        cipa_common::time::now(),
        state.config.handoff_ttl,
    )?;

    db::handoffs::close_open_for_candidate(&state.db, id, HandoffStatus::Expired).await?;
    db::handoffs::insert_session(&state.db, &session).await?;
    let _watch = spawn_handoff_watch(
        state.db.clone(),
        state.pollers.clone(),
        state.poller(),
        session.clone(),
    )
    .await;

    info!(
        candidate_id = %id,
        expires_at = %session.expires_at,
        "Remote signature hand-off opened"
    );

    Ok((
        StatusCode::CREATED,
        Json(HandoffResponse {
            token: session.token,
            candidate_id: id,
            signing_url: format!("{}/assinar/{}", state.config.public_base_url, session.token),
            status_url: format!("/api/candidates/{}/status", id),
            events_url: format!("/api/candidates/{}/events", id),
            expires_at: session.expires_at,
        }),
    ))
}

/// DELETE /api/candidates/:id/handoff
///
/// The operator gave up waiting; the signing link stops working.
pub async fn cancel_handoff(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    db::candidates::require_candidate(&state.db, id).await?;
    let cancelled = state.pollers.cancel(id).await;
    let closed =
        db::handoffs::close_open_for_candidate(&state.db, id, HandoffStatus::Expired).await?;

    if !cancelled && closed == 0 {
        return Err(ApiError::NotFound(format!(
            "No open hand-off for candidate {}",
            id
        )));
    }

    info!(candidate_id = %id, "Remote signature hand-off cancelled");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/candidates/:id/events
///
/// SSE stream of this candidate's events; ends after `CandidateApproved`.
pub async fn candidate_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    // Subscribe before the existence check so an approval in between is not lost
    let rx = state.event_bus.subscribe();
    db::candidates::require_candidate(&state.db, id).await?;

    Ok(cipa_common::sse::forward_events(
        rx,
        "candidate events",
        move |event| event.candidate_id() == Some(id),
        |event| matches!(event, CipaEvent::CandidateApproved { .. }),
    ))
}

/// Build candidate routes
pub fn candidate_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/terms/:id/candidates",
            get(list_candidates).post(register_candidate),
        )
        .route("/api/candidates/:id", delete(delete_candidate))
        .route("/api/candidates/:id/status", get(candidate_status))
        .route("/api/candidates/:id/signature", post(attach_signature))
        .route(
            "/api/candidates/:id/handoff",
            post(open_handoff).delete(cancel_handoff),
        )
        .route("/api/candidates/:id/events", get(candidate_events))
}
