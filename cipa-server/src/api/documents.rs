//! Document download endpoints
//!
//! Gathers a [`DocumentContext`] from the database and hands it to the pure
//! renderers in `cipa_common::documents`. A missing field or a locked
//! milestone answers 422 and no file is produced.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use cipa_common::documents::{
    self, ActionPlanEntry, CandidateEntry, DocumentAvailability, DocumentContext, DocumentKind,
    Logo, RenderedDocument, RosterEntry, DOCX_MIME,
};
use cipa_common::models::{Branch, Term};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{db, ApiResult, AppState};

/// Branch logo for the letterhead; documents render without one on any failure
async fn fetch_logo(state: &AppState, branch: &Branch) -> Option<Logo> {
    let url = branch.logo_url.as_deref()?;
    match state.images.fetch(url).await {
        Ok(image) => {
            let logo = Logo::from_bytes(image.bytes);
            if logo.is_none() {
                warn!(branch_id = %branch.id, "Logo is neither PNG nor JPEG, skipping");
            }
            logo
        }
        Err(e) => {
            warn!(branch_id = %branch.id, "Failed to fetch logo: {}", e);
            None
        }
    }
}

async fn build_context(state: &AppState, term: Term) -> ApiResult<DocumentContext> {
    let branch = db::branches::require_branch(&state.db, term.branch_id).await?;
    let members = db::members::list_by_term(&state.db, term.id).await?;
    let candidates = db::candidates::list_by_term(&state.db, term.id).await?;

    let mut ids: Vec<Uuid> = members
        .iter()
        .map(|m| m.collaborator_id)
        .chain(candidates.iter().map(|c| c.collaborator_id))
        .collect();
    ids.extend(term.employer_representative_id);
    ids.extend(term.president_id);
    let collaborators = db::collaborators::load_many(&state.db, &ids).await?;
    let name_of = |id: Uuid| collaborators.get(&id).map(|c| c.name.clone());

    let members = members
        .iter()
        .map(|m| RosterEntry {
            name: name_of(m.collaborator_id).unwrap_or_default(),
            job_title: collaborators
                .get(&m.collaborator_id)
                .and_then(|c| c.job_title.clone()),
            role: m.role,
            origin: m.origin,
            votes: m.votes,
        })
        .collect();
    let candidates = candidates
        .iter()
        .map(|c| CandidateEntry {
            name: name_of(c.collaborator_id).unwrap_or_default(),
            job_title: collaborators
                .get(&c.collaborator_id)
                .and_then(|col| col.job_title.clone()),
            status: c.status,
            registered_at: c.registered_at,
        })
        .collect();

    let employer_representative = term.employer_representative_id.and_then(name_of);
    let president = term.president_id.and_then(name_of);
    let logo = fetch_logo(state, &branch).await;

    Ok(DocumentContext {
        branch,
        term,
        members,
        candidates,
        employer_representative,
        president,
        logo,
    })
}

fn docx_response(document: RenderedDocument) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, DOCX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", document.file_name),
            ),
        ],
        document.bytes,
    )
}

/// GET /api/terms/:id/documents
pub async fn list_documents(
    State(state): State<AppState>,
    Path(term_id): Path<Uuid>,
) -> ApiResult<Json<Vec<DocumentAvailability>>> {
    let term = db::terms::require_term(&state.db, term_id).await?;
    let progress = db::milestones::load_progress(&state.db, term_id).await?;
    Ok(Json(documents::availability(&term, &progress)))
}

/// GET /api/terms/:id/documents/:kind
pub async fn download_document(
    State(state): State<AppState>,
    Path((term_id, kind)): Path<(Uuid, String)>,
) -> ApiResult<impl IntoResponse> {
    let kind: DocumentKind = kind.parse()?;
    let term = db::terms::require_term(&state.db, term_id).await?;
    let progress = db::milestones::load_progress(&state.db, term_id).await?;
    let context = build_context(&state, term).await?;

    let document = documents::render(kind, &context, &progress)?;
    info!(term_id = %term_id, kind = %kind, size = document.bytes.len(), "Document generated");
    Ok(docx_response(document))
}

/// GET /api/meetings/:id/minutes
pub async fn meeting_minutes(
    State(state): State<AppState>,
    Path(meeting_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let meeting = db::meetings::require_meeting(&state.db, meeting_id).await?;
    let term = db::terms::require_term(&state.db, meeting.term_id).await?;
    let plans = db::action_plans::list_by_meeting(&state.db, meeting_id).await?;

    let responsible_ids: Vec<Uuid> = plans.iter().filter_map(|p| p.responsible_id).collect();
    let responsible = db::collaborators::load_many(&state.db, &responsible_ids).await?;
    let plans: Vec<ActionPlanEntry> = plans
        .into_iter()
        .map(|plan| ActionPlanEntry {
            responsible_name: plan
                .responsible_id
                .and_then(|id| responsible.get(&id))
                .map(|c| c.name.clone()),
            plan,
        })
        .collect();

    let context = build_context(&state, term).await?;
    let document = documents::render_meeting_minutes(&context, &meeting, &plans)?;
    info!(meeting_id = %meeting_id, "Meeting minutes generated");
    Ok(docx_response(document))
}

/// Build document routes
pub fn document_routes() -> Router<AppState> {
    Router::new()
        .route("/api/terms/:id/documents", get(list_documents))
        .route("/api/terms/:id/documents/:kind", get(download_document))
        .route("/api/meetings/:id/minutes", get(meeting_minutes))
}
