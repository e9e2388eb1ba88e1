//! Candidate registration and approval
//!
//! Both completion paths (signature drawn at registration, signature attached
//! later through a hand-off or in person) end in [`finalize_approval`], which
//! runs only for the caller whose write actually produced APPROVED.

use cipa_common::candidacy::{self, AttachOutcome, CandidacyError, Registration};
use cipa_common::events::CipaEvent;
use cipa_common::models::{Candidate, CandidateStatus, HandoffStatus};
use tracing::{info, warn};
use uuid::Uuid;

use super::signature_store::StoredSignature;
use crate::{db, ApiError, ApiResult, AppState};

/// Signature supplied with a registration or attach request
#[derive(Debug, Clone)]
pub enum SignatureInput {
    /// Reference returned earlier by the upload endpoint
    Url(String),
    /// Inline `data:image/png;base64,...`
    DataUrl(String),
    /// Raw bytes from a multipart upload
    Bytes(Vec<u8>),
}

/// Artifact resolved for one request; `stored` is set when this request wrote it
struct ResolvedSignature {
    url: String,
    stored: Option<StoredSignature>,
}

async fn resolve(state: &AppState, input: SignatureInput) -> ApiResult<ResolvedSignature> {
    let stored = match input {
        SignatureInput::Url(url) => {
            let url = url.trim().to_string();
            if !state.signatures.contains_url(&url).await {
                return Err(ApiError::BadRequest(format!("Unknown signature reference: {}", url)));
            }
            return Ok(ResolvedSignature { url, stored: None });
        }
        SignatureInput::DataUrl(data_url) => state.signatures.store_data_url(&data_url).await?,
        SignatureInput::Bytes(bytes) => state.signatures.store(&bytes).await?,
    };
    Ok(ResolvedSignature {
        url: stored.url.clone(),
        stored: Some(stored),
    })
}

async fn rollback(state: &AppState, resolved: &ResolvedSignature) {
    let Some(stored) = resolved.stored.as_ref().filter(|s| s.created) else {
        return;
    };
    // Content addressing: a concurrent request may already reference the same file
    match db::candidates::signature_in_use(&state.db, &stored.url).await {
        Ok(false) => state.signatures.discard(stored).await,
        Ok(true) => info!(file = %stored.name, "Signature kept, another candidacy references it"),
        Err(e) => warn!(file = %stored.name, "Keeping signature, reference check failed: {}", e),
    }
}

/// Remove a signature file once no candidacy references it
pub async fn release_signature(state: &AppState, url: &str) -> ApiResult<()> {
    if !db::candidates::signature_in_use(&state.db, url).await? {
        state.signatures.remove_url(url).await;
    }
    Ok(())
}

/// UNREGISTERED → PENDING_SIGNATURE | APPROVED
///
/// The artifact is stored before the record is inserted and removed again if
/// the insert fails.
pub async fn register_candidate(
    state: &AppState,
    term_id: Uuid,
    collaborator_id: Uuid,
    signature: Option<SignatureInput>,
) -> ApiResult<Candidate> {
    let term = db::terms::require_term(&state.db, term_id).await?;
    let collaborator = db::collaborators::require_collaborator(&state.db, collaborator_id).await?;
    if collaborator.branch_id != term.branch_id {
        return Err(ApiError::BadRequest(
            "Collaborator does not belong to the term's branch".to_string(),
        ));
    }

    let existing = db::candidates::find_by_collaborator(&state.db, term_id, collaborator_id).await?;
    if let Some(existing) = existing {
        info!(candidate_id = %existing.id, "Duplicate candidacy rejected");
        return Err(CandidacyError::DuplicateCandidacy {
            existing: Box::new(existing),
        }
        .into());
    }

    let resolved = match signature {
        Some(input) => Some(resolve(state, input).await?),
        None => None,
    };

    let request = Registration {
        term_id,
        collaborator_id,
        signature_url: resolved.as_ref().map(|r| r.url.clone()),
    };
    let candidate = match candidacy::register(None, request, cipa_common::time::now()) {
        Ok(candidate) => candidate,
        Err(e) => {
            if let Some(resolved) = &resolved {
                rollback(state, resolved).await;
            }
            return Err(e.into());
        }
    };

    if let Err(e) = db::candidates::insert_candidate(&state.db, &candidate).await {
        if let Some(resolved) = &resolved {
            rollback(state, resolved).await;
        }
        // Lost a race against a concurrent registration of the same pair
        if let Some(existing) =
            db::candidates::find_by_collaborator(&state.db, term_id, collaborator_id).await?
        {
            return Err(CandidacyError::DuplicateCandidacy {
                existing: Box::new(existing),
            }
            .into());
        }
        return Err(e.into());
    }

    info!(
        candidate_id = %candidate.id,
        term_id = %term_id,
        status = %candidate.status,
        "Candidate registered"
    );
    state.event_bus.emit_lossy(CipaEvent::CandidateRegistered {
        candidate_id: candidate.id,
        term_id,
        status: candidate.status,
        timestamp: candidate.registered_at,
    });

    if candidate.status == CandidateStatus::Approved {
        finalize_approval(state, &candidate).await;
    }

    Ok(candidate)
}

/// PENDING_SIGNATURE → APPROVED
///
/// Re-attaching the same artifact is a no-op; a different artifact on an
/// approved candidacy is a conflict.
pub async fn attach_signature(
    state: &AppState,
    candidate_id: Uuid,
    signature: SignatureInput,
) -> ApiResult<AttachOutcome> {
    let candidate = db::candidates::require_candidate(&state.db, candidate_id).await?;
    // Reject before writing anything when the outcome is already known
    if candidate.status == CandidateStatus::Approved {
        if let SignatureInput::Url(url) = &signature {
            return Ok(candidacy::attach_signature(&candidate, url)?);
        }
    }

    let resolved = resolve(state, signature).await?;
    match apply_signature(state, candidate, &resolved.url).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            rollback(state, &resolved).await;
            Err(e)
        }
    }
}

async fn apply_signature(
    state: &AppState,
    candidate: Candidate,
    signature_url: &str,
) -> ApiResult<AttachOutcome> {
    match candidacy::attach_signature(&candidate, signature_url)? {
        AttachOutcome::Transitioned(approved) => {
            if db::candidates::approve_if_pending(&state.db, approved.id, signature_url).await? {
                info!(candidate_id = %approved.id, "Candidate approved");
                finalize_approval(state, &approved).await;
                Ok(AttachOutcome::Transitioned(approved))
            } else {
                // Another request approved it first; judge against the stored row
                let current = db::candidates::require_candidate(&state.db, approved.id).await?;
                Ok(candidacy::attach_signature(&current, signature_url)?)
            }
        }
        already @ AttachOutcome::AlreadyApplied(_) => Ok(already),
    }
}

/// Side effects of the transition: confirmation, event, hand-off closure
async fn finalize_approval(state: &AppState, candidate: &Candidate) {
    let collaborator = match db::collaborators::load_collaborator(&state.db, candidate.collaborator_id).await {
        Ok(collaborator) => collaborator,
        Err(e) => {
            warn!(candidate_id = %candidate.id, "Failed to load collaborator for confirmation: {}", e);
            None
        }
    };

    if let Err(e) = state
        .notifier
        .candidate_approved(candidate, collaborator.as_ref())
        .await
    {
        warn!(candidate_id = %candidate.id, "Confirmation dispatch failed: {}", e);
    }

    if let Err(e) =
        db::handoffs::close_open_for_candidate(&state.db, candidate.id, HandoffStatus::Completed).await
    {
        warn!(candidate_id = %candidate.id, "Failed to close hand-off sessions: {}", e);
    }

    state.event_bus.emit_lossy(CipaEvent::CandidateApproved {
        candidate_id: candidate.id,
        term_id: candidate.term_id,
        signature_url: candidate.signature_url.clone().unwrap_or_default(),
        timestamp: cipa_common::time::now(),
    });
}
