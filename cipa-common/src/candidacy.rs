//! Candidate registration and signature state machine
//!
//! ```text
//! UNREGISTERED ──register(signature)──▶ APPROVED
//!      │
//!      └──register()──▶ PENDING_SIGNATURE ──attach_signature──▶ APPROVED
//! ```
//!
//! A (term, collaborator) pair registers at most once. `APPROVED` holds exactly
//! when a signature reference is present. Attaching the same reference twice is
//! a no-op; attaching a different one to an approved candidacy is rejected.

use crate::models::{Candidate, CandidateStatus, HandoffSession, HandoffStatus};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Candidacy lifecycle including the implicit "no record" state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidacyState {
    Unregistered,
    PendingSignature,
    Approved,
}

impl CandidacyState {
    pub fn of(candidate: Option<&Candidate>) -> Self {
        match candidate.map(|c| c.status) {
            None => CandidacyState::Unregistered,
            Some(CandidateStatus::PendingSignature) => CandidacyState::PendingSignature,
            Some(CandidateStatus::Approved) => CandidacyState::Approved,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandidacyError {
    /// The pair already has a record; carries it so the caller can resume
    #[error("Collaborator is already registered for this election (candidate {})", .existing.id)]
    DuplicateCandidacy { existing: Box<Candidate> },

    #[error("Candidate {candidate_id} is already signed with a different signature")]
    SignatureConflict { candidate_id: Uuid },

    #[error("Candidate {candidate_id} is already approved")]
    AlreadyApproved { candidate_id: Uuid },

    #[error("Signature reference is empty")]
    EmptySignature,
}

/// Status implied by the presence of a signature reference
pub fn status_for(signature_url: Option<&str>) -> CandidateStatus {
    match signature_url {
        Some(_) => CandidateStatus::Approved,
        None => CandidateStatus::PendingSignature,
    }
}

/// Registration request
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub term_id: Uuid,
    pub collaborator_id: Uuid,
    pub signature_url: Option<String>,
}

/// UNREGISTERED → PENDING_SIGNATURE | APPROVED
///
/// `existing` is the stored record for the same pair, if any.
pub fn register(
    existing: Option<&Candidate>,
    request: Registration,
    now: DateTime<Utc>,
) -> Result<Candidate, CandidacyError> {
    if let Some(existing) = existing {
        return Err(CandidacyError::DuplicateCandidacy {
            existing: Box::new(existing.clone()),
        });
    }

    let signature_url = match request.signature_url {
        Some(url) if url.trim().is_empty() => return Err(CandidacyError::EmptySignature),
        other => other,
    };

    Ok(Candidate {
        id: Uuid::new_v4(),
        term_id: request.term_id,
        collaborator_id: request.collaborator_id,
        registered_at: now,
        status: status_for(signature_url.as_deref()),
        signature_url,
    })
}

/// Result of attaching a signature
#[derive(Debug, Clone, PartialEq)]
pub enum AttachOutcome {
    /// PENDING_SIGNATURE → APPROVED happened; notify once
    Transitioned(Candidate),
    /// Already approved with the same signature; nothing to do
    AlreadyApplied(Candidate),
}

impl AttachOutcome {
    pub fn candidate(&self) -> &Candidate {
        match self {
            AttachOutcome::Transitioned(c) | AttachOutcome::AlreadyApplied(c) => c,
        }
    }

    pub fn transitioned(&self) -> bool {
        matches!(self, AttachOutcome::Transitioned(_))
    }
}

/// PENDING_SIGNATURE → APPROVED
pub fn attach_signature(
    candidate: &Candidate,
    signature_url: &str,
) -> Result<AttachOutcome, CandidacyError> {
    if signature_url.trim().is_empty() {
        return Err(CandidacyError::EmptySignature);
    }

    match (&candidate.status, candidate.signature_url.as_deref()) {
        (CandidateStatus::Approved, Some(current)) if current == signature_url => {
            Ok(AttachOutcome::AlreadyApplied(candidate.clone()))
        }
        (CandidateStatus::Approved, _) => Err(CandidacyError::SignatureConflict {
            candidate_id: candidate.id,
        }),
        (CandidateStatus::PendingSignature, _) => {
            let mut approved = candidate.clone();
            approved.signature_url = Some(signature_url.to_string());
            approved.status = CandidateStatus::Approved;
            Ok(AttachOutcome::Transitioned(approved))
        }
    }
}

/// Open a remote-signing session for a pending candidate
pub fn open_handoff(
    candidate: &Candidate,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<HandoffSession, CandidacyError> {
    if candidate.status == CandidateStatus::Approved {
        return Err(CandidacyError::AlreadyApproved {
            candidate_id: candidate.id,
        });
    }

    Ok(HandoffSession {
        token: Uuid::new_v4(),
        candidate_id: candidate.id,
        status: HandoffStatus::Open,
        created_at: now,
        expires_at: now + ttl,
    })
}
