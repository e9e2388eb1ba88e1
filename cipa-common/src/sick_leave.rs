//! Sick-leave accumulation risk
//!
//! Certificates of one collaborator are grouped by diagnosis family (first
//! character of the CID code, case-insensitive). Looking back 60 calendar days
//! from a certificate's start date, a family total of 15 days or more flags a
//! likely referral to social-security leave. A general total of 15 or more
//! across families without a family hit is advisory only.
//!
//! All comparisons use [`NaiveDate`] differences: a certificate dated exactly
//! 60 days earlier is inside the window, 61 days earlier is outside.

use crate::models::MedicalCertificate;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Look-back window, inclusive on both ends
pub const WINDOW_DAYS: i64 = 60;

/// Accumulated days that trigger the risk flag
pub const RISK_THRESHOLD_DAYS: i64 = 15;

/// Certificate under evaluation; `id` is `None` for a draft not yet stored
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateDraft {
    pub id: Option<Uuid>,
    pub collaborator_id: Uuid,
    pub start_date: NaiveDate,
    pub days: i64,
    pub cid: String,
}

impl From<&MedicalCertificate> for CertificateDraft {
    fn from(cert: &MedicalCertificate) -> Self {
        Self {
            id: Some(cert.id),
            collaborator_id: cert.collaborator_id,
            start_date: cert.start_date,
            days: cert.days,
            cid: cert.cid.clone(),
        }
    }
}

/// Evaluation result for one certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    /// Same-family days in the window, including the evaluated certificate
    pub total: i64,
    /// Days of every family in the window, including the evaluated certificate
    pub total_general: i64,
    pub is_at_risk: bool,
    pub is_high_frequency: bool,
    /// Same-family days from history only
    pub previous_days: i64,
    /// Upper-cased first character of the CID, `None` for a blank code
    pub cid_family: Option<char>,
}

/// Diagnosis family: first non-blank character, upper-cased
pub fn cid_family(cid: &str) -> Option<char> {
    cid.trim()
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase())
}

/// `other` counts towards `draft` when it belongs to the same collaborator,
/// is a different record and starts 0..=60 days before the draft
fn in_window(draft: &CertificateDraft, other: &MedicalCertificate) -> bool {
    if other.collaborator_id != draft.collaborator_id {
        return false;
    }
    if draft.id == Some(other.id) {
        return false;
    }
    let diff = crate::time::days_between(other.start_date, draft.start_date);
    (0..=WINDOW_DAYS).contains(&diff)
}

/// Evaluate one certificate (stored or draft) against the full history
pub fn evaluate(history: &[MedicalCertificate], draft: &CertificateDraft) -> RiskAssessment {
    let family = cid_family(&draft.cid);

    let mut previous_days: i64 = 0;
    let mut previous_general: i64 = 0;
    for other in history.iter().filter(|c| in_window(draft, c)) {
        previous_general = previous_general.saturating_add(other.days);
        if family.is_some() && cid_family(&other.cid) == family {
            previous_days = previous_days.saturating_add(other.days);
        }
    }

    let total = previous_days.saturating_add(draft.days);
    let total_general = previous_general.saturating_add(draft.days);
    let is_at_risk = total >= RISK_THRESHOLD_DAYS;
    let is_high_frequency = !is_at_risk && total_general >= RISK_THRESHOLD_DAYS;

    RiskAssessment {
        total,
        total_general,
        is_at_risk,
        is_high_frequency,
        previous_days,
        cid_family: family,
    }
}

/// Evaluate every stored certificate against the rest of the history
pub fn evaluate_history(history: &[MedicalCertificate]) -> Vec<(Uuid, RiskAssessment)> {
    history
        .iter()
        .map(|cert| (cert.id, evaluate(history, &CertificateDraft::from(cert))))
        .collect()
}

/// Collaborator flagged by at least one at-risk certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AtRiskCollaborator {
    pub collaborator_id: Uuid,
    /// Highest same-family total observed
    pub worst_total: i64,
    pub cid_family: Option<char>,
    /// Start date of the certificate that produced `worst_total`
    pub latest_start: NaiveDate,
}

/// Dashboard aggregate over the certificate history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbsenteeismSummary {
    pub certificates: usize,
    pub total_days: i64,
    pub at_risk_certificates: usize,
    pub high_frequency_certificates: usize,
    pub at_risk_collaborators: Vec<AtRiskCollaborator>,
}

/// Aggregate counts and the at-risk collaborator list
pub fn summarize(history: &[MedicalCertificate]) -> AbsenteeismSummary {
    let assessments = evaluate_history(history);
    let by_id: HashMap<Uuid, &MedicalCertificate> = history.iter().map(|c| (c.id, c)).collect();

    let mut worst: HashMap<Uuid, AtRiskCollaborator> = HashMap::new();
    for (id, assessment) in assessments.iter().filter(|(_, a)| a.is_at_risk) {
        let Some(cert) = by_id.get(id) else { continue };
        let candidate = AtRiskCollaborator {
            collaborator_id: cert.collaborator_id,
            worst_total: assessment.total,
            cid_family: assessment.cid_family,
            latest_start: cert.start_date,
        };
        worst
            .entry(cert.collaborator_id)
            .and_modify(|current| {
                if (candidate.worst_total, candidate.latest_start)
                    > (current.worst_total, current.latest_start)
                {
                    *current = candidate.clone();
                }
            })
            .or_insert(candidate);
    }

    let mut at_risk_collaborators: Vec<_> = worst.into_values().collect();
    at_risk_collaborators.sort_by(|a, b| {
        b.worst_total
            .cmp(&a.worst_total)
            .then(a.collaborator_id.cmp(&b.collaborator_id))
    });

    AbsenteeismSummary {
        certificates: history.len(),
        total_days: history.iter().map(|c| c.days).fold(0, i64::saturating_add),
        at_risk_certificates: assessments.iter().filter(|(_, a)| a.is_at_risk).count(),
        high_frequency_certificates: assessments
            .iter()
            .filter(|(_, a)| a.is_high_frequency)
            .count(),
        at_risk_collaborators,
    }
}
