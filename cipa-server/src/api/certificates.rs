//! Medical certificate (atestado) endpoints
//!
//! Every response that shows a certificate also carries its accumulation
//! assessment, so the form can warn before and after saving.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use cipa_common::models::MedicalCertificate;
use cipa_common::sick_leave::{self, AbsenteeismSummary, CertificateDraft, RiskAssessment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{db, ApiError, ApiResult, AppState};

/// Longest leave a single certificate may grant
pub const MAX_CERTIFICATE_DAYS: i64 = 366;

#[derive(Debug, Deserialize)]
pub struct CertificateRequest {
    pub collaborator_id: Uuid,
    pub start_date: NaiveDate,
    pub days: i64,
    #[serde(default)]
    pub cid: String,
    #[serde(default)]
    pub reason: String,
}

impl CertificateRequest {
    fn validate(&self) -> ApiResult<()> {
        if !(1..=MAX_CERTIFICATE_DAYS).contains(&self.days) {
            return Err(ApiError::BadRequest(format!(
                "days must be between 1 and {}",
                MAX_CERTIFICATE_DAYS
            )));
        }
        Ok(())
    }

    fn draft(&self) -> CertificateDraft {
        CertificateDraft {
            id: None,
            collaborator_id: self.collaborator_id,
            start_date: self.start_date,
            days: self.days,
            cid: self.cid.trim().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CertificateView {
    #[serde(flatten)]
    pub certificate: MedicalCertificate,
    pub assessment: RiskAssessment,
}

#[derive(Debug, Serialize)]
pub struct AbsenteeismResponse {
    #[serde(flatten)]
    pub summary: AbsenteeismSummary,
    /// Names of the collaborators listed as at risk
    pub collaborator_names: HashMap<Uuid, String>,
}

/// POST /api/certificates/evaluate
///
/// Assess a draft against the stored history without saving it.
pub async fn evaluate_draft(
    State(state): State<AppState>,
    Json(request): Json<CertificateRequest>,
) -> ApiResult<Json<RiskAssessment>> {
    request.validate()?;
    db::collaborators::require_collaborator(&state.db, request.collaborator_id).await?;
    let history = db::certificates::list_by_collaborator(&state.db, request.collaborator_id).await?;
    Ok(Json(sick_leave::evaluate(&history, &request.draft())))
}

/// GET /api/collaborators/:id/certificates
pub async fn list_certificates(
    State(state): State<AppState>,
    Path(collaborator_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CertificateView>>> {
    db::collaborators::require_collaborator(&state.db, collaborator_id).await?;
    let history = db::certificates::list_by_collaborator(&state.db, collaborator_id).await?;

    let mut assessments: HashMap<Uuid, RiskAssessment> =
        sick_leave::evaluate_history(&history).into_iter().collect();
    let views = history
        .into_iter()
        .filter_map(|certificate| {
            assessments
                .remove(&certificate.id)
                .map(|assessment| CertificateView { certificate, assessment })
        })
        .collect();

    Ok(Json(views))
}

/// POST /api/certificates
pub async fn create_certificate(
    State(state): State<AppState>,
    Json(request): Json<CertificateRequest>,
) -> ApiResult<(StatusCode, Json<CertificateView>)> {
    request.validate()?;
    db::collaborators::require_collaborator(&state.db, request.collaborator_id).await?;

    let certificate = MedicalCertificate {
        id: Uuid::new_v4(),
        collaborator_id: request.collaborator_id,
        start_date: request.start_date,
        days: request.days,
        cid: request.cid.trim().to_string(),
        reason: request.reason.trim().to_string(),
    };
    db::certificates::insert_certificate(&state.db, &certificate).await?;

    let history = db::certificates::list_by_collaborator(&state.db, certificate.collaborator_id).await?;
    let assessment = sick_leave::evaluate(&history, &CertificateDraft::from(&certificate));
    if assessment.is_at_risk {
        warn!(
            collaborator_id = %certificate.collaborator_id,
            total = assessment.total,
            family = ?assessment.cid_family,
            "Certificate pushes collaborator over the accumulation threshold"
        );
    } else {
        info!(certificate_id = %certificate.id, "Certificate recorded");
    }

    Ok((StatusCode::CREATED, Json(CertificateView { certificate, assessment })))
}

/// DELETE /api/certificates/:id
pub async fn delete_certificate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !db::certificates::delete_certificate(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("Certificate {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/branches/:id/absenteeism
pub async fn branch_absenteeism(
    State(state): State<AppState>,
    Path(branch_id): Path<Uuid>,
) -> ApiResult<Json<AbsenteeismResponse>> {
    db::branches::require_branch(&state.db, branch_id).await?;
    let history = db::certificates::list_by_branch(&state.db, branch_id).await?;
    let summary = sick_leave::summarize(&history);

    let ids: Vec<Uuid> = summary
        .at_risk_collaborators
        .iter()
        .map(|c| c.collaborator_id)
        .collect();
    let collaborator_names = db::collaborators::load_many(&state.db, &ids)
        .await?
        .into_iter()
        .map(|(id, c)| (id, c.name))
        .collect();

    Ok(Json(AbsenteeismResponse {
        summary,
        collaborator_names,
    }))
}

/// Build certificate routes
pub fn certificate_routes() -> Router<AppState> {
    Router::new()
        .route("/api/certificates", post(create_certificate))
        .route("/api/certificates/evaluate", post(evaluate_draft))
        .route("/api/certificates/:id", delete(delete_certificate))
        .route("/api/collaborators/:id/certificates", get(list_certificates))
        .route("/api/branches/:id/absenteeism", get(branch_absenteeism))
}
