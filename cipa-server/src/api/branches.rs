//! Branch and collaborator read models
//!
//! Company administration lives outside this service; these endpoints only
//! hold the identity data CIPA needs (CNAE, headcount, names, logo).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use cipa_common::models::{Branch, Collaborator};
use cipa_common::nr5::{self, Dimensioning};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{db, ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateBranchRequest {
    pub company_name: String,
    pub branch_name: String,
    pub cnpj: String,
    pub cnae: String,
    #[serde(default)]
    pub city: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCollaboratorRequest {
    pub name: String,
    pub job_title: Option<String>,
    pub email: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

fn required(value: &str, field: &str) -> ApiResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// GET /api/branches
pub async fn list_branches(State(state): State<AppState>) -> ApiResult<Json<Vec<Branch>>> {
    Ok(Json(db::branches::list_branches(&state.db).await?))
}

/// POST /api/branches
pub async fn create_branch(
    State(state): State<AppState>,
    Json(request): Json<CreateBranchRequest>,
) -> ApiResult<(StatusCode, Json<Branch>)> {
    let branch = Branch {
        id: Uuid::new_v4(),
        company_name: required(&request.company_name, "company_name")?,
        branch_name: required(&request.branch_name, "branch_name")?,
        cnpj: required(&request.cnpj, "cnpj")?,
        cnae: required(&request.cnae, "cnae")?,
        city: request.city.trim().to_string(),
        logo_url: request.logo_url.filter(|u| !u.trim().is_empty()),
    };
    db::branches::insert_branch(&state.db, &branch).await?;

    info!(branch_id = %branch.id, cnae = %branch.cnae, "Branch created");
    Ok((StatusCode::CREATED, Json(branch)))
}

/// GET /api/branches/:id
pub async fn get_branch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Branch>> {
    Ok(Json(db::branches::require_branch(&state.db, id).await?))
}

/// GET /api/branches/:id/collaborators
pub async fn list_collaborators(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Collaborator>>> {
    db::branches::require_branch(&state.db, id).await?;
    Ok(Json(db::collaborators::list_by_branch(&state.db, id).await?))
}

/// POST /api/branches/:id/collaborators
pub async fn create_collaborator(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateCollaboratorRequest>,
) -> ApiResult<(StatusCode, Json<Collaborator>)> {
    db::branches::require_branch(&state.db, id).await?;

    let collaborator = Collaborator {
        id: Uuid::new_v4(),
        branch_id: id,
        name: required(&request.name, "name")?,
        job_title: request.job_title.filter(|t| !t.trim().is_empty()),
        email: request.email.filter(|e| !e.trim().is_empty()),
        active: request.active,
    };
    db::collaborators::insert_collaborator(&state.db, &collaborator).await?;

    Ok((StatusCode::CREATED, Json(collaborator)))
}

/// GET /api/branches/:id/dimensioning
///
/// Committee size for the branch's CNAE and current active headcount.
pub async fn branch_dimensioning(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Dimensioning>> {
    let branch = db::branches::require_branch(&state.db, id).await?;
    let employees = db::collaborators::count_active(&state.db, id).await?;
    Ok(Json(nr5::dimension(&branch.cnae, employees)))
}

/// Build branch routes
pub fn branch_routes() -> Router<AppState> {
    Router::new()
        .route("/api/branches", get(list_branches).post(create_branch))
        .route("/api/branches/:id", get(get_branch))
        .route(
            "/api/branches/:id/collaborators",
            get(list_collaborators).post(create_collaborator),
        )
        .route("/api/branches/:id/dimensioning", get(branch_dimensioning))
}
