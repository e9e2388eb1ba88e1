//! NR-5 dimensioning endpoints

use axum::{extract::Query, routing::get, Json, Router};
use cipa_common::nr5::{self, Dimensioning, Nr5Group, SeatBand, NR5_GROUPS};
use serde::{Deserialize, Serialize};

use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct DimensioningQuery {
    pub cnae: String,
    pub employees: u32,
}

/// Group row with its seat bands expanded
#[derive(Debug, Serialize)]
pub struct GroupView {
    #[serde(flatten)]
    pub group: &'static Nr5Group,
    pub seat_bands: &'static [SeatBand],
}

/// GET /api/nr5/dimensioning?cnae=4711-3/02&employees=45
pub async fn dimensioning(Query(query): Query<DimensioningQuery>) -> ApiResult<Json<Dimensioning>> {
    if query.cnae.trim().is_empty() {
        return Err(ApiError::BadRequest("cnae is required".to_string()));
    }
    Ok(Json(nr5::dimension(&query.cnae, query.employees)))
}

/// GET /api/nr5/groups
pub async fn list_groups() -> Json<Vec<GroupView>> {
    Json(
        NR5_GROUPS
            .iter()
            .map(|group| GroupView {
                group,
                seat_bands: group.bands.bands(),
            })
            .collect(),
    )
}

/// Build NR-5 routes
pub fn nr5_routes() -> Router<AppState> {
    Router::new()
        .route("/api/nr5/dimensioning", get(dimensioning))
        .route("/api/nr5/groups", get(list_groups))
}
