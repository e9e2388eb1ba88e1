//! Image proxy for branch logos

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: String,
}

/// GET /api/proxy/image?url=https://...
///
/// **Errors:**
/// - 400 for a non-http(s) URL
/// - 502 when the upstream fails or does not return an image
pub async fn proxy_image(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
) -> ApiResult<impl IntoResponse> {
    let image = state.images.fetch(&query.url).await?;
    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
        ],
        image.bytes,
    ))
}

/// Build proxy routes
pub fn proxy_routes() -> Router<AppState> {
    Router::new().route("/api/proxy/image", get(proxy_image))
}
