//! Signature upload and file serving
//!
//! Uploads accept either a JSON body carrying a `data:` URL or a multipart
//! form with a `signature` file field.

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::services::SignatureInput;
use crate::{ApiError, ApiResult, AppState};

/// JSON form of a signature submission
#[derive(Debug, Default, Deserialize)]
pub struct SignatureBody {
    /// `data:image/png;base64,...`
    pub data_url: Option<String>,
    /// Reference returned earlier by `POST /api/signatures`
    pub signature_url: Option<String>,
}

impl SignatureBody {
    /// Inline data wins over a reference; `allow_reference` is false where only
    /// fresh strokes make sense
    pub fn into_input(self, allow_reference: bool) -> ApiResult<SignatureInput> {
        match (self.data_url, self.signature_url) {
            (Some(data_url), _) => Ok(SignatureInput::DataUrl(data_url)),
            (None, Some(url)) if allow_reference => Ok(SignatureInput::Url(url)),
            _ => Err(ApiError::BadRequest(if allow_reference {
                "data_url or signature_url is required".to_string()
            } else {
                "data_url is required".to_string()
            })),
        }
    }
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

/// Read a signature from a JSON or multipart request body
pub(crate) async fn signature_from_request(
    request: Request,
    allow_reference: bool,
) -> ApiResult<SignatureInput> {
    if is_multipart(&request) {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?
        {
            if matches!(field.name(), Some("signature") | Some("file")) {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                return Ok(SignatureInput::Bytes(bytes.to_vec()));
            }
        }
        return Err(ApiError::BadRequest(
            "Multipart body has no 'signature' field".to_string(),
        ));
    }

    let Json(body) = Json::<SignatureBody>::from_request(request, &())
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
    body.into_input(allow_reference)
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub name: String,
}

/// POST /api/signatures
///
/// Stores the image and returns its durable reference. Identical images map
/// to the same reference.
pub async fn upload_signature(
    State(state): State<AppState>,
    request: Request,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let stored = match signature_from_request(request, false).await? {
        SignatureInput::DataUrl(data_url) => state.signatures.store_data_url(&data_url).await?,
        SignatureInput::Bytes(bytes) => state.signatures.store(&bytes).await?,
        SignatureInput::Url(_) => {
            return Err(ApiError::BadRequest("data_url is required".to_string()))
        }
    };

    let status = if stored.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(UploadResponse {
            url: stored.url,
            name: stored.name,
        }),
    ))
}

/// GET /files/signatures/:name
pub async fn serve_signature(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let (bytes, mime) = state
        .signatures
        .read(&name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Signature {}", name)))?;

    Ok((
        [
            (header::CONTENT_TYPE, mime),
            // Content-addressed: a name never changes meaning
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        bytes,
    ))
}

/// Build signature routes
pub fn signature_routes() -> Router<AppState> {
    Router::new()
        .route("/api/signatures", post(upload_signature))
        .route("/files/signatures/:name", get(serve_signature))
}
