//! Error types for cipa-server
//!
//! Every handler returns [`ApiResult`]. Errors render as
//! `{"error": {"code": "...", "message": "..."}}`; a duplicate candidacy also
//! carries the existing record so the client can resume it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cipa_common::candidacy::CandidacyError;
use cipa_common::documents::DocumentError;
use cipa_common::models::{Candidate, TransitionError};
use serde_json::json;
use thiserror::Error;

use crate::services::image_proxy::ProxyError;
use crate::services::signature_store::SignatureError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Well-formed request the current state cannot satisfy (422)
    #[error("{0}")]
    Unprocessable(String),

    /// Conflict (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Second registration for the same (term, collaborator) pair (409)
    #[error("Collaborator is already registered for this election")]
    DuplicateCandidacy(Box<Candidate>),

    /// Link or session no longer usable (410)
    #[error("{0}")]
    Gone(String),

    /// Upstream fetch failed (502)
    #[error("Upstream error: {0}")]
    BadGateway(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// cipa-common error
    #[error("Common error: {0}")]
    Common(#[from] cipa_common::Error),
}

impl From<CandidacyError> for ApiError {
    fn from(err: CandidacyError) -> Self {
        match err {
            CandidacyError::DuplicateCandidacy { existing } => ApiError::DuplicateCandidacy(existing),
            CandidacyError::EmptySignature => ApiError::BadRequest(err.to_string()),
            CandidacyError::SignatureConflict { .. } | CandidacyError::AlreadyApproved { .. } => {
                ApiError::Conflict(err.to_string())
            }
        }
    }
}

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::MissingField { .. } | DocumentError::Locked { .. } => {
                ApiError::Unprocessable(err.to_string())
            }
            DocumentError::Package(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<TransitionError> for ApiError {
    fn from(err: TransitionError) -> Self {
        ApiError::Unprocessable(err.to_string())
    }
}

impl From<SignatureError> for ApiError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::Io(e) => ApiError::Internal(format!("Failed to store signature: {}", e)),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::InvalidUrl(_) => ApiError::BadRequest(err.to_string()),
            other => ApiError::BadGateway(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Common(cipa_common::Error::Database(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::DuplicateCandidacy(existing) = &self {
            let body = Json(json!({
                "error": {
                    "code": "DUPLICATE_CANDIDACY",
                    "message": self.to_string(),
                },
                "existing": existing,
            }));
            return (StatusCode::CONFLICT, body).into_response();
        }

        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE", msg)
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::DuplicateCandidacy(_) => {
                (StatusCode::CONFLICT, "DUPLICATE_CANDIDACY", String::new())
            }
            ApiError::Gone(msg) => (StatusCode::GONE, "GONE", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "BAD_GATEWAY", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::Io(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                err.to_string(),
            ),
            ApiError::Common(ref err) => match err {
                cipa_common::Error::NotFound(msg) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone())
                }
                cipa_common::Error::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
                }
                other => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMMON_ERROR",
                    other.to_string(),
                ),
            },
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, "{}", message);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_candidacy_errors_map_to_status_codes() {
        let conflict: ApiError = CandidacyError::AlreadyApproved {
            candidate_id: Uuid::new_v4(),
        }
        .into();
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

        let empty: ApiError = CandidacyError::EmptySignature.into();
        assert_eq!(empty.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_document_errors_are_unprocessable() {
        let err: ApiError = DocumentError::MissingField {
            document: "Ata de Posse",
            field: "presidente",
        }
        .into();
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_common_not_found_is_404() {
        let err: ApiError = cipa_common::Error::NotFound("Term x".to_string()).into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
