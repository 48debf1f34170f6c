//! Request-boundary error taxonomy
//!
//! Every error crossing the HTTP boundary becomes `{"error": "<message>"}`
//! with the status below. Bad credentials use one message whether the email
//! is unknown or the password wrong; a note owned by someone else reports the
//! same 404 as a missing one; an invalid and an expired token share one 403.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;
use thiserror::Error;

use sealnote_store::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("User already exists")]
    DuplicateIdentity,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Access token required")]
    Unauthenticated,

    #[error("Invalid or expired token")]
    Forbidden,

    #[error("Note not found")]
    NotFound,

    #[error("Server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::DuplicateIdentity
            | ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateIdentity => ApiError::DuplicateIdentity,
            StoreError::NoteNotFound => ApiError::NotFound,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::DuplicateIdentity.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_store_error_conversion() {
        assert!(matches!(
            ApiError::from(StoreError::DuplicateIdentity),
            ApiError::DuplicateIdentity
        ));
        assert!(matches!(
            ApiError::from(StoreError::NoteNotFound),
            ApiError::NotFound
        ));
        assert!(matches!(
            ApiError::from(StoreError::Corrupt("bad".into())),
            ApiError::Internal(_)
        ));
    }
}
