//! Unified error handling with Sentry integration.
//!
//! Every failure converges on [`AppError`], which maps the taxonomy to an
//! HTTP status and the uniform `{"message"}` JSON envelope. Server-side
//! errors are captured to Sentry and logged before responding; their
//! messages are sanitized so no driver or upstream detail reaches a caller.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::db::{RepositoryError, TransitionError};
use crate::services::{EmbeddingsError, PasswordError, StorageError, TokenError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, malformed, or expired credential.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Role or ownership mismatch.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource id does not resolve.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed or out-of-range input.
    #[error("validation: {0}")]
    Validation(String),

    /// Request conflicts with existing state (e.g., duplicate email).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Lifecycle transition not permitted from the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(RepositoryError),

    /// Image object-store call failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Embedding service call failed.
    #[error("embeddings error: {0}")]
    Embeddings(#[from] EmbeddingsError),

    /// Embedding service is not configured for this deployment.
    #[error("embedding service not configured")]
    EmbeddingsUnavailable,

    /// Anything else that should read as a plain server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("Resource not found".to_owned()),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Database(other),
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::NotFound => Self::NotFound("Item not found".to_owned()),
            TransitionError::InvalidState { current, target } => Self::InvalidState(format!(
                "Item is {current} and cannot transition to {target}"
            )),
            TransitionError::Repository(inner) => inner.into(),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::Unauthenticated("Token expired".to_owned()),
            TokenError::Encoding => Self::Internal("Failed to issue token".to_owned()),
            _ => Self::Unauthenticated("Invalid token".to_owned()),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) | Self::InvalidState(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(_) | Self::Embeddings(_) => StatusCode::BAD_GATEWAY,
            Self::EmbeddingsUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// The caller-facing message. Server errors get a fixed sanitized text.
    fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_owned(),
            Self::Storage(_) => "Image upload failed".to_owned(),
            Self::Embeddings(_) => "Search service error".to_owned(),
            Self::EmbeddingsUnavailable => "Search service not available".to_owned(),
            Self::Unauthenticated(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Validation(message)
            | Self::Conflict(message)
            | Self::InvalidState(message) => message.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Database(_) | Self::Internal(_) | Self::Storage(_) | Self::Embeddings(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = json!({ "message": self.public_message() });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tradepost_core::ItemStatus;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Unauthenticated("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InvalidState("x".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::EmbeddingsUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_repository_error_mapping() {
        let err: AppError = RepositoryError::NotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));

        let err: AppError = RepositoryError::Conflict("email already exists".into()).into();
        assert!(matches!(err, AppError::Conflict(_)));

        let err: AppError = RepositoryError::DataCorruption("bad row".into()).into();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn test_transition_error_mapping() {
        let err: AppError = TransitionError::InvalidState {
            current: ItemStatus::Pending,
            target: ItemStatus::Sold,
        }
        .into();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_token_error_mapping() {
        let err: AppError = TokenError::Expired.into();
        assert!(matches!(err, AppError::Unauthenticated(_)));

        let err: AppError = TokenError::InvalidSignature.into();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn test_server_errors_are_sanitized() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "column roles parse failure".into(),
        ));
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::Internal("pool exhausted at 10 conns".into());
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = AppError::Validation("Maximum 10 images allowed".into());
        assert_eq!(err.public_message(), "Maximum 10 images allowed");
    }
}
