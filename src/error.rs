use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::{identity::IdentityError, storage::StorageError},
    services::roster::RosterError,
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Missing or invalid session.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Authenticated caller lacks the right to act on the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Concurrent writers kept changing the record.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The roster already reached `max_players`.
    #[error("game is full")]
    GameFull,
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Rejected { message } => ServiceError::InvalidInput(message),
            unavailable => ServiceError::Unavailable(unavailable),
        }
    }
}

impl From<IdentityError> for ServiceError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::MissingSession | IdentityError::InvalidSession => {
                ServiceError::Unauthorized(err.to_string())
            }
            IdentityError::Unsupported(message) => ServiceError::InvalidState(message),
            IdentityError::MissingEnvVar { .. } | IdentityError::Unavailable { .. } => {
                ServiceError::Unavailable(StorageError::unavailable(
                    "identity provider".into(),
                    err,
                ))
            }
        }
    }
}

impl From<RosterError> for ServiceError {
    fn from(err: RosterError) -> Self {
        match err {
            RosterError::Full => ServiceError::GameFull,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Caller is authenticated but not allowed.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Conflict(message) => AppError::Conflict(message),
            ServiceError::GameFull => AppError::Conflict("game is full".into()),
        }
    }
}

/// JSON body of every error response.
#[derive(Serialize)]
struct ErrorBody {
    /// Stable machine-readable kind, e.g. `conflict`.
    error: &'static str,
    message: String,
}

impl AppError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = self.status_and_kind();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed while storage is unavailable");
        }

        let payload = Json(ErrorBody {
            error,
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_storage_writes_surface_as_bad_requests() {
        let err: ServiceError = StorageError::rejected("violates check constraint").into();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[test]
    fn full_roster_maps_to_conflict_status() {
        let err: AppError = ServiceError::from(RosterError::Full).into();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn expired_session_maps_to_unauthorized() {
        let err: AppError = ServiceError::from(IdentityError::InvalidSession).into();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
