use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{identity::IdentityError, loans::TransitionError, repository::RepoError};

/// AppError
///
/// The HTTP-facing error taxonomy. Every variant renders as `{"error": "<message>"}`
/// with the matching status code.
#[derive(Debug, Error)]
pub enum AppError {
    /// No authenticated identity (missing, malformed or expired token, unknown user).
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated, but the caller's role is not allowed to perform the action.
    #[error("{0}")]
    Forbidden(String),

    /// Bad input, including constraint violations reported by the database.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// The target row is not in a state that allows the action (e.g. disbursing twice).
    #[error("{0}")]
    Conflict(String),

    /// The cause is logged but never sent to the client.
    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn forbidden() -> Self {
        AppError::Forbidden("Forbidden".to_string())
    }

    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{} not found", what))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// ErrorBody
///
/// Uniform error payload returned by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let AppError::Internal(cause) = &self {
            tracing::error!(%cause, "request failed with an internal error");
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(what) => AppError::not_found(what),
            RepoError::Constraint(msg) => AppError::Validation(msg),
            RepoError::InsufficientFunds => AppError::Validation("Insufficient funds".to_string()),
            RepoError::Database(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid {field}"),
                })
            })
            .collect();
        messages.sort();
        messages.dedup();

        AppError::Validation(messages.join("; "))
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Rejected(msg) => AppError::Validation(msg),
            IdentityError::Unavailable(cause) => AppError::Internal(cause),
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::Conflict(err.to_string())
    }
}
