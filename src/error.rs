use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::auth::jwt::TokenError;
use crate::users::{validation::ValidationErrors, StoreError};

pub const DUPLICATE_EMAIL_MESSAGE: &str = "The email has already been taken.";

/// Failures of the account operations, each with a fixed HTTP mapping.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(ValidationErrors),
    #[error("email already taken")]
    DuplicateEmail,
    #[error("user not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("token signing failed")]
    TokenSigningFailure(#[source] TokenError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::DuplicateEmail => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::TokenSigningFailure(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AppError::NotFound,
            StoreError::DuplicateEmail => AppError::DuplicateEmail,
            StoreError::InvalidInput(errors) => AppError::InvalidInput(errors),
            StoreError::Backend(e) => AppError::Internal(e),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Invalid => AppError::Unauthorized,
            e @ TokenError::Signing(_) => AppError::TokenSigningFailure(e),
        }
    }
}

fn validation_body(errors: &ValidationErrors) -> serde_json::Value {
    json!({
        "message": errors.to_string(),
        "errors": errors,
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::InvalidInput(errors) => validation_body(errors),
            AppError::DuplicateEmail => {
                validation_body(&ValidationErrors::single("email", DUPLICATE_EMAIL_MESSAGE))
            }
            AppError::NotFound => json!({ "error": "User not found" }),
            AppError::Unauthorized => json!({ "error": "Unauthorized" }),
            AppError::TokenSigningFailure(e) => {
                error!(error = %e, "token signing failed");
                json!({ "error": "Could not create token" })
            }
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                json!({ "error": "Internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}
