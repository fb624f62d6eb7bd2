use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::extractors::JsonPayload;
use crate::error::AppError;
use crate::users::{validation::ValidationErrors, User, UserUpdate};

/// Request body for user registration. Missing fields are reported by
/// validation rather than by the JSON extractor.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl JsonPayload for RegisterRequest {
    const FIELDS: &'static [&'static str] = &["name", "email", "password"];
}

impl JsonPayload for LoginRequest {
    const FIELDS: &'static [&'static str] = &["email", "password"];

    // login never reports field detail
    fn rejection(_errors: ValidationErrors) -> AppError {
        AppError::Unauthorized
    }
}

/// Request body for a partial profile update.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl JsonPayload for UpdateRequest {
    const FIELDS: &'static [&'static str] = &["name", "email", "password"];
}

impl From<UpdateRequest> for UserUpdate {
    fn from(r: UpdateRequest) -> Self {
        Self {
            name: r.name,
            email: r.email,
            password: r.password,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}
