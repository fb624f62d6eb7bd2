use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRef, FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use super::services::{AuthService, Identity};
use crate::error::AppError;
use crate::users::validation::ValidationErrors;

/// Raw token from `Authorization: Bearer <token>`, not yet verified.
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                warn!("missing Authorization header");
                AppError::Unauthorized
            })?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                warn!("invalid auth scheme");
                AppError::Unauthorized
            })?;

        Ok(BearerToken(token.to_string()))
    }
}

/// Verified caller identity.
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let identity = AuthService::from_ref(state).authenticate(&token)?;
        Ok(AuthUser(identity))
    }
}

/// A request body whose problems are reported through [`AppError`].
pub trait JsonPayload: DeserializeOwned + Send + 'static {
    /// String fields of the payload, checked for type before deserializing.
    const FIELDS: &'static [&'static str];

    fn rejection(errors: ValidationErrors) -> AppError {
        AppError::InvalidInput(errors)
    }
}

/// JSON body extractor. A missing or blank body reads as `{}`, no
/// `Content-Type` is required, and a field of the wrong type is a field error
/// instead of a plain-text rejection.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: JsonPayload,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            warn!(error = %e, "could not read request body");
            T::rejection(ValidationErrors::single(
                "body",
                "The request body could not be read.",
            ))
        })?;

        let value = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Object(Map::new())
        } else {
            serde_json::from_slice::<Value>(&bytes).map_err(|e| {
                warn!(error = %e, "malformed JSON body");
                T::rejection(ValidationErrors::single("body", "The request body must be valid JSON."))
            })?
        };

        let Value::Object(fields) = &value else {
            warn!("JSON body is not an object");
            return Err(T::rejection(ValidationErrors::single(
                "body",
                "The request body must be a JSON object.",
            )));
        };

        let mut errors = ValidationErrors::new();
        for field in T::FIELDS {
            match fields.get(*field) {
                None | Some(Value::Null) | Some(Value::String(_)) => {}
                Some(_) => errors.add(*field, format!("The {field} field must be a string.")),
            }
        }
        if !errors.is_empty() {
            warn!(fields = ?errors, "JSON body has fields of the wrong type");
            return Err(T::rejection(errors));
        }

        serde_json::from_value(value).map(JsonBody).map_err(|e| {
            warn!(error = %e, "JSON body did not match the payload");
            T::rejection(ValidationErrors::single("body", "The request body is invalid."))
        })
    }
}
