use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, MessageResponse, PublicUser, RegisterRequest, TokenResponse, UpdateRequest},
        extractors::{AuthUser, BearerToken, JsonBody},
        services::AuthService,
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/update/:id", put(update_user))
        .route("/destroy/:id", delete(destroy_user))
}

/// Ids that aren't UUIDs can't name a record.
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound)
}

#[instrument(skip(auth, payload))]
pub async fn register(
    State(auth): State<AuthService>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    auth.register(
        payload.name.as_deref().unwrap_or_default(),
        payload.email.as_deref().unwrap_or_default(),
        payload.password.as_deref().unwrap_or_default(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User created successfully!",
        }),
    ))
}

#[instrument(skip(auth, payload))]
pub async fn login(
    State(auth): State<AuthService>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(AppError::Unauthorized);
    };
    let token = auth.login(&email, &password).await?;
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(auth, token))]
pub async fn get_me(
    State(auth): State<AuthService>,
    BearerToken(token): BearerToken,
) -> Result<Json<PublicUser>, AppError> {
    Ok(Json(auth.current_user(&token).await?))
}

#[instrument(skip(auth, caller, payload))]
pub async fn update_user(
    State(auth): State<AuthService>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id)?;
    auth.update(&caller, id, payload.into()).await?;
    Ok(Json(MessageResponse {
        message: "User updated successfully",
    }))
}

#[instrument(skip(auth, caller))]
pub async fn destroy_user(
    State(auth): State<AuthService>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id)?;
    auth.delete(&caller, id).await?;
    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}
