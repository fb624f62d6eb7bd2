use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::PublicUser;
use super::jwt::{TokenError, TokenIssuer};
use super::password::{verify_dummy, verify_password};
use crate::error::AppError;
use crate::state::AppState;
use crate::users::{CredentialStore, StoreError, UserUpdate};

/// A user id that has been proven by token verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
}

/// Account operations: the credential store plus token issuance.
///
/// Holds no per-request state; authenticated operations take the caller's
/// [`Identity`] explicitly.
#[derive(Clone)]
pub struct AuthService {
    store: CredentialStore,
    tokens: Arc<dyn TokenIssuer>,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl AuthService {
    pub fn new(store: CredentialStore, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self { store, tokens }
    }

    #[instrument(skip(self, name, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<PublicUser, AppError> {
        let user = self.store.create(name, email, password).await?;
        info!(user_id = %user.id, "user registered");
        Ok(user.into())
    }

    /// Unknown email and wrong password produce the same `Unauthorized`, and
    /// both run one Argon2 verification. The password is trimmed the same way
    /// it was at registration.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let password = password.trim();
        let user = match self.store.find_by_email(email).await {
            Ok(u) => u,
            Err(StoreError::NotFound) => {
                verify_dummy(password);
                warn!(reason = "unknown email", "login rejected");
                return Err(AppError::Unauthorized);
            }
            Err(e) => return Err(e.into()),
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, reason = "wrong password", "login rejected");
            return Err(AppError::Unauthorized);
        }

        let token = self.tokens.issue(user.id)?;
        info!(user_id = %user.id, "user logged in");
        Ok(token)
    }

    pub fn authenticate(&self, token: &str) -> Result<Identity, AppError> {
        match self.tokens.verify(token) {
            Ok(user_id) => Ok(Identity { user_id }),
            Err(TokenError::Invalid) => {
                warn!("invalid or expired token");
                Err(AppError::Unauthorized)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolves the user behind a bearer token. A valid token for a deleted
    /// user is `Unauthorized`.
    #[instrument(skip_all)]
    pub async fn current_user(&self, token: &str) -> Result<PublicUser, AppError> {
        let identity = self.authenticate(token)?;
        match self.store.find_by_id(identity.user_id).await {
            Ok(user) => Ok(user.into()),
            Err(StoreError::NotFound) => {
                warn!(user_id = %identity.user_id, "token for missing user");
                Err(AppError::Unauthorized)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Any authenticated caller may update any user.
    #[instrument(skip(self, caller, changes), fields(caller = %caller.user_id))]
    pub async fn update(
        &self,
        caller: &Identity,
        id: Uuid,
        changes: UserUpdate,
    ) -> Result<PublicUser, AppError> {
        let user = self.store.update(id, changes).await?;
        info!(user_id = %user.id, "user updated");
        Ok(user.into())
    }

    /// Any authenticated caller may delete any user.
    #[instrument(skip(self, caller), fields(caller = %caller.user_id))]
    pub async fn delete(&self, caller: &Identity, id: Uuid) -> Result<(), AppError> {
        self.store.delete(id).await?;
        info!(user_id = %id, "user deleted");
        Ok(())
    }
}
