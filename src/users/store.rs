use std::sync::Arc;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::repo::{RepoError, UserRepository};
use super::repo_types::{NewUser, User, UserChanges};
use super::validation::{normalize_email, validate_changes, validate_registration, ValidationErrors};
use crate::auth::password::hash_password;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,
    #[error("email already taken")]
    DuplicateEmail,
    #[error("invalid input: {0}")]
    InvalidInput(ValidationErrors),
    #[error(transparent)]
    Backend(anyhow::Error),
}

impl From<RepoError> for StoreError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Duplicate => StoreError::DuplicateEmail,
            RepoError::Backend(e) => StoreError::Backend(e),
        }
    }
}

/// Plaintext partial update as received from the caller.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Validating, hashing front of a [`UserRepository`].
#[derive(Clone)]
pub struct CredentialStore {
    repo: Arc<dyn UserRepository>,
}

impl CredentialStore {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// The secret is trimmed before it is validated and hashed.
    #[instrument(skip(self, name, secret))]
    pub async fn create(&self, name: &str, email: &str, secret: &str) -> Result<User, StoreError> {
        let secret = secret.trim();
        let email = normalize_email(email);
        validate_registration(name, &email, secret).map_err(StoreError::InvalidInput)?;

        let password_hash = hash_password(secret).map_err(StoreError::Backend)?;
        let user = self
            .repo
            .insert(NewUser {
                name: name.trim().to_string(),
                email,
                password_hash,
            })
            .await
            .map_err(|e| {
                if matches!(e, RepoError::Duplicate) {
                    warn!("email already registered");
                }
                StoreError::from(e)
            })?;

        debug!(user_id = %user.id, "user row created");
        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        self.repo.find_by_id(id).await?.ok_or(StoreError::NotFound)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(StoreError::NotFound)
    }

    /// Existence is checked before the payload, so a missing row wins over
    /// invalid fields.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: Uuid, update: UserUpdate) -> Result<User, StoreError> {
        let current = self.find_by_id(id).await?;

        let email = update.email.as_deref().map(normalize_email);
        let password = update.password.as_deref().map(str::trim);
        validate_changes(update.name.as_deref(), email.as_deref(), password)
            .map_err(StoreError::InvalidInput)?;

        let password_hash = match password {
            Some(p) => Some(hash_password(p).map_err(StoreError::Backend)?),
            None => None,
        };
        let changes = UserChanges {
            name: update.name.map(|n| n.trim().to_string()),
            email,
            password_hash,
        };
        if changes.is_empty() {
            return Ok(current);
        }

        let user = self
            .repo
            .update(id, changes)
            .await?
            // deleted between the lookup and the write
            .ok_or(StoreError::NotFound)?;
        debug!(user_id = %user.id, "user row updated");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        if self.repo.delete(id).await? {
            debug!(user_id = %id, "user row deleted");
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }
}
