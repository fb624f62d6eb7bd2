use async_trait::async_trait;
use uuid::Uuid;

use super::repo_types::{NewUser, User, UserChanges};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// A write would break the unique email index.
    #[error("email already exists")]
    Duplicate,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Raw persistence for user rows.
///
/// Implementations are the only readers and writers of the user table and must
/// enforce email uniqueness atomically: two concurrent `insert`s with the same
/// email never both succeed.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: NewUser) -> Result<User, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Applies `changes` and returns the updated row, or `None` if no row has `id`.
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, RepoError>;

    /// Returns `false` if no row had `id`.
    async fn delete(&self, id: Uuid) -> Result<bool, RepoError>;
}
