use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo::{RepoError, UserRepository};
use super::repo_types::{NewUser, User, UserChanges};

#[derive(Default)]
struct Tables {
    rows: HashMap<Uuid, User>,
    // email -> id, plays the role of the unique index
    by_email: HashMap<String, Uuid>,
}

/// In-process user table. Every write holds the single write lock across the
/// uniqueness check and the mutation, so the email index can't race.
#[derive(Default)]
pub struct MemoryUserRepository {
    tables: RwLock<Tables>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User, RepoError> {
        let mut t = self.tables.write().await;
        if t.by_email.contains_key(&user.email) {
            return Err(RepoError::Duplicate);
        }
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        t.by_email.insert(row.email.clone(), row.id);
        t.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let t = self.tables.read().await;
        Ok(t.by_email.get(email).and_then(|id| t.rows.get(id)).cloned())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, RepoError> {
        let mut guard = self.tables.write().await;
        let t = &mut *guard;
        let Some(row) = t.rows.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(email) = changes.email {
            if email != row.email {
                if t.by_email.contains_key(&email) {
                    return Err(RepoError::Duplicate);
                }
                t.by_email.remove(&row.email);
                t.by_email.insert(email.clone(), id);
                row.email = email;
            }
        }
        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(hash) = changes.password_hash {
            row.password_hash = hash;
        }
        row.updated_at = OffsetDateTime::now_utc();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut t = self.tables.write().await;
        match t.rows.remove(&id) {
            Some(row) => {
                t.by_email.remove(&row.email);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
