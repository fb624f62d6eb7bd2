use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{AuthService, JwtKeys};
use crate::config::AppConfig;
use crate::users::{CredentialStore, MemoryUserRepository, PgUserRepository, UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
}

impl AppState {
    /// Connects to PostgreSQL and applies pending migrations.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        let repo = Arc::new(PgUserRepository::new(db)) as Arc<dyn UserRepository>;
        Ok(Self::from_parts(config, repo))
    }

    pub fn from_parts(config: Arc<AppConfig>, repo: Arc<dyn UserRepository>) -> Self {
        let tokens = Arc::new(JwtKeys::from_config(&config.jwt));
        let auth = AuthService::new(CredentialStore::new(repo), tokens);
        Self { config, auth }
    }

    /// State backed by an in-process user table.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::from_parts(Arc::new(config), Arc::new(MemoryUserRepository::new()))
    }
}
