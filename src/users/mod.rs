pub mod memory;
pub mod postgres;
pub mod repo;
pub mod repo_types;
pub mod store;
pub mod validation;

pub use memory::MemoryUserRepository;
pub use postgres::PgUserRepository;
pub use repo::{RepoError, UserRepository};
pub use repo_types::User;
pub use store::{CredentialStore, StoreError, UserUpdate};
