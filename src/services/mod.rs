//! # CRUD Orchestrators
//!
//! Services sit between the HTTP handlers and the repositories. Every
//! operation authorizes the acting [`Identity`](crate::auth::Identity),
//! serves reads through the tag-aware cache and invalidates the affected
//! tags after a successful write.

use thiserror::Error;

use crate::access::{AccessError, LoadError};
use crate::error::RepositoryError;

pub mod customer_users;
pub mod products;
pub mod users;
pub mod validation;

pub use customer_users::CustomerUserService;
pub use products::ProductService;
pub use users::UserService;
pub use validation::{UserPayload, ValidationErrors};

/// Errors returned by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("validation failed")]
    Validation(ValidationErrors),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Repository(RepositoryError),
    #[error("failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Repository(other),
        }
    }
}

impl From<LoadError> for ServiceError {
    fn from(error: LoadError) -> Self {
        match error {
            LoadError::Access(access) => access.into(),
            LoadError::Repository(repo) => repo.into(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use sea_orm::{ConnectOptions, Database, DatabaseConnection};

    use crate::auth::{Identity, Role};
    use crate::cache::{InMemoryTagCache, TagAwareCache};
    use crate::repositories::{CustomerRepository, customer::NewCustomer};

    pub async fn database() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        crate::db::run_migrations(&db).await.unwrap();
        db
    }

    pub fn cache() -> Arc<dyn TagAwareCache> {
        Arc::new(InMemoryTagCache::new(64))
    }

    pub async fn customer(db: &DatabaseConnection, name: &str) -> Identity {
        let created = CustomerRepository::new(db)
            .create(NewCustomer {
                name: name.to_string(),
                email: format!("{}@pro.com", name.to_lowercase()),
                roles: vec![Role::Customer],
                password_hash: String::new(),
            })
            .await
            .unwrap();
        Identity::from_customer(&created)
    }
}
