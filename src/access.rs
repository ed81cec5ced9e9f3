//! # Resource Access Control
//!
//! Ownership and role checks applied by the orchestrators. Existence is
//! always checked before ownership, so a missing resource reports
//! `NotFound` to every caller and a foreign one reports `Forbidden`.

use thiserror::Error;

use crate::auth::{Identity, Role};
use crate::error::RepositoryError;
use crate::models::user::Model as UserModel;
use crate::repositories::UserRepository;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i32 },
    #[error("You are not allowed to access this resource")]
    Forbidden,
    #[error("Role {0} is required")]
    MissingRole(Role),
}

/// Failure of [`load_owned_user`]: either the lookup or the access check.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Fails unless `actor` holds `role`.
pub fn require_role(actor: &Identity, role: Role) -> Result<(), AccessError> {
    if actor.has_role(role) {
        Ok(())
    } else {
        tracing::info!(
            customer_id = actor.customer_id,
            role = %role,
            "Access denied: missing role"
        );
        Err(AccessError::MissingRole(role))
    }
}

/// Fails unless `resource` is owned by `actor`.
pub fn authorize(actor: &Identity, resource: &UserModel) -> Result<(), AccessError> {
    if resource.customer_id == actor.customer_id {
        Ok(())
    } else {
        tracing::info!(
            customer_id = actor.customer_id,
            user_id = resource.id,
            owner_id = resource.customer_id,
            "Access denied: user owned by another customer"
        );
        Err(AccessError::Forbidden)
    }
}

/// Fails unless the customer named in the path is the acting customer.
pub fn authorize_customer_scope(actor: &Identity, customer_id: i32) -> Result<(), AccessError> {
    if customer_id == actor.customer_id {
        Ok(())
    } else {
        tracing::info!(
            customer_id = actor.customer_id,
            requested_customer_id = customer_id,
            "Access denied: foreign customer scope"
        );
        Err(AccessError::Forbidden)
    }
}

/// Turns a lookup result into the resource or `NotFound`.
pub fn ensure_found<T>(found: Option<T>, resource: &'static str, id: i32) -> Result<T, AccessError> {
    found.ok_or(AccessError::NotFound { resource, id })
}

/// Existence check followed by ownership check for a user.
pub fn owned_user(
    actor: &Identity,
    found: Option<UserModel>,
    id: i32,
) -> Result<UserModel, AccessError> {
    let user = ensure_found(found, "User", id)?;
    authorize(actor, &user)?;
    Ok(user)
}

/// Loads user `id` and checks that `actor` owns it.
pub async fn load_owned_user(
    repo: &UserRepository<'_>,
    actor: &Identity,
    id: i32,
) -> Result<UserModel, LoadError> {
    let found = repo.find_by_id(id).await?;
    Ok(owned_user(actor, found, id)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(customer_id: i32, roles: Vec<Role>) -> Identity {
        Identity {
            customer_id,
            email: format!("c{customer_id}@pro.com"),
            roles,
        }
    }

    fn user(id: i32, customer_id: i32) -> UserModel {
        UserModel {
            id,
            username: "jdoe".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "john.doe@gmail.com".to_string(),
            customer_id,
        }
    }

    #[test]
    fn owner_is_authorized() {
        let actor = identity(1, vec![Role::User, Role::Customer]);
        assert!(authorize(&actor, &user(5, 1)).is_ok());
    }

    #[test]
    fn foreign_user_is_forbidden() {
        let actor = identity(1, vec![Role::User, Role::Customer]);
        assert_eq!(authorize(&actor, &user(5, 2)), Err(AccessError::Forbidden));
    }

    #[test]
    fn missing_user_is_not_found_before_ownership() {
        let actor = identity(1, vec![Role::Customer]);
        assert_eq!(
            owned_user(&actor, None, 42),
            Err(AccessError::NotFound {
                resource: "User",
                id: 42
            })
        );
        assert_eq!(
            owned_user(&actor, Some(user(42, 9)), 42),
            Err(AccessError::Forbidden)
        );
    }

    #[test]
    fn role_is_required() {
        let plain = identity(1, vec![Role::User]);
        assert_eq!(
            require_role(&plain, Role::Customer),
            Err(AccessError::MissingRole(Role::Customer))
        );
        assert!(require_role(&plain, Role::User).is_ok());
    }

    #[test]
    fn customer_scope_must_match() {
        let actor = identity(3, vec![Role::Customer]);
        assert!(authorize_customer_scope(&actor, 3).is_ok());
        assert_eq!(
            authorize_customer_scope(&actor, 4),
            Err(AccessError::Forbidden)
        );
    }
}
