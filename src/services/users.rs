//! # User Service
//!
//! CRUD over the users owned by the acting customer (`/api/users`).
//! Reads are cached per owner, page, limit and version; writes invalidate
//! the owner's listing tag and, for existing users, the user's detail tag.

use axum::body::Bytes;
use sea_orm::DatabaseConnection;

use super::{ServiceError, UserPayload};
use crate::access::{load_owned_user, require_role};
use crate::auth::{Identity, Role};
use crate::cache::{CacheKey, CacheTag, TagAwareCache};
use crate::pagination::{Page, Pagination};
use crate::repositories::UserRepository;
use crate::resources::UserResource;
use crate::versioning::ApiVersion;

pub struct UserService<'a> {
    db: &'a DatabaseConnection,
    cache: &'a dyn TagAwareCache,
}

impl<'a> UserService<'a> {
    pub fn new(db: &'a DatabaseConnection, cache: &'a dyn TagAwareCache) -> Self {
        Self { db, cache }
    }

    /// Serialized page of the actor's users.
    pub async fn list(
        &self,
        actor: &Identity,
        pagination: Pagination,
        version: ApiVersion,
    ) -> Result<Bytes, ServiceError> {
        require_role(actor, Role::Customer)?;

        let owner_id = actor.customer_id;
        let key = CacheKey::user_list(owner_id, pagination, version);
        let tags = [CacheTag::UserList {
            customer_id: owner_id,
        }];
        let db = self.db;

        self.cache
            .get_or_compute(&key, &tags, move || async move {
                let (users, total) = UserRepository::new(db)
                    .find_page_by_customer(owner_id, pagination)
                    .await?;
                let page = Page::new(users, total, pagination)
                    .map(|user| UserResource::render(user, version));
                Ok::<_, ServiceError>(Bytes::from(serde_json::to_vec(&page)?))
            })
            .await
    }

    /// Serialized representation of one of the actor's users.
    pub async fn detail(
        &self,
        actor: &Identity,
        id: i32,
        version: ApiVersion,
    ) -> Result<Bytes, ServiceError> {
        require_role(actor, Role::Customer)?;

        let key = CacheKey::user_detail(id, actor.customer_id, version);
        let tags = [CacheTag::UserDetail { user_id: id }];
        let db = self.db;

        self.cache
            .get_or_compute(&key, &tags, move || async move {
                let user = load_owned_user(&UserRepository::new(db), actor, id).await?;
                let resource = UserResource::render(user, version);
                Ok::<_, ServiceError>(Bytes::from(serde_json::to_vec(&resource)?))
            })
            .await
    }

    /// Creates a user owned by the actor.
    pub async fn create(
        &self,
        actor: &Identity,
        payload: &UserPayload,
    ) -> Result<UserResource, ServiceError> {
        require_role(actor, Role::Customer)?;
        let fields = payload.validate()?;

        let repo = UserRepository::new(self.db);
        if repo.email_taken(&fields.email, None).await? {
            return Err(email_conflict(&fields.email));
        }

        let created = repo.create(actor.customer_id, fields).await?;
        self.cache
            .invalidate(&[CacheTag::UserList {
                customer_id: actor.customer_id,
            }])
            .await;

        tracing::info!(
            user_id = created.id,
            customer_id = actor.customer_id,
            "Created user"
        );
        Ok(UserResource::render(created, ApiVersion::default()))
    }

    /// Replaces the attributes of one of the actor's users.
    pub async fn update(
        &self,
        actor: &Identity,
        id: i32,
        payload: &UserPayload,
    ) -> Result<UserResource, ServiceError> {
        require_role(actor, Role::Customer)?;
        let fields = payload.validate()?;

        let repo = UserRepository::new(self.db);
        let existing = load_owned_user(&repo, actor, id).await?;
        if repo.email_taken(&fields.email, Some(existing.id)).await? {
            return Err(email_conflict(&fields.email));
        }

        let updated = repo.update(existing, fields).await?;
        self.invalidate_user(updated.customer_id, updated.id).await;

        tracing::info!(user_id = updated.id, customer_id = actor.customer_id, "Updated user");
        Ok(UserResource::render(updated, ApiVersion::default()))
    }

    /// Removes one of the actor's users.
    pub async fn delete(&self, actor: &Identity, id: i32) -> Result<(), ServiceError> {
        require_role(actor, Role::Customer)?;

        let repo = UserRepository::new(self.db);
        let existing = load_owned_user(&repo, actor, id).await?;
        let owner_id = existing.customer_id;

        repo.delete(existing).await?;
        self.invalidate_user(owner_id, id).await;

        tracing::info!(user_id = id, customer_id = actor.customer_id, "Deleted user");
        Ok(())
    }

    async fn invalidate_user(&self, owner_id: i32, user_id: i32) {
        let evicted = self
            .cache
            .invalidate(&[
                CacheTag::UserList {
                    customer_id: owner_id,
                },
                CacheTag::UserDetail { user_id },
            ])
            .await;
        tracing::debug!(user_id, evicted, "Invalidated user cache entries");
    }
}

fn email_conflict(email: &str) -> ServiceError {
    ServiceError::Conflict(format!("Email {email} is already used"))
}
