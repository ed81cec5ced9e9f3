//! Read-only view of a customer's users under `/api/customers/{customer_id}/users`.
//!
//! Entries share the [`CacheTag::UserList`] and [`CacheTag::UserDetail`] tags
//! of the global user view, so writes through [`UserService`](super::UserService)
//! evict both.

use axum::body::Bytes;
use sea_orm::DatabaseConnection;

use super::ServiceError;
use crate::access::{authorize_customer_scope, load_owned_user, require_role};
use crate::auth::{Identity, Role};
use crate::cache::{CacheKey, CacheTag, TagAwareCache};
use crate::pagination::{Page, Pagination};
use crate::repositories::UserRepository;
use crate::resources::UserResource;
use crate::versioning::ApiVersion;

pub struct CustomerUserService<'a> {
    db: &'a DatabaseConnection,
    cache: &'a dyn TagAwareCache,
}

impl<'a> CustomerUserService<'a> {
    pub fn new(db: &'a DatabaseConnection, cache: &'a dyn TagAwareCache) -> Self {
        Self { db, cache }
    }

    pub async fn list(
        &self,
        actor: &Identity,
        customer_id: i32,
        pagination: Pagination,
        version: ApiVersion,
    ) -> Result<Bytes, ServiceError> {
        require_role(actor, Role::Customer)?;
        authorize_customer_scope(actor, customer_id)?;

        let key = CacheKey::customer_user_list(customer_id, pagination, version);
        let tags = [CacheTag::UserList { customer_id }];
        let db = self.db;

        self.cache
            .get_or_compute(&key, &tags, move || async move {
                let (users, total) = UserRepository::new(db)
                    .find_page_by_customer(customer_id, pagination)
                    .await?;
                let page = Page::new(users, total, pagination)
                    .map(|user| UserResource::render(user, version));
                Ok::<_, ServiceError>(Bytes::from(serde_json::to_vec(&page)?))
            })
            .await
    }

    pub async fn detail(
        &self,
        actor: &Identity,
        customer_id: i32,
        id: i32,
        version: ApiVersion,
    ) -> Result<Bytes, ServiceError> {
        require_role(actor, Role::Customer)?;
        authorize_customer_scope(actor, customer_id)?;

        let key = CacheKey::customer_user_detail(customer_id, id, version);
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
}
