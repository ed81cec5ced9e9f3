//! # Customer Repository
//!
//! Lookup and lifecycle operations for customers. Deleting a customer removes
//! its users in the same transaction.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};

use crate::auth::Role;
use crate::error::RepositoryError;
use crate::models::customer::{self, Entity as Customer, Model as CustomerModel};
use crate::models::user::{self, Entity as User};
use crate::cache::CacheTag;
use crate::text::slugify;

/// Request data for creating a new customer
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub roles: Vec<Role>,
    /// Already hashed password
    pub password_hash: String,
}

/// Outcome of removing a customer together with its users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRemoval {
    pub customer_id: i32,
    pub removed_user_ids: Vec<i32>,
}

impl CustomerRemoval {
    /// Cache tags covering every view of the removed customer and its users.
    pub fn cache_tags(&self) -> Vec<CacheTag> {
        std::iter::once(CacheTag::UserList {
            customer_id: self.customer_id,
        })
        .chain(
            self.removed_user_ids
                .iter()
                .map(|&user_id| CacheTag::UserDetail { user_id }),
        )
        .collect()
    }
}

/// Repository for Customer database operations
pub struct CustomerRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> CustomerRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<CustomerModel>, RepositoryError> {
        Customer::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Looks a customer up by login email (stored lowercase).
    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CustomerModel>, RepositoryError> {
        Customer::find()
            .filter(customer::Column::Email.eq(email.trim().to_lowercase()))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn create(&self, request: NewCustomer) -> Result<CustomerModel, RepositoryError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(RepositoryError::validation_error(
                "Customer name cannot be empty",
            ));
        }

        let roles: Vec<&str> = request.roles.iter().map(Role::as_str).collect();
        let customer = customer::ActiveModel {
            slug: Set(slugify(&name)),
            name: Set(name),
            email: Set(request.email.trim().to_lowercase()),
            roles: Set(serde_json::json!(roles)),
            password_hash: Set(request.password_hash),
            ..Default::default()
        };

        customer
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn count(&self) -> Result<u64, RepositoryError> {
        Customer::find()
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_all(&self) -> Result<Vec<CustomerModel>, RepositoryError> {
        Customer::find()
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Deletes the customer and every user it owns atomically.
    ///
    /// Does not touch the response cache; callers invalidate
    /// [`CustomerRemoval::cache_tags`].
    pub async fn delete_with_users(&self, id: i32) -> Result<CustomerRemoval, RepositoryError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(RepositoryError::database_error)?;

        let Some(existing) = Customer::find_by_id(id)
            .one(&txn)
            .await
            .map_err(RepositoryError::database_error)?
        else {
            return Err(RepositoryError::NotFound(format!("customer {id}")));
        };

        let removed_user_ids: Vec<i32> = User::find()
            .filter(user::Column::CustomerId.eq(existing.id))
            .all(&txn)
            .await
            .map_err(RepositoryError::database_error)?
            .into_iter()
            .map(|user| user.id)
            .collect();

        User::delete_many()
            .filter(user::Column::CustomerId.eq(existing.id))
            .exec(&txn)
            .await
            .map_err(RepositoryError::database_error)?;

        Customer::delete_by_id(existing.id)
            .exec(&txn)
            .await
            .map_err(RepositoryError::database_error)?;

        txn.commit()
            .await
            .map_err(RepositoryError::database_error)?;

        tracing::info!(
            customer_id = existing.id,
            removed_users = removed_user_ids.len(),
            "Deleted customer and owned users"
        );

        Ok(CustomerRemoval {
            customer_id: existing.id,
            removed_user_ids,
        })
    }
}
