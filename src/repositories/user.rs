//! # User Repository
//!
//! Persistence for users. Every listing is scoped to one owning customer.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::error::RepositoryError;
use crate::models::user::{self, Entity as User, Model as UserModel};
use crate::pagination::Pagination;

/// Normalized user attributes written on create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFields {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Repository for User database operations
pub struct UserRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<UserModel>, RepositoryError> {
        User::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, RepositoryError> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Whether another user already uses `email`. `exclude_id` skips the user being updated.
    pub async fn email_taken(
        &self,
        email: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, RepositoryError> {
        let mut query = User::find().filter(user::Column::Email.eq(email));
        if let Some(id) = exclude_id {
            query = query.filter(user::Column::Id.ne(id));
        }

        let count = query
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(count > 0)
    }

    /// One page of a customer's users, newest first, with the total row count.
    pub async fn find_page_by_customer(
        &self,
        customer_id: i32,
        pagination: Pagination,
    ) -> Result<(Vec<UserModel>, u64), RepositoryError> {
        let query = User::find().filter(user::Column::CustomerId.eq(customer_id));

        let total = query
            .clone()
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let users = query
            .order_by_desc(user::Column::Id)
            .offset(pagination.offset())
            .limit(pagination.limit())
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok((users, total))
    }

    pub async fn create(
        &self,
        customer_id: i32,
        fields: UserFields,
    ) -> Result<UserModel, RepositoryError> {
        let user = user::ActiveModel {
            username: Set(fields.username),
            first_name: Set(fields.first_name),
            last_name: Set(fields.last_name),
            email: Set(fields.email),
            customer_id: Set(customer_id),
            ..Default::default()
        };

        user.insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Overwrites the mutable attributes. The owning customer is left untouched.
    pub async fn update(
        &self,
        existing: UserModel,
        fields: UserFields,
    ) -> Result<UserModel, RepositoryError> {
        let mut active = existing.into_active_model();
        active.username = Set(fields.username);
        active.first_name = Set(fields.first_name);
        active.last_name = Set(fields.last_name);
        active.email = Set(fields.email);

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, existing: UserModel) -> Result<(), RepositoryError> {
        existing
            .delete(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(())
    }

    pub async fn count_by_customer(&self, customer_id: i32) -> Result<u64, RepositoryError> {
        User::find()
            .filter(user::Column::CustomerId.eq(customer_id))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
