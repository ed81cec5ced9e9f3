//! # Product Repository
//!
//! Read access to the public catalog, with each product joined to its brand.

use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect,
    Set,
};

use crate::error::RepositoryError;
use crate::models::brand::{Entity as Brand, Model as BrandModel};
use crate::models::product::{self, Entity as Product, Model as ProductModel};
use crate::pagination::Pagination;
use crate::text::slugify;

/// A product row together with its brand (absent only if the row is orphaned).
pub type ProductWithBrand = (ProductModel, Option<BrandModel>);

/// Request data for creating a new product
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub brand_id: i32,
}

pub struct ProductRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ProductRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<ProductWithBrand>, RepositoryError> {
        Product::find_by_id(id)
            .find_also_related(Brand)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// One page of products in id order, with the total row count.
    pub async fn find_page(
        &self,
        pagination: Pagination,
    ) -> Result<(Vec<ProductWithBrand>, u64), RepositoryError> {
        let total = Product::find()
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let rows = Product::find()
            .find_also_related(Brand)
            .order_by_asc(product::Column::Id)
            .offset(pagination.offset())
            .limit(pagination.limit())
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok((rows, total))
    }

    pub async fn create(&self, request: NewProduct) -> Result<ProductModel, RepositoryError> {
        if request.price_cents < 0 {
            return Err(RepositoryError::validation_error(
                "Product price cannot be negative",
            ));
        }

        product::ActiveModel {
            slug: Set(slugify(&request.name)),
            name: Set(request.name),
            description: Set(request.description),
            price_cents: Set(request.price_cents),
            brand_id: Set(request.brand_id),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    pub async fn count(&self) -> Result<u64, RepositoryError> {
        Product::find()
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
