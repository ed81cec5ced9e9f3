//! Brand repository

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::error::RepositoryError;
use crate::models::brand::{self, Entity as Brand, Model as BrandModel};
use crate::text::slugify;

pub struct BrandRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> BrandRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<BrandModel>, RepositoryError> {
        Brand::find()
            .filter(brand::Column::Slug.eq(slug))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Returns the brand with the slug of `name`, creating it when missing.
    pub async fn find_or_create(&self, name: &str) -> Result<BrandModel, RepositoryError> {
        // Slugs are unique, so a name without letters or digits would alias other brands.
        if !name.chars().any(char::is_alphanumeric) {
            return Err(RepositoryError::validation_error(
                "Brand name must contain a letter or digit",
            ));
        }
        let slug = slugify(name);
        if let Some(existing) = self.find_by_slug(&slug).await? {
            return Ok(existing);
        }

        brand::ActiveModel {
            name: Set(name.trim().to_string()),
            slug: Set(slug),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }
}
