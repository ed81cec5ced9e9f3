//! Public product catalog reads.

use axum::body::Bytes;
use sea_orm::DatabaseConnection;

use super::ServiceError;
use crate::access::ensure_found;
use crate::cache::{CacheKey, CacheTag, TagAwareCache};
use crate::pagination::{Page, Pagination};
use crate::repositories::ProductRepository;
use crate::resources::ProductResource;
use crate::versioning::ApiVersion;

pub struct ProductService<'a> {
    db: &'a DatabaseConnection,
    cache: &'a dyn TagAwareCache,
}

impl<'a> ProductService<'a> {
    pub fn new(db: &'a DatabaseConnection, cache: &'a dyn TagAwareCache) -> Self {
        Self { db, cache }
    }

    pub async fn list(
        &self,
        pagination: Pagination,
        version: ApiVersion,
    ) -> Result<Bytes, ServiceError> {
        let key = CacheKey::product_list(pagination, version);
        let db = self.db;

        self.cache
            .get_or_compute(&key, &[CacheTag::ProductList], move || async move {
                let (rows, total) = ProductRepository::new(db).find_page(pagination).await?;
                let page = Page::new(rows, total, pagination)
                    .map(|(product, brand)| ProductResource::render(product, brand, version));
                Ok::<_, ServiceError>(Bytes::from(serde_json::to_vec(&page)?))
            })
            .await
    }

    pub async fn detail(&self, id: i32, version: ApiVersion) -> Result<Bytes, ServiceError> {
        let key = CacheKey::product_detail(id, version);
        let tags = [CacheTag::ProductDetail { product_id: id }];
        let db = self.db;

        self.cache
            .get_or_compute(&key, &tags, move || async move {
                let found = ProductRepository::new(db).find_by_id(id).await?;
                let (product, brand) = ensure_found(found, "Product", id)?;
                let resource = ProductResource::render(product, brand, version);
                Ok::<_, ServiceError>(Bytes::from(serde_json::to_vec(&resource)?))
            })
            .await
    }
}
