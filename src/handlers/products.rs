//! # Products API Handlers
//!
//! Public catalog endpoints. The brand is embedded from API version 2.0.

use axum::extract::{
    Path, Query, State,
    rejection::{PathRejection, QueryRejection},
};

use super::types::JsonPayload;
use crate::error::ApiError;
use crate::pagination::{Page, PageQuery};
use crate::resources::ProductResource;
use crate::server::AppState;
use crate::services::ProductService;
use crate::versioning::NegotiatedVersion;

/// List catalog products
#[utoipa::path(
    get,
    path = "/api/products",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of products", body = Page<ProductResource>),
        (status = 400, description = "Invalid pagination parameters", body = ApiError)
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    NegotiatedVersion(version): NegotiatedVersion,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<JsonPayload, ApiError> {
    let Query(query) = query?;
    let pagination = query.resolve(state.config.default_page_limit)?;

    let body = ProductService::new(&state.db, state.cache.as_ref())
        .list(pagination, version)
        .await?;
    Ok(JsonPayload(body))
}

/// Show a catalog product
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product identifier")),
    responses(
        (status = 200, description = "Product details", body = ProductResource),
        (status = 404, description = "Product not found", body = ApiError)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    NegotiatedVersion(version): NegotiatedVersion,
    id: Result<Path<i32>, PathRejection>,
) -> Result<JsonPayload, ApiError> {
    let Path(id) = id?;

    let body = ProductService::new(&state.db, state.cache.as_ref())
        .detail(id, version)
        .await?;
    Ok(JsonPayload(body))
}
