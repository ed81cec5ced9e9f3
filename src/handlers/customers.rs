//! # Customer Users API Handlers
//!
//! Read-only access to users through their owning customer's URL.

use axum::extract::{
    Path, Query, State,
    rejection::{PathRejection, QueryRejection},
};

use super::types::JsonPayload;
use crate::auth::Identity;
use crate::error::ApiError;
use crate::pagination::{Page, PageQuery};
use crate::resources::UserResource;
use crate::server::AppState;
use crate::services::CustomerUserService;
use crate::versioning::NegotiatedVersion;

/// List the users of a customer
#[utoipa::path(
    get,
    path = "/api/customers/{customer_id}/users",
    security(("bearer_auth" = [])),
    params(
        ("customer_id" = i32, Path, description = "Customer identifier"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Page of the customer's users", body = Page<UserResource>),
        (status = 400, description = "Invalid pagination parameters", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Customer is not the authenticated customer", body = ApiError)
    ),
    tag = "customers"
)]
pub async fn list_customer_users(
    State(state): State<AppState>,
    identity: Identity,
    NegotiatedVersion(version): NegotiatedVersion,
    customer_id: Result<Path<i32>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<JsonPayload, ApiError> {
    let Path(customer_id) = customer_id?;
    let Query(query) = query?;
    let pagination = query.resolve(state.config.default_page_limit)?;

    let body = CustomerUserService::new(&state.db, state.cache.as_ref())
        .list(&identity, customer_id, pagination, version)
        .await?;
    Ok(JsonPayload(body))
}

/// Show one user of a customer
#[utoipa::path(
    get,
    path = "/api/customers/{customer_id}/users/{id}",
    security(("bearer_auth" = [])),
    params(
        ("customer_id" = i32, Path, description = "Customer identifier"),
        ("id" = i32, Path, description = "User identifier")
    ),
    responses(
        (status = 200, description = "User details", body = UserResource),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Customer is not the authenticated customer", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "customers"
)]
pub async fn get_customer_user(
    State(state): State<AppState>,
    identity: Identity,
    NegotiatedVersion(version): NegotiatedVersion,
    ids: Result<Path<(i32, i32)>, PathRejection>,
) -> Result<JsonPayload, ApiError> {
    let Path((customer_id, id)) = ids?;

    let body = CustomerUserService::new(&state.db, state.cache.as_ref())
        .detail(&identity, customer_id, id, version)
        .await?;
    Ok(JsonPayload(body))
}
