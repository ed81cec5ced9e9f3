//! # Users API Handlers
//!
//! CRUD endpoints for the users owned by the authenticated customer.

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header::LOCATION},
    response::{IntoResponse, Json, Response},
};

use super::types::JsonPayload;
use crate::auth::Identity;
use crate::error::ApiError;
use crate::pagination::PageQuery;
use crate::resources::{UserResource, user_path};
use crate::server::AppState;
use crate::services::{UserPayload, UserService};
use crate::versioning::NegotiatedVersion;

/// List the authenticated customer's users
#[utoipa::path(
    get,
    path = "/api/users",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Page of users, newest first", body = crate::pagination::Page<UserResource>),
        (status = 400, description = "Invalid pagination parameters", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Customer role required", body = ApiError)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    identity: Identity,
    NegotiatedVersion(version): NegotiatedVersion,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<JsonPayload, ApiError> {
    let Query(query) = query?;
    let pagination = query.resolve(state.config.default_page_limit)?;
    let body = UserService::new(&state.db, state.cache.as_ref())
        .list(&identity, pagination, version)
        .await?;
    Ok(JsonPayload(body))
}

/// Show one of the authenticated customer's users
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User details", body = UserResource),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "User belongs to another customer", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    identity: Identity,
    NegotiatedVersion(version): NegotiatedVersion,
    id: Result<Path<i32>, PathRejection>,
) -> Result<JsonPayload, ApiError> {
    let Path(id) = id?;
    let body = UserService::new(&state.db, state.cache.as_ref())
        .detail(&identity, id, version)
        .await?;
    Ok(JsonPayload(body))
}

/// Create a user owned by the authenticated customer
#[utoipa::path(
    post,
    path = "/api/users",
    security(("bearer_auth" = [])),
    request_body = UserPayload,
    responses(
        (status = 201, description = "User created", body = UserResource, headers(
            ("Location", description = "URL of the created user")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Customer role required", body = ApiError),
        (status = 409, description = "Email already used", body = ApiError)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let created = UserService::new(&state.db, state.cache.as_ref())
        .create(&identity, &payload)
        .await?;

    let location = state.config.resource_location(&user_path(created.id));
    let mut response = (StatusCode::CREATED, Json(created)).into_response();
    if let Ok(value) = HeaderValue::from_str(&location) {
        response.headers_mut().insert(LOCATION, value);
    }
    Ok(response)
}

/// Replace a user's attributes
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User identifier")),
    request_body = UserPayload,
    responses(
        (status = 200, description = "User updated", body = UserResource),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "User belongs to another customer", body = ApiError),
        (status = 404, description = "User not found", body = ApiError),
        (status = 409, description = "Email already used", body = ApiError)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> Result<Json<UserResource>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let updated = UserService::new(&state.db, state.cache.as_ref())
        .update(&identity, id, &payload)
        .await?;
    Ok(Json(updated))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User identifier")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "User belongs to another customer", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    UserService::new(&state.db, state.cache.as_ref())
        .delete(&identity, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
