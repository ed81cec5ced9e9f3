//! # Login Handler
//!
//! Exchanges customer credentials for a bearer token.

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth;
use crate::error::{ApiError, validation_error};
use crate::server::AppState;

/// Login credentials
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    /// Customer email
    #[schema(example = "orange@pro.com")]
    pub username: String,
    #[schema(example = "secret")]
    pub password: String,
}

/// Issued bearer token
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    /// Token lifetime in seconds
    #[schema(example = 3600)]
    pub expires_in: u64,
}

/// Authenticate a customer
#[utoipa::path(
    post,
    path = "/api/login_check",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Missing credentials", body = ApiError),
        (status = 401, description = "Invalid credentials", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn login_check(
    State(state): State<AppState>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = request?;

    let mut missing = serde_json::Map::new();
    for (field, value) in [("username", &request.username), ("password", &request.password)] {
        if value.trim().is_empty() {
            missing.insert(field.to_string(), "This value should not be blank.".into());
        }
    }
    if !missing.is_empty() {
        return Err(validation_error("Missing credentials", missing.into()));
    }

    let issued = auth::login(&state.db, &state.config, &request.username, &request.password).await?;
    Ok(Json(LoginResponse {
        token: issued.token,
        expires_in: issued.expires_in,
    }))
}
