//! # Authentication
//!
//! Customers log in with email and password and receive an HS256 bearer
//! token. Protected routes run [`auth_middleware`], which decodes the token,
//! reloads the customer and stores the resulting [`Identity`] in request
//! extensions for handlers to extract.

use std::fmt;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;
use crate::error::{ApiError, RepositoryError, unauthorized};
use crate::models::customer::Model as CustomerModel;
use crate::repositories::CustomerRepository;
use crate::server::AppState;

/// Roles granted to customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_CUSTOMER")]
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Customer => "ROLE_CUSTOMER",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ROLE_USER" => Some(Role::User),
            "ROLE_CUSTOMER" => Some(Role::Customer),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated customer acting on a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub customer_id: i32,
    pub email: String,
    pub roles: Vec<Role>,
}

impl Identity {
    /// Builds the identity of a stored customer. `ROLE_USER` is always granted.
    pub fn from_customer(customer: &CustomerModel) -> Self {
        let mut roles = vec![Role::User];
        for role in customer
            .role_names()
            .iter()
            .filter_map(|name| Role::from_name(name))
        {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }

        Self {
            customer_id: customer.id,
            email: customer.email.clone(),
            roles,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// JWT claims issued at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Customer id
    pub sub: String,
    pub email: String,
    pub roles: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Authentication failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,
    #[error("Authorization header must use Bearer scheme")]
    MalformedHeader,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Customer no longer exists")]
    UnknownCustomer,
    #[error("authentication backend failure: {0}")]
    Internal(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Hashes a password for storage using Argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Internal(err.to_string()))
}

/// Checks `password` against a stored PHC hash. Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        tracing::warn!("Stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Signed token returned by the login endpoint.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

/// Issues a token for `customer` valid for the configured TTL.
pub fn issue_token(config: &AppConfig, customer: &CustomerModel) -> Result<IssuedToken, AuthError> {
    let identity = Identity::from_customer(customer);
    let now = Utc::now().timestamp();
    let ttl = i64::try_from(config.jwt_ttl_seconds).unwrap_or(i64::MAX);
    let claims = Claims {
        sub: customer.id.to_string(),
        email: identity.email,
        roles: identity.roles.iter().map(|r| r.as_str().to_string()).collect(),
        iat: now,
        exp: now.saturating_add(ttl),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_signing_secret().as_bytes()),
    )
    .map_err(|err| AuthError::Internal(err.to_string()))?;

    Ok(IssuedToken {
        token,
        expires_in: config.jwt_ttl_seconds,
    })
}

/// Verifies signature and expiry and returns the claims.
pub fn decode_token(config: &AppConfig, token: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_signing_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|err| {
        tracing::debug!(error = %err, "Rejected bearer token");
        AuthError::InvalidToken
    })
}

/// Verifies login credentials and issues a token.
pub async fn login(
    db: &DatabaseConnection,
    config: &AppConfig,
    email: &str,
    password: &str,
) -> Result<IssuedToken, AuthError> {
    let customer = CustomerRepository::new(db)
        .find_by_email(email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(password, &customer.password_hash) {
        tracing::info!(customer_id = customer.id, "Rejected login attempt");
        return Err(AuthError::InvalidCredentials);
    }

    tracing::info!(customer_id = customer.id, "Customer logged in");
    issue_token(config, &customer)
}

/// Resolves the identity behind a bearer token.
pub async fn authenticate(
    db: &DatabaseConnection,
    config: &AppConfig,
    token: &str,
) -> Result<Identity, AuthError> {
    let claims = decode_token(config, token)?;
    let customer_id: i32 = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

    let customer = CustomerRepository::new(db)
        .find_by_id(customer_id)
        .await?
        .ok_or(AuthError::UnknownCustomer)?;

    Ok(Identity::from_customer(&customer))
}

/// Authentication middleware that validates bearer tokens and attaches the [`Identity`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?;
    let identity = authenticate(&state.db, &state.config, token).await?;

    tracing::debug!(customer_id = identity.customer_id, "Authenticated customer request");
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MalformedHeader)
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(|| unauthorized(Some("Customer authentication required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn customer(roles: serde_json::Value) -> CustomerModel {
        CustomerModel {
            id: 7,
            name: "Orange".to_string(),
            slug: "orange".to_string(),
            email: "orange@pro.com".to_string(),
            roles,
            password_hash: String::new(),
        }
    }

    #[test]
    fn identity_always_has_user_role() {
        let identity = Identity::from_customer(&customer(json!(["ROLE_CUSTOMER", "ROLE_UNKNOWN"])));
        assert_eq!(identity.roles, vec![Role::User, Role::Customer]);

        let bare = Identity::from_customer(&customer(json!([])));
        assert!(bare.has_role(Role::User));
        assert!(!bare.has_role(Role::Customer));
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("secret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secret", &hash));
        assert!(!verify_password("Secret", &hash));
        assert!(!verify_password("secret", "not-a-hash"));
    }

    #[test]
    fn issued_token_decodes_with_same_secret() {
        let config = AppConfig::default();
        let issued = issue_token(&config, &customer(json!(["ROLE_CUSTOMER"]))).unwrap();

        let claims = decode_token(&config, &issued.token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.roles, vec!["ROLE_USER", "ROLE_CUSTOMER"]);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = AppConfig {
            jwt_secret: Some("a".repeat(32)),
            ..Default::default()
        };
        let verifier = AppConfig {
            jwt_secret: Some("b".repeat(32)),
            ..Default::default()
        };
        let issued = issue_token(&issuer, &customer(json!([]))).unwrap();

        assert!(matches!(
            decode_token(&verifier, &issued.token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = AppConfig::default();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "7".to_string(),
            email: "orange@pro.com".to_string(),
            roles: vec![],
            iat: now - 120,
            exp: now - 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.jwt_signing_secret().as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            decode_token(&config, &token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            extract_bearer_token(&headers),
            Err(AuthError::MissingToken)
        ));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            extract_bearer_token(&headers),
            Err(AuthError::MalformedHeader)
        ));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def");
    }
}
