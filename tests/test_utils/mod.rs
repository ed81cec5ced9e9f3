//! Test utilities for database and router testing.
//!
//! This module provides utilities for setting up in-memory SQLite databases
//! with migrations, seeding fixtures and driving the full router with
//! `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use anyhow::Result;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use catalog::{
    auth::{Role, hash_password, issue_token},
    config::AppConfig,
    models::{customer, user},
    repositories::{
        BrandRepository, CustomerRepository, ProductRepository, UserRepository,
        customer::NewCustomer, product::NewProduct, user::UserFields,
    },
    server::{AppState, create_app},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use tower::ServiceExt;

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// The pool holds a single connection so every query sees the same
/// in-memory database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;

    Migrator::up(&db, None).await?;

    Ok(db)
}

pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        database_url: "sqlite::memory:".to_string(),
        ..Default::default()
    }
}

/// Application under test together with its database.
pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    pub config: AppConfig,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> Result<Self> {
        let db = setup_test_db().await?;
        let router = create_app(AppState::new(config.clone(), db.clone()));
        Ok(Self { router, db, config })
    }

    /// Sends one request through the router and returns status, headers and JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        accept: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(accept) = accept {
            builder = builder.header(header::ACCEPT, accept);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, headers, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, HeaderMap, Value) {
        self.request(Method::GET, uri, token, None, None).await
    }

    /// Creates a customer holding `ROLE_CUSTOMER` and returns it with a valid token.
    pub async fn customer(&self, name: &str) -> (customer::Model, String) {
        self.insert_customer(name, String::new(), vec![Role::Customer])
            .await
    }

    /// Same as [`TestApp::customer`] with a real password hash, for login tests.
    pub async fn customer_with_password(
        &self,
        name: &str,
        password: &str,
        roles: Vec<Role>,
    ) -> (customer::Model, String) {
        self.insert_customer(name, hash_password(password).unwrap(), roles)
            .await
    }

    async fn insert_customer(
        &self,
        name: &str,
        password_hash: String,
        roles: Vec<Role>,
    ) -> (customer::Model, String) {
        let created = CustomerRepository::new(&self.db)
            .create(NewCustomer {
                name: name.to_string(),
                email: format!("{}@pro.com", name.to_lowercase()),
                roles,
                password_hash,
            })
            .await
            .unwrap();
        let token = issue_token(&self.config, &created).unwrap().token;
        (created, token)
    }

    /// Inserts a user directly, bypassing the API and its cache invalidation.
    pub async fn insert_user(&self, customer_id: i32, email: &str) -> user::Model {
        UserRepository::new(&self.db)
            .create(
                customer_id,
                UserFields {
                    username: "direct".to_string(),
                    first_name: "Direct".to_string(),
                    last_name: "Insert".to_string(),
                    email: email.to_string(),
                },
            )
            .await
            .unwrap()
    }

    /// Inserts `count` products of one brand and returns their ids.
    pub async fn insert_products(&self, brand: &str, count: usize) -> Vec<i32> {
        let brand = BrandRepository::new(&self.db)
            .find_or_create(brand)
            .await
            .unwrap();
        let mut ids = Vec::with_capacity(count);
        for index in 0..count {
            let product = ProductRepository::new(&self.db)
                .create(NewProduct {
                    name: format!("{} {}", brand.name, index + 1),
                    description: "Smartphone".to_string(),
                    price_cents: 99_999,
                    brand_id: brand.id,
                })
                .await
                .unwrap();
            ids.push(product.id);
        }
        ids
    }
}

pub fn user_body(first_name: &str, email: &str) -> Value {
    serde_json::json!({
        "username": first_name,
        "first_name": first_name,
        "last_name": "doe",
        "email": email,
    })
}
