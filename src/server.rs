//! # Server Configuration
//!
//! This module contains the server setup and configuration for the Catalog API.

use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::cache::{InMemoryTagCache, TagAwareCache};
use crate::config::AppConfig;
use crate::handlers;
use crate::telemetry::trace_id_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub cache: Arc<dyn TagAwareCache>,
}

impl AppState {
    /// Builds the state with an in-memory cache sized from the configuration.
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Self {
        let cache = Arc::new(InMemoryTagCache::new(config.cache_capacity));
        Self {
            config: Arc::new(config),
            db,
            cache,
        }
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.config)
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/api/users/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route(
            "/api/customers/{customer_id}/users",
            get(handlers::customers::list_customer_users),
        )
        .route(
            "/api/customers/{customer_id}/users/{id}",
            get(handlers::customers::get_customer_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/api/login_check", post(handlers::auth::login_check))
        .route("/api/products", get(handlers::products::list_products))
        .route("/api/products/{id}", get(handlers::products::get_product))
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(trace_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                trace_id = tracing::field::Empty,
            )
        }))
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    // Resolve the configured bind address
    let addr = config
        .bind_addr()
        .map_err(|e| anyhow::anyhow!("Invalid server address {}: {}", config.api_bind_addr, e))?;
    let profile = config.profile.clone();

    let app = create_app(AppState::new(config, db));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::auth::login_check,
        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::create_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::customers::list_customer_users,
        crate::handlers::customers::get_customer_user,
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthStatus,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::LoginResponse,
            crate::services::UserPayload,
            crate::resources::UserResource,
            crate::resources::UserLinks,
            crate::resources::Link,
            crate::resources::ProductResource,
            crate::resources::BrandResource,
            crate::error::ApiError,
        )
    ),
    modifiers(&BearerAuth),
    info(
        title = "Catalog API",
        description = "Customers, users and product catalog with versioned representations",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
