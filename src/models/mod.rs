//! # Data Models
//!
//! This module contains all the data models used throughout the Catalog API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod brand;
pub mod customer;
pub mod product;
pub mod user;

pub use brand::Entity as Brand;
pub use customer::Entity as Customer;
pub use product::Entity as Product;
pub use user::Entity as User;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "catalog".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
