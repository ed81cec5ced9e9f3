//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM operations
//! for database entities, providing a clean API for data access.

pub mod brand;
pub mod customer;
pub mod product;
pub mod user;

pub use brand::BrandRepository;
pub use customer::CustomerRepository;
pub use product::ProductRepository;
pub use user::UserRepository;
