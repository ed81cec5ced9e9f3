//! Database seeding functionality
//!
//! This module provides functionality to seed the database with demo data
//! for local development: brands, customers, products and users.

pub mod demo;

pub use demo::{SeedReport, seed_demo_data};
