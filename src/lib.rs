//! # Catalog API Library
//!
//! This library provides the core functionality for the Catalog API service:
//! customers and their users, a public product catalog, response caching,
//! version negotiation and token authentication.

pub mod access;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod repositories;
pub mod resources;
pub mod seeds;
pub mod server;
pub mod services;
pub mod telemetry;
pub mod text;
pub mod versioning;
pub use migration;
