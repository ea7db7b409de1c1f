//! HushRyd database layer.
//!
//! This library provides the persistence layer of the HushRyd ride-sharing
//! platform on MySQL, PostgreSQL, Oracle (feature `oracle`) or SQLite:
//! configuration resolution, a fluent query builder, pooled connections with
//! closure-scoped transactions, versioned migrations and a typed data-access
//! service.

pub mod config;
pub mod db;
pub mod error;
pub mod migrations;
pub mod models;
pub mod query;
pub mod schema;
pub mod service;

pub use config::{Config, DatabaseConfig};
pub use db::{ConnectionRegistry, DbPool, DbTransaction};
pub use error::{DbError, DbResult};
pub use migrations::MigrationRunner;
pub use service::DatabaseService;
