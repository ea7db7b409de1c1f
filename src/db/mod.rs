//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Connection pools per engine and the named connection registry
//! - Statement execution with per-engine placeholder rendering
//! - Scoped transactions
//! - Type mappings from native rows to [`Row`](crate::models::Row)

pub mod dialect;
pub(crate) mod executor;
#[cfg(feature = "oracle")]
pub mod oracle;
pub(crate) mod params;
pub mod pool;
pub mod transaction;
pub mod types;

pub use dialect::{count_placeholders, render_placeholders, returns_rows};
pub use pool::{ConnectionRegistry, DbPool};
pub use transaction::DbTransaction;
