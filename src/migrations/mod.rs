//! Versioned schema and data migrations.
//!
//! A [`Migration`] is a pair of statement generators, one per direction.
//! Statements are rendered for the target engine when the migration runs, so
//! the same migration list serves MySQL, PostgreSQL, Oracle and SQLite.

mod runner;
mod seed;

pub use runner::{AppliedMigration, MigrationReport, MigrationRunner, MigrationStatus};

use crate::error::DbResult;
use crate::models::DatabaseType;
use crate::query::BuiltQuery;
use crate::schema::{core_tables, render_create_table, render_drop_table};

/// Generates the statements of one migration direction for an engine.
pub type StatementFn = fn(DatabaseType) -> DbResult<Vec<BuiltQuery>>;

#[derive(Clone, Copy)]
pub struct Migration {
    /// Zero-padded, sortable version such as `"001"`
    pub version: &'static str,
    pub name: &'static str,
    pub up: StatementFn,
    pub down: StatementFn,
}

impl Migration {
    /// `version_name`, as printed by the CLI.
    pub fn label(&self) -> String {
        format!("{}_{}", self.version, self.name)
    }
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("version", &self.version)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The migrations shipped with the crate, in version order.
pub fn builtin_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: "001",
            name: "create_core_tables",
            up: create_core_tables,
            down: drop_core_tables,
        },
        Migration {
            version: "002",
            name: "seed_sample_data",
            up: seed::seed_statements,
            down: seed::unseed_statements,
        },
    ]
}

fn create_core_tables(db: DatabaseType) -> DbResult<Vec<BuiltQuery>> {
    Ok(core_tables()
        .iter()
        .flat_map(|table| render_create_table(table, db))
        .map(BuiltQuery::raw)
        .collect())
}

fn drop_core_tables(db: DatabaseType) -> DbResult<Vec<BuiltQuery>> {
    Ok(core_tables()
        .iter()
        .rev()
        .map(|table| BuiltQuery::raw(render_drop_table(table.name, db)))
        .collect())
}
