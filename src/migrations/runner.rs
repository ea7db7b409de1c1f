//! Applies pending migrations and tracks them in the `migrations` table.

use super::{Migration, builtin_migrations};
use crate::db::DbPool;
use crate::error::{DbError, DbResult};
use crate::models::{DatabaseType, QueryParam, Row};
use crate::query::{BuiltQuery, DeleteBuilder, InsertBuilder, SelectBuilder, SortOrder};
use crate::schema::tables::{MIGRATIONS, migrations as migrations_table};
use crate::schema::{core_tables, render_create_table};
use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// A migration applied by [`MigrationRunner::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedMigration {
    pub version: String,
    pub name: String,
    pub statements: usize,
}

/// Outcome of one [`MigrationRunner::run`] call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MigrationReport {
    pub applied: Vec<AppliedMigration>,
    /// Versions that were already recorded
    pub skipped: Vec<String>,
}

/// Applied/pending state of a known migration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStatus {
    pub version: String,
    pub name: String,
    pub executed_at: Option<DateTime<Utc>>,
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        self.executed_at.is_some()
    }
}

/// Runs migrations against one pool.
///
/// Each migration runs inside its own transaction together with the insert
/// that records it, so a recorded version is always a completed one.
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    pool: DbPool,
    migrations: Vec<Migration>,
}

impl MigrationRunner {
    /// Runner for the built-in migrations.
    pub fn new(pool: DbPool) -> Self {
        Self::with_migrations(pool, builtin_migrations())
    }

    pub fn with_migrations(pool: DbPool, mut migrations: Vec<Migration>) -> Self {
        migrations.sort_by(|a, b| a.version.cmp(b.version));
        Self { pool, migrations }
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    fn db_type(&self) -> DatabaseType {
        self.pool.db_type()
    }

    /// Create the tracking table if it does not exist.
    pub async fn ensure_migrations_table(&self) -> DbResult<()> {
        for sql in render_create_table(&migrations_table(), self.db_type()) {
            self.pool.query(&sql, &[]).await?;
        }
        Ok(())
    }

    /// Recorded versions with their execution time.
    async fn recorded(&self) -> DbResult<HashMap<String, Option<DateTime<Utc>>>> {
        let result = SelectBuilder::new()
            .select(["version", "executed_at"])
            .from(MIGRATIONS)
            .order_by("version", SortOrder::Asc)
            .execute(&self.pool)
            .await?;

        result
            .rows
            .iter()
            .map(|row| Ok((row.get_str("version")?, row.get_opt_datetime("executed_at")?)))
            .collect()
    }

    /// Versions already applied, ascending.
    pub async fn applied_versions(&self) -> DbResult<Vec<String>> {
        self.ensure_migrations_table().await?;
        let mut versions: Vec<String> = self.recorded().await?.into_keys().collect();
        versions.sort();
        Ok(versions)
    }

    /// Apply every pending migration in version order.
    ///
    /// Stops at the first failure; migrations applied before it stay applied.
    pub async fn run(&self) -> DbResult<MigrationReport> {
        self.ensure_migrations_table().await?;
        let recorded = self.recorded().await?;
        let mut report = MigrationReport::default();

        for migration in &self.migrations {
            if recorded.contains_key(migration.version) {
                debug!(version = migration.version, "Migration already applied");
                report.skipped.push(migration.version.to_string());
                continue;
            }
            let statements = self.apply(migration).await?;
            info!(
                version = migration.version,
                name = migration.name,
                statements,
                "Applied migration"
            );
            report.applied.push(AppliedMigration {
                version: migration.version.to_string(),
                name: migration.name.to_string(),
                statements,
            });
        }

        Ok(report)
    }

    async fn apply(&self, migration: &Migration) -> DbResult<usize> {
        let fail = |err: DbError| DbError::migration(migration.version, migration.name, err);
        let db = self.db_type();

        let mut statements = (migration.up)(db).map_err(fail)?;
        let tracking = InsertBuilder::new()
            .into(MIGRATIONS)
            .columns(["version", "name", "executed_at"])
            .values([
                migration.version.into(),
                migration.name.into(),
                QueryParam::from(Utc::now().trunc_subsecs(3)),
            ])
            .build_for(db)
            .map_err(fail)?;
        statements.push(tracking);

        self.run_statements(statements).await.map_err(fail)
    }

    async fn run_statements(&self, statements: Vec<BuiltQuery>) -> DbResult<usize> {
        self.pool
            .transaction(move |tx| {
                Box::pin(async move {
                    for statement in &statements {
                        statement.execute_in(tx).await?;
                    }
                    Ok::<_, DbError>(statements.len())
                })
            })
            .await
    }

    /// Applied/pending state of every known migration.
    pub async fn status(&self) -> DbResult<Vec<MigrationStatus>> {
        self.ensure_migrations_table().await?;
        let recorded = self.recorded().await?;
        Ok(self
            .migrations
            .iter()
            .map(|m| MigrationStatus {
                version: m.version.to_string(),
                name: m.name.to_string(),
                executed_at: recorded.get(m.version).copied().flatten(),
            })
            .collect())
    }

    /// Row count of every domain table.
    pub async fn table_counts(&self) -> DbResult<Vec<(String, i64)>> {
        let mut counts = Vec::new();
        for table in core_tables() {
            let result = SelectBuilder::new()
                .select(["COUNT(*) AS total"])
                .from(table.name)
                .execute(&self.pool)
                .await?;
            let total = result.first().map(|row: &Row| row.get_i64("total")).transpose()?;
            counts.push((table.name.to_string(), total.unwrap_or(0)));
        }
        Ok(counts)
    }

    /// Undo the most recently applied migration. Returns its version.
    pub async fn revert_last(&self) -> DbResult<Option<String>> {
        let applied = self.applied_versions().await?;
        let Some(last) = applied.last() else {
            return Ok(None);
        };
        let Some(migration) = self.migrations.iter().find(|m| m.version == last) else {
            warn!(version = %last, "Recorded migration is unknown to this build");
            return Err(DbError::migration(
                last.clone(),
                "unknown",
                DbError::internal("no down statements for this version"),
            ));
        };

        let fail = |err: DbError| DbError::migration(migration.version, migration.name, err);
        let db = self.db_type();
        let mut statements = (migration.down)(db).map_err(fail)?;
        statements.push(
            DeleteBuilder::new()
                .from(MIGRATIONS)
                .where_("version = ?", [migration.version])
                .build_for(db)
                .map_err(fail)?,
        );

        self.run_statements(statements).await.map_err(fail)?;
        info!(version = migration.version, name = migration.name, "Reverted migration");
        Ok(Some(migration.version.to_string()))
    }
}
