//! Connection pool management.
//!
//! This module provides connection pooling using database-specific pools
//! (MySqlPool, PgPool, SqlitePool, and an OCI session pool for Oracle) behind
//! one [`DbPool`] handle, plus the process-wide [`ConnectionRegistry`].

use crate::config::{DatabaseConfig, EngineOptions};
use crate::db::executor;
#[cfg(feature = "oracle")]
use crate::db::oracle::OraclePool;
use crate::db::transaction::DbTransaction;
use crate::error::{DbError, DbResult};
use crate::models::{DatabaseType, QueryParam, QueryResult};
use crate::service::DatabaseService;
use futures_util::future::{BoxFuture, join_all};
use sqlx::{
    MySqlPool, PgPool, SqlitePool,
    mysql::{MySqlConnectOptions, MySqlPoolOptions},
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Database-specific connection pool (avoids AnyPool limitations).
#[derive(Debug, Clone)]
pub enum DbPool {
    MySql(MySqlPool),
    Postgres(PgPool),
    SQLite(SqlitePool),
    #[cfg(feature = "oracle")]
    Oracle(OraclePool),
}

impl DbPool {
    /// Open a pool for a resolved configuration.
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        let pool_opts = &config.pool;
        let idle_timeout = Some(pool_opts.idle_timeout());
        let acquire_timeout = pool_opts.acquire_timeout();

        match config.db_type {
            DatabaseType::MySQL => {
                let mut options = MySqlConnectOptions::new()
                    .host(&config.host)
                    .port(config.port.unwrap_or(3306))
                    .username(&config.username)
                    .database(&config.database);
                if !config.password.is_empty() {
                    options = options.password(&config.password);
                }
                if let EngineOptions::MySql { charset, timezone } = &config.engine {
                    options = options.charset(charset).timezone(Some(timezone.clone()));
                }

                let pool = MySqlPoolOptions::new()
                    .min_connections(pool_opts.min_connections)
                    .max_connections(pool_opts.max_connections)
                    .acquire_timeout(acquire_timeout)
                    .idle_timeout(idle_timeout)
                    .connect_with(options)
                    .await
                    .map_err(|e| {
                        DbError::connection(
                            format!("Failed to connect: {}", e),
                            connection_suggestion(config.db_type, &e),
                        )
                    })?;
                Ok(DbPool::MySql(pool))
            }
            DatabaseType::PostgreSQL => {
                let ssl = matches!(config.engine, EngineOptions::Postgres { ssl: true });
                let options = PgConnectOptions::new()
                    .host(&config.host)
                    .port(config.port.unwrap_or(5432))
                    .username(&config.username)
                    .password(&config.password)
                    .database(&config.database)
                    .ssl_mode(if ssl {
                        PgSslMode::Require
                    } else {
                        PgSslMode::Prefer
                    });

                let pool = PgPoolOptions::new()
                    .min_connections(pool_opts.min_connections)
                    .max_connections(pool_opts.max_connections)
                    .acquire_timeout(acquire_timeout)
                    .idle_timeout(idle_timeout)
                    .connect_with(options)
                    .await
                    .map_err(|e| {
                        DbError::connection(
                            format!("Failed to connect: {}", e),
                            connection_suggestion(config.db_type, &e),
                        )
                    })?;
                Ok(DbPool::Postgres(pool))
            }
            DatabaseType::SQLite => {
                let in_memory = config.database == ":memory:";
                let options = if in_memory {
                    SqliteConnectOptions::from_str("sqlite::memory:")?
                } else {
                    SqliteConnectOptions::new()
                        .filename(&config.database)
                        .create_if_missing(true)
                }
                .foreign_keys(true);

                // An in-memory database lives exactly as long as its connection
                let (idle_timeout, max_lifetime) = if in_memory {
                    (None, None)
                } else {
                    (idle_timeout, Some(std::time::Duration::from_secs(30 * 60)))
                };

                let pool = SqlitePoolOptions::new()
                    .min_connections(pool_opts.min_connections)
                    .max_connections(pool_opts.max_connections)
                    .acquire_timeout(acquire_timeout)
                    .idle_timeout(idle_timeout)
                    .max_lifetime(max_lifetime)
                    .connect_with(options)
                    .await
                    .map_err(|e| {
                        DbError::connection(
                            format!("Failed to connect: {}", e),
                            connection_suggestion(config.db_type, &e),
                        )
                    })?;
                Ok(DbPool::SQLite(pool))
            }
            #[cfg(feature = "oracle")]
            DatabaseType::Oracle => Ok(DbPool::Oracle(OraclePool::connect(config).await?)),
            #[cfg(not(feature = "oracle"))]
            DatabaseType::Oracle => Err(DbError::configuration(
                "Oracle support is not compiled in; rebuild with `--features oracle`",
            )),
        }
    }

    /// Get the database type for this pool.
    pub fn db_type(&self) -> DatabaseType {
        match self {
            DbPool::MySql(_) => DatabaseType::MySQL,
            DbPool::Postgres(_) => DatabaseType::PostgreSQL,
            DbPool::SQLite(_) => DatabaseType::SQLite,
            #[cfg(feature = "oracle")]
            DbPool::Oracle(_) => DatabaseType::Oracle,
        }
    }

    /// Run one statement on a pooled connection.
    pub async fn query(&self, sql: &str, params: &[QueryParam]) -> DbResult<QueryResult> {
        match self {
            DbPool::MySql(pool) => {
                let mut conn = pool.acquire().await?;
                executor::mysql::run(&mut conn, sql, params).await
            }
            DbPool::Postgres(pool) => {
                let mut conn = pool.acquire().await?;
                executor::postgres::run(&mut conn, sql, params).await
            }
            DbPool::SQLite(pool) => {
                let mut conn = pool.acquire().await?;
                executor::sqlite::run(&mut conn, sql, params).await
            }
            #[cfg(feature = "oracle")]
            DbPool::Oracle(pool) => pool.query(sql, params).await,
        }
    }

    async fn begin(&self) -> DbResult<DbTransaction> {
        Ok(match self {
            DbPool::MySql(pool) => DbTransaction::MySql(pool.begin().await?),
            DbPool::Postgres(pool) => DbTransaction::Postgres(pool.begin().await?),
            DbPool::SQLite(pool) => DbTransaction::SQLite(pool.begin().await?),
            #[cfg(feature = "oracle")]
            DbPool::Oracle(pool) => DbTransaction::Oracle(pool.begin().await?),
        })
    }

    /// Run `work` inside one transaction.
    ///
    /// Commits when `work` returns `Ok`. On `Err` the transaction is rolled
    /// back and the original error is returned; a failed rollback is logged.
    pub async fn transaction<T, F>(&self, work: F) -> DbResult<T>
    where
        F: for<'t> FnOnce(&'t mut DbTransaction) -> BoxFuture<'t, DbResult<T>>,
    {
        let mut tx = self.begin().await?;
        match work(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "Rolling back transaction");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        match self {
            DbPool::MySql(pool) => pool.close().await,
            DbPool::Postgres(pool) => pool.close().await,
            DbPool::SQLite(pool) => pool.close().await,
            #[cfg(feature = "oracle")]
            DbPool::Oracle(pool) => pool.close().await,
        }
    }

    /// Whether the pool is open and holds at least one live connection.
    pub fn is_connected(&self) -> bool {
        match self {
            DbPool::MySql(pool) => !pool.is_closed() && pool.size() > 0,
            DbPool::Postgres(pool) => !pool.is_closed() && pool.size() > 0,
            DbPool::SQLite(pool) => !pool.is_closed() && pool.size() > 0,
            #[cfg(feature = "oracle")]
            DbPool::Oracle(pool) => pool.is_connected(),
        }
    }

    /// Get the server version from the connected database.
    pub async fn server_version(&self) -> Option<String> {
        let sql = match self.db_type() {
            DatabaseType::MySQL | DatabaseType::PostgreSQL => "SELECT version() AS version",
            DatabaseType::SQLite => "SELECT sqlite_version() AS version",
            DatabaseType::Oracle => {
                #[cfg(feature = "oracle")]
                if let DbPool::Oracle(pool) = self {
                    return match pool.server_version().await {
                        Ok(version) => Some(version),
                        Err(e) => {
                            warn!(error = %e, "Failed to get server version");
                            None
                        }
                    };
                }
                return None;
            }
        };
        match self.query(sql, &[]).await {
            Ok(result) => {
                let version = result.first().and_then(|row| row.get_str("version").ok());
                debug!(version = ?version, "Got server version");
                version
            }
            Err(e) => {
                warn!(error = %e, "Failed to get server version");
                None
            }
        }
    }
}

/// Generate a helpful suggestion for connection errors.
fn connection_suggestion(db_type: DatabaseType, error: &sqlx::Error) -> String {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        return format!(
            "Check that the {} server is running and accessible",
            db_type
        );
    }

    if error_str.contains("authentication") || error_str.contains("password") {
        return "Verify DB_USER and DB_PASSWORD".to_string();
    }

    if error_str.contains("does not exist") || error_str.contains("unknown database") {
        return "Check that the database named by DB_NAME exists".to_string();
    }

    if error_str.contains("tls") || error_str.contains("ssl") {
        return "Check TLS/SSL configuration or set DB_SSL=false".to_string();
    }

    if error_str.contains("pool timed out") {
        return "All pooled connections are busy; raise DB_POOL_MAX or check for leaked transactions"
            .to_string();
    }

    match db_type {
        DatabaseType::SQLite => "Verify the database file path is writable".to_string(),
        _ => format!(
            "Verify DB_HOST and DB_PORT point at a reachable {} server",
            db_type
        ),
    }
}

/// Process-wide registry of named connection pools.
///
/// Cloning is cheap; clones share the same set of pools.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    pools: Arc<RwLock<HashMap<String, DbPool>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open and register a pool under `name`.
    ///
    /// Connecting a name that is already registered returns the existing pool
    /// without opening a new one.
    pub async fn connect(&self, name: &str, config: &DatabaseConfig) -> DbResult<DbPool> {
        if let Some(pool) = self.pools.read().await.get(name) {
            debug!(connection = %name, "Reusing registered connection");
            return Ok(pool.clone());
        }

        info!(
            connection = %name,
            db_type = %config.db_type,
            target = %config.masked(),
            "Connecting to database"
        );
        let pool = DbPool::connect(config).await?;

        // Re-check after async work; a concurrent connect may have won
        let (registered, loser) = {
            let mut pools = self.pools.write().await;
            match pools.get(name) {
                Some(existing) => (existing.clone(), Some(pool)),
                None => {
                    pools.insert(name.to_string(), pool.clone());
                    (pool, None)
                }
            }
        };

        if let Some(loser) = loser {
            loser.close().await;
            debug!(connection = %name, "Discarded pool from concurrent connect");
        } else {
            info!(connection = %name, "Connected successfully");
        }
        Ok(registered)
    }

    /// Get a registered pool by name.
    pub async fn get(&self, name: &str) -> DbResult<DbPool> {
        self.pools
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::connection_not_found(name))
    }

    /// Data-access service bound to a registered pool.
    pub async fn service(&self, name: &str) -> DbResult<DatabaseService> {
        Ok(DatabaseService::new(self.get(name).await?))
    }

    /// Registered names, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pools.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn is_connected(&self, name: &str) -> bool {
        self.pools
            .read()
            .await
            .get(name)
            .is_some_and(DbPool::is_connected)
    }

    /// Close and forget one pool. Returns `false` when `name` was not registered.
    pub async fn disconnect(&self, name: &str) -> bool {
        let removed = self.pools.write().await.remove(name);
        match removed {
            Some(pool) => {
                pool.close().await;
                info!(connection = %name, "Connection closed");
                true
            }
            None => false,
        }
    }

    /// Close every registered pool concurrently.
    pub async fn disconnect_all(&self) {
        let drained: Vec<(String, DbPool)> = self.pools.write().await.drain().collect();
        join_all(drained.iter().map(|(name, pool)| async move {
            pool.close().await;
            info!(connection = %name, "Connection closed");
        }))
        .await;
        info!("All connections closed");
    }

    /// Shutdown hook; closes everything.
    pub async fn shutdown(&self) {
        self.disconnect_all().await;
    }
}
