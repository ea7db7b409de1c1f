//! Scoped transactions.
//!
//! A [`DbTransaction`] pins one connection from a pool. It is only handed out
//! by [`DbPool::transaction`](crate::db::DbPool::transaction), which commits
//! when the unit of work succeeds and rolls back when it fails.

use crate::db::executor;
#[cfg(feature = "oracle")]
use crate::db::oracle::OracleTransaction;
use crate::error::{DbError, DbResult};
use crate::models::{DatabaseType, QueryParam, QueryResult};
use futures_util::future::BoxFuture;
use sqlx::{MySql, Postgres, Sqlite, Transaction};

/// Database-specific transaction wrapper.
pub enum DbTransaction {
    MySql(Transaction<'static, MySql>),
    Postgres(Transaction<'static, Postgres>),
    SQLite(Transaction<'static, Sqlite>),
    #[cfg(feature = "oracle")]
    Oracle(OracleTransaction),
}

impl std::fmt::Debug for DbTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DbTransaction").field(&self.db_type()).finish()
    }
}

impl DbTransaction {
    /// Get the database type for this transaction.
    pub fn db_type(&self) -> DatabaseType {
        match self {
            DbTransaction::MySql(_) => DatabaseType::MySQL,
            DbTransaction::Postgres(_) => DatabaseType::PostgreSQL,
            DbTransaction::SQLite(_) => DatabaseType::SQLite,
            #[cfg(feature = "oracle")]
            DbTransaction::Oracle(_) => DatabaseType::Oracle,
        }
    }

    /// Run one statement on the transaction's connection.
    pub async fn query(&mut self, sql: &str, params: &[QueryParam]) -> DbResult<QueryResult> {
        match self {
            DbTransaction::MySql(tx) => executor::mysql::run(&mut **tx, sql, params).await,
            DbTransaction::Postgres(tx) => executor::postgres::run(&mut **tx, sql, params).await,
            DbTransaction::SQLite(tx) => executor::sqlite::run(&mut **tx, sql, params).await,
            #[cfg(feature = "oracle")]
            DbTransaction::Oracle(tx) => tx.query(sql, params).await,
        }
    }

    /// Nested transactions are rejected; compose work inside the outer one.
    pub async fn transaction<T, F>(&mut self, _work: F) -> DbResult<T>
    where
        F: for<'t> FnOnce(&'t mut DbTransaction) -> BoxFuture<'t, DbResult<T>>,
    {
        Err(DbError::transaction("nested transactions are not supported"))
    }

    /// Commit the transaction.
    pub async fn commit(self) -> DbResult<()> {
        match self {
            DbTransaction::MySql(tx) => tx.commit().await.map_err(DbError::from),
            DbTransaction::Postgres(tx) => tx.commit().await.map_err(DbError::from),
            DbTransaction::SQLite(tx) => tx.commit().await.map_err(DbError::from),
            #[cfg(feature = "oracle")]
            DbTransaction::Oracle(tx) => tx.commit().await,
        }
    }

    /// Rollback the transaction.
    pub async fn rollback(self) -> DbResult<()> {
        match self {
            DbTransaction::MySql(tx) => tx.rollback().await.map_err(DbError::from),
            DbTransaction::Postgres(tx) => tx.rollback().await.map_err(DbError::from),
            DbTransaction::SQLite(tx) => tx.rollback().await.map_err(DbError::from),
            #[cfg(feature = "oracle")]
            DbTransaction::Oracle(tx) => tx.rollback().await,
        }
    }
}
