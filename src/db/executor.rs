//! Statement execution against a single connection.
//!
//! Pooled queries acquire a connection and transactions hand in their own, so
//! both paths share the per-engine `run` functions below.
//!
//! # Architecture
//!
//! The executor uses database-specific implementations organized in submodules:
//! - `mysql`: MySQL statement execution
//! - `postgres`: PostgreSQL statement execution (placeholders rewritten to `$n`)
//! - `sqlite`: SQLite statement execution
//!
//! Statements that produce rows (see [`returns_rows`]) are fetched in full and
//! report `row_count` as the number of rows; everything else reports rows affected.

use crate::db::dialect::{render_placeholders, returns_rows};
use crate::db::types::IntoRow;
use crate::error::DbResult;
use crate::models::{QueryParam, QueryResult};
use std::time::Instant;
use tracing::debug;

fn rows_result<R: IntoRow>(rows: Vec<R>) -> QueryResult {
    QueryResult::from_rows(rows.iter().map(IntoRow::to_row).collect())
}

fn log_statement(sql: &str, params: &[QueryParam], start: Instant, row_count: u64) {
    debug!(
        sql = %sql,
        params = params.len(),
        row_count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Statement executed"
    );
}

pub(crate) mod mysql {
    use super::*;
    use crate::db::params::bind_mysql_param;
    use sqlx::{Executor, MySqlConnection};

    pub async fn run(
        conn: &mut MySqlConnection,
        sql: &str,
        params: &[QueryParam],
    ) -> DbResult<QueryResult> {
        let start = Instant::now();
        let result = if returns_rows(sql) {
            let rows = if params.is_empty() {
                // Raw SQL goes over the text protocol, which accepts any statement
                conn.fetch_all(sql).await?
            } else {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = bind_mysql_param(query, param);
                }
                query.fetch_all(&mut *conn).await?
            };
            rows_result(rows)
        } else {
            let done = if params.is_empty() {
                conn.execute(sql).await?
            } else {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = bind_mysql_param(query, param);
                }
                query.execute(&mut *conn).await?
            };
            QueryResult::affected(done.rows_affected())
        };
        log_statement(sql, params, start, result.row_count);
        Ok(result)
    }
}

pub(crate) mod postgres {
    use super::*;
    use crate::db::params::bind_postgres_param;
    use crate::models::DatabaseType;
    use sqlx::{Executor, PgConnection};

    pub async fn run(
        conn: &mut PgConnection,
        sql: &str,
        params: &[QueryParam],
    ) -> DbResult<QueryResult> {
        let start = Instant::now();
        let rendered = render_placeholders(sql, DatabaseType::PostgreSQL);
        let sql = rendered.as_ref();
        let result = if returns_rows(sql) {
            let rows = if params.is_empty() {
                conn.fetch_all(sql).await?
            } else {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = bind_postgres_param(query, param);
                }
                query.fetch_all(&mut *conn).await?
            };
            rows_result(rows)
        } else {
            let done = if params.is_empty() {
                conn.execute(sql).await?
            } else {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = bind_postgres_param(query, param);
                }
                query.execute(&mut *conn).await?
            };
            QueryResult::affected(done.rows_affected())
        };
        log_statement(sql, params, start, result.row_count);
        Ok(result)
    }
}

pub(crate) mod sqlite {
    use super::*;
    use crate::db::params::bind_sqlite_param;
    use sqlx::{Executor, SqliteConnection};

    pub async fn run(
        conn: &mut SqliteConnection,
        sql: &str,
        params: &[QueryParam],
    ) -> DbResult<QueryResult> {
        let start = Instant::now();
        let result = if returns_rows(sql) {
            let rows = if params.is_empty() {
                conn.fetch_all(sql).await?
            } else {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = bind_sqlite_param(query, param);
                }
                query.fetch_all(&mut *conn).await?
            };
            rows_result(rows)
        } else {
            let done = if params.is_empty() {
                conn.execute(sql).await?
            } else {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = bind_sqlite_param(query, param);
                }
                query.execute(&mut *conn).await?
            };
            QueryResult::affected(done.rows_affected())
        };
        log_statement(sql, params, start, result.row_count);
        Ok(result)
    }
}
