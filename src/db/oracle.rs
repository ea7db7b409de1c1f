//! Oracle adapter built on the blocking `oracle` (ODPI-C) driver.
//!
//! Every driver call runs on tokio's blocking pool. Connections come from an
//! OCI session pool; transactions pin one connection until commit/rollback.

use crate::config::DatabaseConfig;
use crate::db::dialect::{render_placeholders, returns_rows};
use crate::error::{DbError, DbResult};
use crate::models::{DatabaseType, QueryParam, QueryResult, Row};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use oracle::pool::{CloseMode, Pool, PoolBuilder};
use oracle::sql_type::{OracleType, ToSql};
use oracle::Connection;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

async fn blocking<T, F>(f: F) -> DbResult<T>
where
    F: FnOnce() -> DbResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DbError::internal(format!("Oracle worker task failed: {}", e)))?
}

/// Pooled Oracle sessions.
#[derive(Clone)]
pub struct OraclePool {
    pool: Arc<Pool>,
}

impl std::fmt::Debug for OraclePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OraclePool").finish_non_exhaustive()
    }
}

impl OraclePool {
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        let connect_string = config
            .oracle_connect_string()
            .ok_or_else(|| DbError::configuration("not an Oracle configuration"))?;
        let username = config.username.clone();
        let password = config.password.clone();
        let min = config.pool.min_connections;
        let max = config.pool.max_connections;

        let pool = blocking(move || {
            PoolBuilder::new(username, password, connect_string)
                .min_connections(min)
                .max_connections(max)
                .build()
                .map_err(|e| {
                    DbError::connection(
                        format!("Failed to connect: {}", e),
                        "Check the Oracle listener, service name/SID and credentials",
                    )
                })
        })
        .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Run one statement on a pooled session and commit it.
    pub async fn query(&self, sql: &str, params: &[QueryParam]) -> DbResult<QueryResult> {
        let pool = self.pool.clone();
        let sql = sql.to_string();
        let params = params.to_vec();
        blocking(move || {
            let conn = pool.get()?;
            let result = run(&conn, &sql, &params)?;
            conn.commit()?;
            Ok(result)
        })
        .await
    }

    pub async fn begin(&self) -> DbResult<OracleTransaction> {
        let pool = self.pool.clone();
        let conn = blocking(move || Ok(pool.get()?)).await?;
        Ok(OracleTransaction {
            conn: Arc::new(conn),
        })
    }

    pub async fn server_version(&self) -> DbResult<String> {
        let pool = self.pool.clone();
        blocking(move || {
            let conn = pool.get()?;
            let (version, banner) = conn.server_version()?;
            Ok(format!("{} ({})", banner, version))
        })
        .await
    }

    pub fn is_connected(&self) -> bool {
        self.pool.open_count().map(|n| n > 0).unwrap_or(false)
    }

    pub async fn close(&self) {
        let pool = self.pool.clone();
        let closed = blocking(move || Ok(pool.close(&CloseMode::Default)?)).await;
        if let Err(e) = closed {
            warn!(error = %e, "Failed to close Oracle pool");
        }
    }
}

/// A session pinned for the lifetime of one transaction.
pub struct OracleTransaction {
    conn: Arc<Connection>,
}

impl OracleTransaction {
    pub async fn query(&mut self, sql: &str, params: &[QueryParam]) -> DbResult<QueryResult> {
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let params = params.to_vec();
        blocking(move || run(&conn, &sql, &params)).await
    }

    pub async fn commit(self) -> DbResult<()> {
        let conn = self.conn;
        blocking(move || Ok(conn.commit()?)).await
    }

    pub async fn rollback(self) -> DbResult<()> {
        let conn = self.conn;
        blocking(move || Ok(conn.rollback()?)).await
    }
}

fn to_sql_value(param: &QueryParam) -> Box<dyn ToSql> {
    match param {
        QueryParam::Null => Box::new(None::<String>),
        QueryParam::Bool(v) => Box::new(i64::from(*v)),
        QueryParam::Int(v) => Box::new(*v),
        QueryParam::Float(v) => Box::new(*v),
        QueryParam::String(v) => Box::new(v.clone()),
        QueryParam::Timestamp(v) => Box::new(v.naive_utc()),
        QueryParam::Json(v) => Box::new(v.to_string()),
    }
}

fn run(conn: &Connection, sql: &str, params: &[QueryParam]) -> DbResult<QueryResult> {
    let start = Instant::now();
    let rendered = render_placeholders(sql, DatabaseType::Oracle);
    let sql = rendered.as_ref();
    let boxed: Vec<Box<dyn ToSql>> = params.iter().map(to_sql_value).collect();
    let bind: Vec<&dyn ToSql> = boxed.iter().map(|b| b.as_ref()).collect();

    let result = if returns_rows(sql) {
        let rows = conn.query(sql, &bind)?;
        let columns: Vec<(String, OracleType)> = rows
            .column_info()
            .iter()
            .map(|c| (c.name().to_string(), c.oracle_type().clone()))
            .collect();
        let mut out = Vec::new();
        for row in rows {
            let row = row?;
            let mut decoded = Row::new();
            for (idx, (name, oracle_type)) in columns.iter().enumerate() {
                let value = &row.sql_values()[idx];
                decoded.insert(name.as_str(), decode_value(value, oracle_type)?);
            }
            out.push(decoded);
        }
        QueryResult::from_rows(out)
    } else {
        let stmt = conn.execute(sql, &bind)?;
        QueryResult::affected(stmt.row_count()?)
    };

    debug!(
        sql = %sql,
        params = params.len(),
        row_count = result.row_count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Statement executed"
    );
    Ok(result)
}

fn decode_value(value: &oracle::SqlValue, oracle_type: &OracleType) -> DbResult<JsonValue> {
    if value.is_null()? {
        return Ok(JsonValue::Null);
    }
    Ok(match oracle_type {
        OracleType::Number(_, 0) => JsonValue::from(value.get::<i64>()?),
        // NUMBER with a scale keeps its exact decimal text
        OracleType::Number(_, _) => JsonValue::String(value.get::<String>()?),
        OracleType::BinaryFloat | OracleType::BinaryDouble | OracleType::Float(_) => {
            serde_json::Number::from_f64(value.get::<f64>()?)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null)
        }
        OracleType::Date
        | OracleType::Timestamp(_)
        | OracleType::TimestampTZ(_)
        | OracleType::TimestampLTZ(_) => {
            let naive: NaiveDateTime = value.get()?;
            let utc: DateTime<Utc> = naive.and_utc();
            JsonValue::String(utc.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        }
        _ => JsonValue::String(value.get::<String>()?),
    })
}
