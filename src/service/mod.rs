//! Typed data access for the HushRyd entities.
//!
//! [`DatabaseService`] wraps one [`DbPool`] and exposes create/read/update/
//! delete operations per entity, returning domain models. Lookups that find
//! nothing return `Ok(None)`; updates of a missing id return `Ok(None)`;
//! deletes report whether a row was removed.

mod admins;
mod bookings;
mod contacts;
pub mod geo;
mod rides;
mod sos;
mod users;

pub use geo::{EARTH_RADIUS_KM, GeoPoint, haversine_km};

use crate::db::{DbPool, DbTransaction};
use crate::error::{DbError, DbResult};
use crate::models::{DatabaseType, QueryParam, Row};
use crate::query::{DeleteBuilder, InsertBuilder, SelectBuilder};
use chrono::{DateTime, SubsecRound, Utc};
use std::str::FromStr;
use uuid::Uuid;

/// Decode a domain model from a result row.
pub(crate) trait FromRow: Sized {
    fn from_row(row: &Row) -> DbResult<Self>;
}

/// Column/value pairs of one row to insert.
pub(crate) type Record = Vec<(&'static str, QueryParam)>;

/// Current time at the millisecond precision the schema stores.
pub(crate) fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Parse a text-backed enum column.
pub(crate) fn parse_enum<E>(row: &Row, column: &str) -> DbResult<E>
where
    E: FromStr<Err = String>,
{
    row.get_str(column)?
        .parse()
        .map_err(|e: String| DbError::decode(column, e))
}

/// Decode a JSON array of strings; NULL reads as empty.
pub(crate) fn string_list(row: &Row, column: &str) -> DbResult<Vec<String>> {
    match row.get_json(column)? {
        serde_json::Value::Null => Ok(Vec::new()),
        value => serde_json::from_value(value)
            .map_err(|e| DbError::decode(column, format!("expected a list of strings: {}", e))),
    }
}

pub(crate) fn insert_record(table: &str, record: Record) -> InsertBuilder {
    let (columns, values): (Vec<&str>, Vec<QueryParam>) = record.into_iter().unzip();
    InsertBuilder::new().into(table).columns(columns).values(values)
}

pub(crate) fn by_id(table: &str, id: &str) -> SelectBuilder {
    SelectBuilder::new().from(table).where_("id = ?", [id])
}

/// First row of `query` inside a transaction.
pub(crate) async fn fetch_optional_in<T: FromRow>(
    tx: &mut DbTransaction,
    query: &SelectBuilder,
) -> DbResult<Option<T>> {
    query
        .execute_in(tx)
        .await?
        .first()
        .map(T::from_row)
        .transpose()
}

/// Data-access service bound to one pool.
///
/// Cloning is cheap; clones share the pool.
#[derive(Debug, Clone)]
pub struct DatabaseService {
    pool: DbPool,
}

impl DatabaseService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn db_type(&self) -> DatabaseType {
        self.pool.db_type()
    }

    async fn fetch_optional<T: FromRow>(&self, query: &SelectBuilder) -> DbResult<Option<T>> {
        query
            .execute(&self.pool)
            .await?
            .first()
            .map(T::from_row)
            .transpose()
    }

    async fn fetch_all<T: FromRow>(&self, query: &SelectBuilder) -> DbResult<Vec<T>> {
        query
            .execute(&self.pool)
            .await?
            .rows
            .iter()
            .map(T::from_row)
            .collect()
    }

    async fn delete_by_id(&self, table: &str, id: &str) -> DbResult<bool> {
        let result = DeleteBuilder::new()
            .from(table)
            .where_("id = ?", [id])
            .execute(&self.pool)
            .await?;
        Ok(result.row_count > 0)
    }
}
