//! Fluent SQL query builders.
//!
//! Builders assemble parameterized SQL with `?` placeholders and keep their
//! parameters in placeholder order. [`build`](SelectBuilder::build) renders a
//! generic form; `build_for` renders engine-specific pagination and insert
//! syntax. Placeholders are rewritten to the native style when the statement
//! runs, not here.
//!
//! ```ignore
//! let query = SelectBuilder::new()
//!     .select(["id", "email"])
//!     .from("users")
//!     .where_("role = ?", ["driver"])
//!     .order_by("created_at", SortOrder::Desc)
//!     .limit(20)
//!     .build()?;
//! ```

mod delete;
mod insert;
mod select;
mod update;

pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::{JoinKind, SelectBuilder};
pub use update::UpdateBuilder;

use crate::db::{DbPool, DbTransaction, count_placeholders};
use crate::error::{DbError, DbResult};
use crate::models::{QueryParam, QueryResult};

/// Rendered SQL plus its parameters in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

impl BuiltQuery {
    /// A statement without parameters, such as DDL.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub async fn execute(&self, pool: &DbPool) -> DbResult<QueryResult> {
        pool.query(&self.sql, &self.params).await
    }

    pub async fn execute_in(&self, tx: &mut DbTransaction) -> DbResult<QueryResult> {
        tx.query(&self.sql, &self.params).await
    }
}

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A condition fragment with the parameters its placeholders consume.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Condition {
    sql: String,
    params: Vec<QueryParam>,
}

impl Condition {
    pub(crate) fn new<P>(sql: impl Into<String>, params: P) -> Self
    where
        P: IntoIterator,
        P::Item: Into<QueryParam>,
    {
        Self {
            sql: sql.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    pub(crate) fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// `column IN (?, ...)`; an empty list matches nothing.
    pub(crate) fn is_in(column: &str, values: Vec<QueryParam>) -> Self {
        if values.is_empty() {
            return Self::raw("1 = 0");
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        Self {
            sql: format!("{} IN ({})", column, placeholders),
            params: values,
        }
    }

    pub(crate) fn between(column: &str, low: QueryParam, high: QueryParam) -> Self {
        Self {
            sql: format!("{} BETWEEN ? AND ?", column),
            params: vec![low, high],
        }
    }
}

/// Join conditions with `AND`, appending their params in order.
///
/// A condition containing a top-level `OR` is parenthesized so the
/// conjunction keeps its meaning.
pub(crate) fn render_conditions(
    conditions: &[Condition],
    params: &mut Vec<QueryParam>,
) -> DbResult<String> {
    let mut parts = Vec::with_capacity(conditions.len());
    for condition in conditions {
        let expected = count_placeholders(&condition.sql);
        if expected != condition.params.len() {
            return Err(DbError::invalid_query(format!(
                "condition '{}' has {} placeholder(s) but {} parameter(s)",
                condition.sql,
                expected,
                condition.params.len()
            )));
        }
        let needs_parens =
            conditions.len() > 1 && condition.sql.to_ascii_uppercase().contains(" OR ");
        if needs_parens {
            parts.push(format!("({})", condition.sql));
        } else {
            parts.push(condition.sql.clone());
        }
        params.extend(condition.params.iter().cloned());
    }
    Ok(parts.join(" AND "))
}

fn require_table<'a>(table: &'a Option<String>, statement: &str) -> DbResult<&'a str> {
    table
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| DbError::invalid_query(format!("{} requires a table", statement)))
}
