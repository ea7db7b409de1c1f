use super::{BuiltQuery, Condition, render_conditions, require_table};
use crate::db::{DbPool, DbTransaction};
use crate::error::DbResult;
use crate::models::{DatabaseType, QueryParam, QueryResult};

/// Builder for `DELETE` statements. Without a condition every row is deleted.
#[derive(Debug, Clone, Default)]
pub struct DeleteBuilder {
    table: Option<String>,
    conditions: Vec<Condition>,
}

impl DeleteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn where_<P>(mut self, condition: impl Into<String>, params: P) -> Self
    where
        P: IntoIterator,
        P::Item: Into<QueryParam>,
    {
        self.conditions.push(Condition::new(condition, params));
        self
    }

    pub fn where_raw(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(Condition::raw(condition));
        self
    }

    pub fn where_in<P>(mut self, column: &str, values: P) -> Self
    where
        P: IntoIterator,
        P::Item: Into<QueryParam>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.conditions.push(Condition::is_in(column, values));
        self
    }

    pub fn build(&self) -> DbResult<BuiltQuery> {
        let table = require_table(&self.table, "DELETE")?;
        let mut params = Vec::new();
        let mut sql = format!("DELETE FROM {}", table);
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&render_conditions(&self.conditions, &mut params)?);
        }
        Ok(BuiltQuery { sql, params })
    }

    /// DELETE syntax is shared by every supported engine.
    pub fn build_for(&self, _db: DatabaseType) -> DbResult<BuiltQuery> {
        self.build()
    }

    pub async fn execute(&self, pool: &DbPool) -> DbResult<QueryResult> {
        self.build_for(pool.db_type())?.execute(pool).await
    }

    pub async fn execute_in(&self, tx: &mut DbTransaction) -> DbResult<QueryResult> {
        self.build_for(tx.db_type())?.execute_in(tx).await
    }
}
