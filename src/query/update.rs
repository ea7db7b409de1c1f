use super::{BuiltQuery, Condition, render_conditions, require_table};
use crate::db::{DbPool, DbTransaction};
use crate::error::{DbError, DbResult};
use crate::models::{DatabaseType, QueryParam, QueryResult};

/// Builder for `UPDATE` statements.
///
/// Setting the same column twice keeps its first position in the `SET` list
/// and the last value given. NULL values are written inline.
#[derive(Debug, Clone, Default)]
pub struct UpdateBuilder {
    table: Option<String>,
    sets: Vec<(String, QueryParam)>,
    conditions: Vec<Condition>,
}

impl UpdateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<QueryParam>) -> Self {
        let column = column.into();
        let value = value.into();
        match self.sets.iter_mut().find(|(existing, _)| *existing == column) {
            Some(slot) => slot.1 = value,
            None => self.sets.push((column, value)),
        }
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

    /// Whether any column has been set.
    pub fn has_changes(&self) -> bool {
        !self.sets.is_empty()
    }

    pub fn build(&self) -> DbResult<BuiltQuery> {
        let table = require_table(&self.table, "UPDATE")?;
        if self.sets.is_empty() {
            return Err(DbError::invalid_query("UPDATE requires at least one SET column"));
        }

        let assignments = self
            .sets
            .iter()
            .map(|(col, value)| {
                if value.is_null() {
                    format!("{} = NULL", col)
                } else {
                    format!("{} = ?", col)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        let mut params: Vec<QueryParam> = self
            .sets
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(_, v)| v.clone())
            .collect();
        let mut sql = format!("UPDATE {} SET {}", table, assignments);

        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&render_conditions(&self.conditions, &mut params)?);
        }
        Ok(BuiltQuery { sql, params })
    }

    /// UPDATE syntax is shared by every supported engine.
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
