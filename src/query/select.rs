use super::{BuiltQuery, Condition, SortOrder, render_conditions, require_table};
use crate::db::{DbPool, DbTransaction};
use crate::error::DbResult;
use crate::models::{DatabaseType, QueryParam, QueryResult};

// MySQL has no "offset only" form; this is its documented maximum row count.
const MYSQL_MAX_LIMIT: u64 = 18_446_744_073_709_551_615;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Join,
    Inner,
    Left,
    Right,
}

impl JoinKind {
    fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Join => "JOIN",
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Join {
    kind: JoinKind,
    table: String,
    on: String,
}

/// Builder for `SELECT` statements.
///
/// Clauses render in SQL order regardless of call order; repeated `where_`
/// and `having` calls are AND-combined in the order they were made.
#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    columns: Vec<String>,
    table: Option<String>,
    joins: Vec<Join>,
    conditions: Vec<Condition>,
    group_by: Vec<String>,
    having: Vec<Condition>,
    order_by: Vec<(String, SortOrder)>,
    limit: Option<u64>,
    offset: Option<u64>,
    for_update: bool,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns to select; without this the query selects `*`.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
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

    /// A condition without parameters.
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

    pub fn where_between(
        mut self,
        column: &str,
        low: impl Into<QueryParam>,
        high: impl Into<QueryParam>,
    ) -> Self {
        self.conditions
            .push(Condition::between(column, low.into(), high.into()));
        self
    }

    fn push_join(mut self, kind: JoinKind, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.joins.push(Join {
            kind,
            table: table.into(),
            on: on.into(),
        });
        self
    }

    pub fn join(self, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.push_join(JoinKind::Join, table, on)
    }

    pub fn inner_join(self, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.push_join(JoinKind::Inner, table, on)
    }

    pub fn left_join(self, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.push_join(JoinKind::Left, table, on)
    }

    pub fn right_join(self, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.push_join(JoinKind::Right, table, on)
    }

    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn having<P>(mut self, condition: impl Into<String>, params: P) -> Self
    where
        P: IntoIterator,
        P::Item: Into<QueryParam>,
    {
        self.having.push(Condition::new(condition, params));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order_by.push((column.into(), order));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Lock the selected rows until the enclosing transaction ends.
    ///
    /// SQLite has no row locks and renders without the clause.
    pub fn for_update(mut self) -> Self {
        self.for_update = true;
        self
    }

    /// Render the generic form (`LIMIT n OFFSET m`).
    pub fn build(&self) -> DbResult<BuiltQuery> {
        self.render(None)
    }

    /// Render for a specific engine's pagination syntax.
    pub fn build_for(&self, db: DatabaseType) -> DbResult<BuiltQuery> {
        self.render(Some(db))
    }

    pub async fn execute(&self, pool: &DbPool) -> DbResult<QueryResult> {
        self.build_for(pool.db_type())?.execute(pool).await
    }

    pub async fn execute_in(&self, tx: &mut DbTransaction) -> DbResult<QueryResult> {
        self.build_for(tx.db_type())?.execute_in(tx).await
    }

    fn render(&self, db: Option<DatabaseType>) -> DbResult<BuiltQuery> {
        let table = require_table(&self.table, "SELECT")?;
        let mut params = Vec::new();

        let cols = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };
        let mut sql = format!("SELECT {} FROM {}", cols, table);

        for join in &self.joins {
            sql.push_str(&format!(" {} {} ON {}", join.kind.as_sql(), join.table, join.on));
        }

        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&render_conditions(&self.conditions, &mut params)?);
        }

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }

        if !self.having.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&render_conditions(&self.having, &mut params)?);
        }

        if !self.order_by.is_empty() {
            let order = self
                .order_by
                .iter()
                .map(|(col, dir)| format!("{} {}", col, dir.as_sql()))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }

        sql.push_str(&self.pagination(db));
        if self.for_update && db != Some(DatabaseType::SQLite) {
            sql.push_str(" FOR UPDATE");
        }
        Ok(BuiltQuery { sql, params })
    }

    fn pagination(&self, db: Option<DatabaseType>) -> String {
        match (db, self.limit, self.offset) {
            (_, None, None) => String::new(),
            (Some(DatabaseType::Oracle), limit, offset) => {
                let mut out = String::new();
                if let Some(offset) = offset {
                    out.push_str(&format!(" OFFSET {} ROWS", offset));
                }
                match (limit, offset) {
                    (Some(limit), Some(_)) => {
                        out.push_str(&format!(" FETCH NEXT {} ROWS ONLY", limit))
                    }
                    (Some(limit), None) => {
                        out.push_str(&format!(" FETCH FIRST {} ROWS ONLY", limit))
                    }
                    _ => {}
                }
                out
            }
            (Some(DatabaseType::MySQL), None, Some(offset)) => {
                format!(" LIMIT {} OFFSET {}", MYSQL_MAX_LIMIT, offset)
            }
            (Some(DatabaseType::SQLite), None, Some(offset)) => {
                format!(" LIMIT -1 OFFSET {}", offset)
            }
            (_, limit, offset) => {
                let mut out = String::new();
                if let Some(limit) = limit {
                    out.push_str(&format!(" LIMIT {}", limit));
                }
                if let Some(offset) = offset {
                    out.push_str(&format!(" OFFSET {}", offset));
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;

    #[test]
    fn test_select_star_without_columns() {
        let q = SelectBuilder::new().from("users").build().unwrap();
        assert_eq!(q.sql, "SELECT * FROM users");
        assert!(q.params.is_empty());
    }

    #[test]
    fn test_for_update_skipped_on_sqlite() {
        let q = SelectBuilder::new()
            .select(["available_seats"])
            .from("rides")
            .where_("id = ?", ["r1"])
            .for_update();
        assert_eq!(
            q.build_for(DatabaseType::PostgreSQL).unwrap().sql,
            "SELECT available_seats FROM rides WHERE id = ? FOR UPDATE"
        );
        assert_eq!(
            q.build_for(DatabaseType::SQLite).unwrap().sql,
            "SELECT available_seats FROM rides WHERE id = ?"
        );
    }

    #[test]
    fn test_missing_from_is_invalid() {
        let err = SelectBuilder::new().select(["id"]).build().unwrap_err();
        assert!(matches!(err, DbError::InvalidQuery { .. }));
    }

    #[test]
    fn test_clause_order_independent_of_call_order() {
        let q = SelectBuilder::new()
            .limit(10)
            .order_by("r.created_at", SortOrder::Desc)
            .having("COUNT(b.id) > ?", [1i64])
            .group_by(["r.id"])
            .where_("r.status = ?", ["scheduled"])
            .left_join("bookings b", "b.ride_id = r.id")
            .from("rides r")
            .select(["r.id", "COUNT(b.id) AS booking_count"])
            .offset(20)
            .build()
            .unwrap();
        assert_eq!(
            q.sql,
            "SELECT r.id, COUNT(b.id) AS booking_count FROM rides r \
             LEFT JOIN bookings b ON b.ride_id = r.id \
             WHERE r.status = ? GROUP BY r.id HAVING COUNT(b.id) > ? \
             ORDER BY r.created_at DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            q.params,
            vec![QueryParam::String("scheduled".into()), QueryParam::Int(1)]
        );
    }

    #[test]
    fn test_where_in_and_between() {
        let q = SelectBuilder::new()
            .from("sos_alerts")
            .where_in("priority", ["high", "critical"])
            .where_between("created_at", "2025-01-01", "2025-02-01")
            .build()
            .unwrap();
        assert_eq!(
            q.sql,
            "SELECT * FROM sos_alerts WHERE priority IN (?, ?) AND created_at BETWEEN ? AND ?"
        );
        assert_eq!(q.params.len(), 4);
    }

    #[test]
    fn test_where_in_empty_list() {
        let q = SelectBuilder::new()
            .from("users")
            .where_in("id", Vec::<String>::new())
            .build()
            .unwrap();
        assert_eq!(q.sql, "SELECT * FROM users WHERE 1 = 0");
    }

    #[test]
    fn test_joins_keep_order() {
        let q = SelectBuilder::new()
            .from("bookings b")
            .inner_join("rides r", "r.id = b.ride_id")
            .right_join("users u", "u.id = b.user_id")
            .join("admins a", "a.email = u.email")
            .build()
            .unwrap();
        assert_eq!(
            q.sql,
            "SELECT * FROM bookings b INNER JOIN rides r ON r.id = b.ride_id \
             RIGHT JOIN users u ON u.id = b.user_id JOIN admins a ON a.email = u.email"
        );
    }

    #[test]
    fn test_oracle_pagination() {
        let base = SelectBuilder::new().from("rides").order_by("id", SortOrder::Asc);
        let both = base.clone().limit(5).offset(10).build_for(DatabaseType::Oracle).unwrap();
        assert_eq!(
            both.sql,
            "SELECT * FROM rides ORDER BY id ASC OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY"
        );
        let limit_only = base.clone().limit(5).build_for(DatabaseType::Oracle).unwrap();
        assert_eq!(
            limit_only.sql,
            "SELECT * FROM rides ORDER BY id ASC FETCH FIRST 5 ROWS ONLY"
        );
        let offset_only = base.offset(3).build_for(DatabaseType::Oracle).unwrap();
        assert_eq!(offset_only.sql, "SELECT * FROM rides ORDER BY id ASC OFFSET 3 ROWS");
    }

    #[test]
    fn test_offset_without_limit_per_engine() {
        let q = SelectBuilder::new().from("users").offset(7);
        assert_eq!(q.build().unwrap().sql, "SELECT * FROM users OFFSET 7");
        assert_eq!(
            q.build_for(DatabaseType::PostgreSQL).unwrap().sql,
            "SELECT * FROM users OFFSET 7"
        );
        assert_eq!(
            q.build_for(DatabaseType::SQLite).unwrap().sql,
            "SELECT * FROM users LIMIT -1 OFFSET 7"
        );
        assert!(
            q.build_for(DatabaseType::MySQL)
                .unwrap()
                .sql
                .starts_with("SELECT * FROM users LIMIT 18446744073709551615")
        );
    }

    #[test]
    fn test_having_params_follow_where_params() {
        let q = SelectBuilder::new()
            .from("bookings")
            .select(["ride_id", "SUM(passenger_count) AS seats"])
            .having("SUM(passenger_count) >= ?", [2i64])
            .where_("status <> ?", ["cancelled"])
            .group_by(["ride_id"])
            .build()
            .unwrap();
        assert_eq!(
            q.params,
            vec![QueryParam::String("cancelled".into()), QueryParam::Int(2)]
        );
    }
}
