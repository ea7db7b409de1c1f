use super::{BuiltQuery, require_table};
use crate::db::{DbPool, DbTransaction};
use crate::error::{DbError, DbResult};
use crate::models::{DatabaseType, QueryParam, QueryResult};

/// Builder for `INSERT` statements.
///
/// Each `values` call adds one row; all rows go out as a single statement.
#[derive(Debug, Clone, Default)]
pub struct InsertBuilder {
    table: Option<String>,
    columns: Vec<String>,
    rows: Vec<Vec<QueryParam>>,
    ignore_key: Option<String>,
}

impl InsertBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Append one row of values.
    ///
    /// `QueryParam::Null` entries are written as a literal `NULL` and do not
    /// appear in the built params, so `params` holds the non-NULL values of
    /// every row in order.
    pub fn values<P>(mut self, row: P) -> Self
    where
        P: IntoIterator,
        P::Item: Into<QueryParam>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    /// Skip rows that collide with an existing `key_column` value.
    pub fn ignore_duplicates(mut self, key_column: impl Into<String>) -> Self {
        self.ignore_key = Some(key_column.into());
        self
    }

    pub fn build(&self) -> DbResult<BuiltQuery> {
        self.render(None)
    }

    /// Render for a specific engine (Oracle `INSERT ALL`, duplicate-ignore forms).
    pub fn build_for(&self, db: DatabaseType) -> DbResult<BuiltQuery> {
        self.render(Some(db))
    }

    pub async fn execute(&self, pool: &DbPool) -> DbResult<QueryResult> {
        self.build_for(pool.db_type())?.execute(pool).await
    }

    pub async fn execute_in(&self, tx: &mut DbTransaction) -> DbResult<QueryResult> {
        self.build_for(tx.db_type())?.execute_in(tx).await
    }

    fn validate(&self) -> DbResult<&str> {
        let table = require_table(&self.table, "INSERT")?;
        if self.columns.is_empty() {
            return Err(DbError::invalid_query("INSERT requires at least one column"));
        }
        if self.rows.is_empty() {
            return Err(DbError::invalid_query("INSERT requires at least one row of values"));
        }
        if let Some((idx, row)) = self
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.columns.len())
        {
            return Err(DbError::invalid_query(format!(
                "row {} has {} value(s) but {} column(s) were declared",
                idx + 1,
                row.len(),
                self.columns.len()
            )));
        }
        Ok(table)
    }

    fn render(&self, db: Option<DatabaseType>) -> DbResult<BuiltQuery> {
        let table = self.validate()?;
        let cols = self.columns.join(", ");
        let rows: Vec<String> = self.rows.iter().map(|row| row_sql(row)).collect();
        let params: Vec<QueryParam> = self
            .rows
            .iter()
            .flatten()
            .filter(|p| !p.is_null())
            .cloned()
            .collect();

        let sql = match db {
            Some(DatabaseType::Oracle) => self.render_oracle(table, &cols, &rows)?,
            Some(DatabaseType::MySQL) => {
                let verb = if self.ignore_key.is_some() {
                    "INSERT IGNORE INTO"
                } else {
                    "INSERT INTO"
                };
                format!("{} {} ({}) VALUES {}", verb, table, cols, rows.join(", "))
            }
            Some(DatabaseType::SQLite) => {
                let verb = if self.ignore_key.is_some() {
                    "INSERT OR IGNORE INTO"
                } else {
                    "INSERT INTO"
                };
                format!("{} {} ({}) VALUES {}", verb, table, cols, rows.join(", "))
            }
            Some(DatabaseType::PostgreSQL) | None => {
                let mut sql = format!("INSERT INTO {} ({}) VALUES {}", table, cols, rows.join(", "));
                if let Some(key) = &self.ignore_key {
                    sql.push_str(&format!(" ON CONFLICT ({}) DO NOTHING", key));
                }
                sql
            }
        };

        Ok(BuiltQuery { sql, params })
    }

    fn render_oracle(&self, table: &str, cols: &str, rows: &[String]) -> DbResult<String> {
        if let Some(key) = &self.ignore_key {
            if rows.len() > 1 {
                return Err(DbError::invalid_query(
                    "Oracle duplicate-ignore inserts take one row per statement",
                ));
            }
            return Ok(format!(
                "INSERT /*+ IGNORE_ROW_ON_DUPKEY_INDEX({}({})) */ INTO {} ({}) VALUES {}",
                table, key, table, cols, rows[0]
            ));
        }
        if rows.len() == 1 {
            return Ok(format!("INSERT INTO {} ({}) VALUES {}", table, cols, rows[0]));
        }
        let targets = rows
            .iter()
            .map(|row| format!("INTO {} ({}) VALUES {}", table, cols, row))
            .collect::<Vec<_>>()
            .join(" ");
        Ok(format!("INSERT ALL {} SELECT 1 FROM DUAL", targets))
    }
}

/// `(?, ?, NULL)`; NULL values are inlined so no engine has to infer a
/// type for an untyped NULL parameter.
fn row_sql(row: &[QueryParam]) -> String {
    let slots: Vec<&str> = row
        .iter()
        .map(|p| if p.is_null() { "NULL" } else { "?" })
        .collect();
    format!("({})", slots.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_rows() -> InsertBuilder {
        InsertBuilder::new()
            .into("users")
            .columns(["id", "email"])
            .values(["u1", "a@example.com"])
            .values(["u2", "b@example.com"])
    }

    #[test]
    fn test_multi_row_insert() {
        let q = two_rows().build().unwrap();
        assert_eq!(q.sql, "INSERT INTO users (id, email) VALUES (?, ?), (?, ?)");
        assert_eq!(q.params.len(), 4);
        assert_eq!(q.params[2], QueryParam::String("u2".into()));
    }

    #[test]
    fn test_oracle_insert_all() {
        let q = two_rows().build_for(DatabaseType::Oracle).unwrap();
        assert_eq!(
            q.sql,
            "INSERT ALL INTO users (id, email) VALUES (?, ?) \
             INTO users (id, email) VALUES (?, ?) SELECT 1 FROM DUAL"
        );
        assert_eq!(q.params.len(), 4);
    }

    #[test]
    fn test_ignore_duplicates_per_engine() {
        let one = InsertBuilder::new()
            .into("users")
            .columns(["id", "email"])
            .values(["u1", "a@example.com"])
            .ignore_duplicates("id");
        assert_eq!(
            one.build_for(DatabaseType::MySQL).unwrap().sql,
            "INSERT IGNORE INTO users (id, email) VALUES (?, ?)"
        );
        assert_eq!(
            one.build_for(DatabaseType::PostgreSQL).unwrap().sql,
            "INSERT INTO users (id, email) VALUES (?, ?) ON CONFLICT (id) DO NOTHING"
        );
        assert_eq!(
            one.build_for(DatabaseType::SQLite).unwrap().sql,
            "INSERT OR IGNORE INTO users (id, email) VALUES (?, ?)"
        );
        assert_eq!(
            one.build_for(DatabaseType::Oracle).unwrap().sql,
            "INSERT /*+ IGNORE_ROW_ON_DUPKEY_INDEX(users(id)) */ INTO users (id, email) VALUES (?, ?)"
        );
        assert!(
            two_rows()
                .ignore_duplicates("id")
                .build_for(DatabaseType::Oracle)
                .is_err()
        );
    }

    #[test]
    fn test_null_values_are_inlined() {
        let q = InsertBuilder::new()
            .into("rides")
            .columns(["id", "arrival_time", "route_id"])
            .values([QueryParam::from("r1"), QueryParam::Null, QueryParam::from("rt")])
            .build()
            .unwrap();
        assert_eq!(
            q.sql,
            "INSERT INTO rides (id, arrival_time, route_id) VALUES (?, NULL, ?)"
        );
        assert_eq!(q.params.len(), 2);
    }

    #[test]
    fn test_insert_validation() {
        assert!(InsertBuilder::new().columns(["a"]).values([1i64]).build().is_err());
        assert!(InsertBuilder::new().into("t").values([1i64]).build().is_err());
        assert!(InsertBuilder::new().into("t").columns(["a"]).build().is_err());
        let err = InsertBuilder::new()
            .into("t")
            .columns(["a", "b"])
            .values([1i64, 2])
            .values([3i64])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_nulls_are_inlined_and_left_out_of_params() {
        let q = InsertBuilder::new()
            .into("t")
            .columns(["a", "b", "c"])
            .values([QueryParam::from("x"), QueryParam::Null, QueryParam::from("y")])
            .values([QueryParam::Null, QueryParam::from("z"), QueryParam::Null])
            .build()
            .unwrap();
        assert_eq!(
            q.sql,
            "INSERT INTO t (a, b, c) VALUES (?, NULL, ?), (NULL, ?, NULL)"
        );
        assert_eq!(
            q.params,
            vec![QueryParam::from("x"), QueryParam::from("y"), QueryParam::from("z")]
        );
    }
}
