//! DDL rendering for each engine.
//!
//! Every statement is idempotent: `IF NOT EXISTS` where the engine has it,
//! inline indexes on MySQL, and a PL/SQL block swallowing ORA-00955 ("name is
//! already used by an existing object") on Oracle.

use super::model::{ColumnDef, ColumnDefault, ColumnType, TableDef};
use crate::models::DatabaseType;

const SQLITE_NOW: &str = "(strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))";

/// Render the statements that create `table` and its indexes.
///
/// The first statement creates the table; any further ones create indexes.
pub fn render_create_table(table: &TableDef, db: DatabaseType) -> Vec<String> {
    let mut definitions: Vec<String> = table
        .columns
        .iter()
        .map(|col| format!("    {}", column_sql(col, db)))
        .collect();

    definitions.push(format!("    PRIMARY KEY ({})", table.primary_key));

    for fk in &table.foreign_keys {
        definitions.push(format!(
            "    CONSTRAINT fk_{}_{} FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE {}",
            table.name,
            fk.column,
            fk.column,
            fk.ref_table,
            fk.ref_column,
            fk.on_delete.as_sql()
        ));
    }

    for check in &table.checks {
        definitions.push(format!("    CHECK ({})", check));
    }

    if db == DatabaseType::MySQL {
        for index in &table.indexes {
            definitions.push(format!(
                "    INDEX {} ({})",
                index.name,
                index.columns.join(", ")
            ));
        }
    }

    let body = definitions.join(",\n");
    let mut statements = Vec::with_capacity(1 + table.indexes.len());

    match db {
        DatabaseType::MySQL => {
            statements.push(format!(
                "CREATE TABLE IF NOT EXISTS {} (\n{}\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
                table.name, body
            ));
        }
        DatabaseType::PostgreSQL | DatabaseType::SQLite => {
            statements.push(format!(
                "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
                table.name, body
            ));
            for index in &table.indexes {
                statements.push(format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                    index.name,
                    table.name,
                    index.columns.join(", ")
                ));
            }
        }
        DatabaseType::Oracle => {
            statements.push(oracle_ignore_existing(&format!(
                "CREATE TABLE {} (\n{}\n)",
                table.name, body
            )));
            for index in &table.indexes {
                statements.push(oracle_ignore_existing(&format!(
                    "CREATE INDEX {} ON {} ({})",
                    index.name,
                    table.name,
                    index.columns.join(", ")
                )));
            }
        }
    }
    statements
}

/// Render a statement dropping `table` if it exists.
pub fn render_drop_table(table: &str, db: DatabaseType) -> String {
    match db {
        DatabaseType::Oracle => format!(
            "BEGIN EXECUTE IMMEDIATE 'DROP TABLE {} CASCADE CONSTRAINTS'; \
             EXCEPTION WHEN OTHERS THEN IF SQLCODE != -942 THEN RAISE; END IF; END;",
            table
        ),
        _ => format!("DROP TABLE IF EXISTS {}", table),
    }
}

fn oracle_ignore_existing(ddl: &str) -> String {
    format!(
        "BEGIN EXECUTE IMMEDIATE '{}'; \
         EXCEPTION WHEN OTHERS THEN IF SQLCODE != -955 THEN RAISE; END IF; END;",
        ddl.replace('\'', "''")
    )
}

fn quoted_list(values: &[&str]) -> String {
    values
        .iter()
        .map(|v| format!("'{}'", v.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Native type for a logical column type.
pub fn column_type_sql(column_type: &ColumnType, db: DatabaseType) -> String {
    use DatabaseType::*;
    match (column_type, db) {
        (ColumnType::Id, Oracle) => "VARCHAR2(36)".to_string(),
        (ColumnType::Id, SQLite) => "TEXT".to_string(),
        (ColumnType::Id, _) => "VARCHAR(36)".to_string(),

        (ColumnType::Varchar(n), Oracle) => format!("VARCHAR2({})", n),
        (ColumnType::Varchar(_), SQLite) => "TEXT".to_string(),
        (ColumnType::Varchar(n), _) => format!("VARCHAR({})", n),

        (ColumnType::Text, Oracle) => "CLOB".to_string(),
        (ColumnType::Text, _) => "TEXT".to_string(),

        (ColumnType::Boolean, Oracle) => "NUMBER(1)".to_string(),
        (ColumnType::Boolean, _) => "BOOLEAN".to_string(),

        (ColumnType::Integer, MySQL) => "INT".to_string(),
        (ColumnType::Integer, Oracle) => "NUMBER(10)".to_string(),
        (ColumnType::Integer, _) => "INTEGER".to_string(),

        (ColumnType::Decimal(p, s), MySQL) => format!("DECIMAL({},{})", p, s),
        (ColumnType::Decimal(p, s), PostgreSQL) => format!("NUMERIC({},{})", p, s),
        (ColumnType::Decimal(p, s), Oracle) => format!("NUMBER({},{})", p, s),
        (ColumnType::Decimal(_, _), SQLite) => "REAL".to_string(),

        (ColumnType::Timestamp, PostgreSQL) => "TIMESTAMP(3) WITH TIME ZONE".to_string(),
        // SQLite keeps RFC 3339 text; a TIMESTAMP decltype would change decoding
        (ColumnType::Timestamp, SQLite) => "TEXT".to_string(),
        (ColumnType::Timestamp, _) => "TIMESTAMP(3)".to_string(),

        (ColumnType::Json, MySQL) => "JSON".to_string(),
        (ColumnType::Json, PostgreSQL) => "JSONB".to_string(),
        (ColumnType::Json, Oracle) => "CLOB".to_string(),
        (ColumnType::Json, SQLite) => "TEXT".to_string(),

        (ColumnType::Enum(values), MySQL) => format!("ENUM({})", quoted_list(values)),
        (ColumnType::Enum(values), Oracle) => format!("VARCHAR2({})", enum_width(values)),
        (ColumnType::Enum(_), SQLite) => "TEXT".to_string(),
        (ColumnType::Enum(values), PostgreSQL) => format!("VARCHAR({})", enum_width(values)),
    }
}

fn enum_width(values: &[&str]) -> usize {
    values.iter().map(|v| v.len()).max().unwrap_or(1).max(20)
}

fn default_sql(default: &ColumnDefault, db: DatabaseType) -> String {
    match (default, db) {
        (ColumnDefault::CurrentTimestamp, DatabaseType::MySQL) => "CURRENT_TIMESTAMP(3)".to_string(),
        (ColumnDefault::CurrentTimestamp, DatabaseType::PostgreSQL) => {
            "CURRENT_TIMESTAMP".to_string()
        }
        (ColumnDefault::CurrentTimestamp, DatabaseType::Oracle) => "SYSTIMESTAMP".to_string(),
        (ColumnDefault::CurrentTimestamp, DatabaseType::SQLite) => SQLITE_NOW.to_string(),
        (ColumnDefault::Bool(b), DatabaseType::MySQL | DatabaseType::PostgreSQL) => {
            let literal = if *b { "TRUE" } else { "FALSE" };
            literal.to_string()
        }
        (ColumnDefault::Bool(b), _) => i32::from(*b).to_string(),
        (ColumnDefault::Int(n), _) => n.to_string(),
        (ColumnDefault::Text(s), _) => format!("'{}'", s.replace('\'', "''")),
    }
}

/// One column definition line (without indentation).
pub fn column_sql(column: &ColumnDef, db: DatabaseType) -> String {
    let mut sql = format!("{} {}", column.name, column_type_sql(&column.column_type, db));

    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&default_sql(default, db));
    }

    if column.nullable {
        // Pre-8.0 MySQL gives a bare TIMESTAMP column an implicit NOT NULL
        if db == DatabaseType::MySQL && column.column_type == ColumnType::Timestamp {
            sql.push_str(" NULL");
        }
    } else {
        sql.push_str(" NOT NULL");
    }

    if column.unique {
        sql.push_str(" UNIQUE");
    }

    match (&column.column_type, db) {
        (ColumnType::Enum(values), DatabaseType::PostgreSQL | DatabaseType::Oracle | DatabaseType::SQLite) => {
            sql.push_str(&format!(" CHECK ({} IN ({}))", column.name, quoted_list(values)));
        }
        (ColumnType::Boolean, DatabaseType::Oracle) => {
            sql.push_str(&format!(" CHECK ({} IN (0, 1))", column.name));
        }
        _ => {}
    }
    sql
}
