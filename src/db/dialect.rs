//! Per-engine SQL text adjustments applied at execution time.
//!
//! Statements throughout the crate are written with `?` positional
//! placeholders. PostgreSQL wants `$1, $2, ...` and Oracle `:1, :2, ...`, so
//! the adapters rewrite placeholders right before handing SQL to a driver.

use crate::models::DatabaseType;
use std::borrow::Cow;

/// Rewrite `?` placeholders into the engine's native positional form.
///
/// Question marks inside single-quoted literals, double-quoted identifiers
/// and `--` line comments are left untouched.
pub fn render_placeholders(sql: &str, db: DatabaseType) -> Cow<'_, str> {
    let prefix = match db {
        DatabaseType::PostgreSQL => '$',
        DatabaseType::Oracle => ':',
        DatabaseType::MySQL | DatabaseType::SQLite => return Cow::Borrowed(sql),
    };
    if !sql.contains('?') {
        return Cow::Borrowed(sql);
    }

    let mut out = String::with_capacity(sql.len() + 8);
    let mut index = 0;
    let mut in_single = false;
    let mut in_double = false;
    let mut in_comment = false;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
            }
            out.push(c);
            continue;
        }
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '-' if !in_single && !in_double && chars.peek() == Some(&'-') => in_comment = true,
            '?' if !in_single && !in_double => {
                index += 1;
                out.push(prefix);
                out.push_str(&index.to_string());
                continue;
            }
            _ => {}
        }
        out.push(c);
    }
    Cow::Owned(out)
}

/// Count `?` placeholders outside literals, identifiers and comments.
pub fn count_placeholders(sql: &str) -> usize {
    let rendered = render_placeholders(sql, DatabaseType::PostgreSQL);
    if let Cow::Borrowed(_) = rendered {
        return 0;
    }
    // Every rewritten placeholder is `$` followed by its index
    rendered.matches('$').count() - sql.matches('$').count()
}

/// Whether a statement produces a result set (as opposed to a row count).
pub fn returns_rows(sql: &str) -> bool {
    let trimmed = sql.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
    let keyword: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase();
    match keyword.as_str() {
        "SELECT" | "WITH" | "SHOW" | "PRAGMA" | "VALUES" | "EXPLAIN" | "DESCRIBE" => true,
        _ => sql.to_ascii_uppercase().contains(" RETURNING "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_unchanged_for_mysql_and_sqlite() {
        let sql = "SELECT * FROM users WHERE id = ? AND role = ?";
        assert_eq!(render_placeholders(sql, DatabaseType::MySQL), sql);
        assert_eq!(render_placeholders(sql, DatabaseType::SQLite), sql);
    }

    #[test]
    fn test_placeholders_postgres_and_oracle() {
        let sql = "UPDATE rides SET available_seats = available_seats - ? WHERE id = ?";
        assert_eq!(
            render_placeholders(sql, DatabaseType::PostgreSQL),
            "UPDATE rides SET available_seats = available_seats - $1 WHERE id = $2"
        );
        assert_eq!(
            render_placeholders(sql, DatabaseType::Oracle),
            "UPDATE rides SET available_seats = available_seats - :1 WHERE id = :2"
        );
    }

    #[test]
    fn test_placeholders_skip_literals_and_comments() {
        let sql = "SELECT 'why?' AS q, \"odd?col\" FROM t -- really?\nWHERE a = ?";
        assert_eq!(
            render_placeholders(sql, DatabaseType::PostgreSQL),
            "SELECT 'why?' AS q, \"odd?col\" FROM t -- really?\nWHERE a = $1"
        );
        assert_eq!(count_placeholders(sql), 1);
    }

    #[test]
    fn test_placeholders_escaped_quote() {
        let sql = "SELECT 'it''s ?' WHERE x = ?";
        assert_eq!(
            render_placeholders(sql, DatabaseType::Oracle),
            "SELECT 'it''s ?' WHERE x = :1"
        );
    }

    #[test]
    fn test_count_placeholders() {
        assert_eq!(count_placeholders("SELECT 1"), 0);
        assert_eq!(count_placeholders("a = ? AND b IN (?, ?)"), 3);
        assert_eq!(count_placeholders("SELECT '$5' WHERE a = ?"), 1);
    }

    #[test]
    fn test_returns_rows() {
        assert!(returns_rows("SELECT 1"));
        assert!(returns_rows("  with t as (select 1) select * from t"));
        assert!(returns_rows("(SELECT 1) UNION (SELECT 2)"));
        assert!(returns_rows("INSERT INTO t (a) VALUES (?) RETURNING id"));
        assert!(!returns_rows("INSERT INTO t (a) VALUES (?)"));
        assert!(!returns_rows("CREATE TABLE IF NOT EXISTS t (id TEXT)"));
        assert!(!returns_rows("BEGIN EXECUTE IMMEDIATE 'x'; END;"));
    }
}
