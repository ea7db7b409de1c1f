//! Query-related data models.
//!
//! This module defines the parameter values bound to SQL placeholders and the
//! normalized result every engine adapter returns.

use crate::models::row::Row;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A parameter value for parameterized queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// UTC timestamp
    Timestamp(DateTime<Utc>),
    /// JSON document (native JSON/JSONB where the engine has one, text otherwise)
    Json(JsonValue),
}

impl QueryParam {
    /// Check if this parameter is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Timestamp(_) => "timestamp",
            Self::Json(_) => "json",
        }
    }
}

impl From<bool> for QueryParam {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for QueryParam {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for QueryParam {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<u32> for QueryParam {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for QueryParam {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for QueryParam {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&String> for QueryParam {
    fn from(v: &String) -> Self {
        Self::String(v.clone())
    }
}

impl From<DateTime<Utc>> for QueryParam {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<JsonValue> for QueryParam {
    fn from(v: JsonValue) -> Self {
        Self::Json(v)
    }
}

impl<T: Into<QueryParam>> From<Option<T>> for QueryParam {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Normalized result of one statement, identical in shape for every engine.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    /// Rows returned for row-producing statements, rows affected otherwise
    pub row_count: u64,
    /// Column names, when the statement produced rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

impl QueryResult {
    /// Result of a statement that affected rows but returned none.
    pub fn affected(row_count: u64) -> Self {
        Self {
            rows: Vec::new(),
            row_count,
            fields: None,
        }
    }

    /// Result of a row-producing statement.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let fields = rows.first().map(|r| r.column_names());
        Self {
            row_count: rows.len() as u64,
            rows,
            fields,
        }
    }

    /// First row, if any.
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Consume the result, keeping only the first row.
    pub fn into_first(self) -> Option<Row> {
        self.rows.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_conversions() {
        assert_eq!(QueryParam::from(3_i32), QueryParam::Int(3));
        assert_eq!(QueryParam::from("a"), QueryParam::String("a".to_string()));
        assert_eq!(QueryParam::from(None::<String>), QueryParam::Null);
        assert_eq!(QueryParam::from(Some(1.5)), QueryParam::Float(1.5));
        assert!(QueryParam::Null.is_null());
        assert_eq!(QueryParam::Bool(true).type_name(), "bool");
    }

    #[test]
    fn test_query_result_shapes() {
        let affected = QueryResult::affected(3);
        assert_eq!(affected.row_count, 3);
        assert!(affected.rows.is_empty());
        assert!(affected.fields.is_none());

        let mut row = Row::new();
        row.insert("id", JsonValue::from("u1"));
        let result = QueryResult::from_rows(vec![row]);
        assert_eq!(result.row_count, 1);
        assert_eq!(result.fields, Some(vec!["id".to_string()]));
        assert_eq!(result.first().unwrap().get_str("id").unwrap(), "u1");
    }
}
