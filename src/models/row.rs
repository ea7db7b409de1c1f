//! Engine-neutral result row.
//!
//! Every adapter decodes its native rows into a [`Row`]: an ordered list of
//! lower-cased column names and JSON values. The typed getters are lenient
//! about representation (a boolean may arrive as `true`, `1` or `"1"`; a
//! decimal as a number or a string) because the four engines disagree on it.

use crate::error::{DbError, DbResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, JsonValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Names are stored lower-cased.
    pub fn insert(&mut self, column: impl Into<String>, value: JsonValue) {
        let column = column.into().to_lowercase();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((column, value)),
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Raw value of a column, `None` when the column is absent.
    pub fn get(&self, column: &str) -> Option<&JsonValue> {
        let column = column.to_lowercase();
        self.columns
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    fn value(&self, column: &str) -> DbResult<&JsonValue> {
        self.get(column)
            .ok_or_else(|| DbError::decode(column, "column missing from result row"))
    }

    fn non_null(&self, column: &str) -> DbResult<&JsonValue> {
        match self.value(column)? {
            JsonValue::Null => Err(DbError::decode(column, "unexpected NULL")),
            v => Ok(v),
        }
    }

    fn nullable(&self, column: &str) -> Option<&JsonValue> {
        match self.get(column) {
            None | Some(JsonValue::Null) => None,
            Some(v) => Some(v),
        }
    }

    pub fn get_str(&self, column: &str) -> DbResult<String> {
        as_string(column, self.non_null(column)?)
    }

    pub fn get_opt_str(&self, column: &str) -> DbResult<Option<String>> {
        self.nullable(column).map(|v| as_string(column, v)).transpose()
    }

    pub fn get_i64(&self, column: &str) -> DbResult<i64> {
        as_i64(column, self.non_null(column)?)
    }

    pub fn get_opt_i64(&self, column: &str) -> DbResult<Option<i64>> {
        self.nullable(column).map(|v| as_i64(column, v)).transpose()
    }

    pub fn get_i32(&self, column: &str) -> DbResult<i32> {
        let value = self.get_i64(column)?;
        i32::try_from(value)
            .map_err(|_| DbError::decode(column, format!("{} is out of range", value)))
    }

    pub fn get_f64(&self, column: &str) -> DbResult<f64> {
        as_f64(column, self.non_null(column)?)
    }

    pub fn get_bool(&self, column: &str) -> DbResult<bool> {
        as_bool(column, self.non_null(column)?)
    }

    pub fn get_datetime(&self, column: &str) -> DbResult<DateTime<Utc>> {
        let raw = as_string(column, self.non_null(column)?)?;
        parse_timestamp(&raw).ok_or_else(|| DbError::decode(column, format!("bad timestamp '{}'", raw)))
    }

    pub fn get_opt_datetime(&self, column: &str) -> DbResult<Option<DateTime<Utc>>> {
        match self.nullable(column) {
            None => Ok(None),
            Some(_) => self.get_datetime(column).map(Some),
        }
    }

    /// JSON column; text-backed JSON (SQLite, Oracle CLOB) is parsed.
    pub fn get_json(&self, column: &str) -> DbResult<JsonValue> {
        match self.value(column)? {
            JsonValue::String(text) => serde_json::from_str(text)
                .map_err(|e| DbError::decode(column, format!("invalid JSON: {}", e))),
            other => Ok(other.clone()),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

fn as_string(column: &str, value: &JsonValue) -> DbResult<String> {
    match value {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        other => Err(DbError::decode(column, format!("expected text, got {}", other))),
    }
}

fn as_i64(column: &str, value: &JsonValue) -> DbResult<i64> {
    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| DbError::decode(column, format!("expected integer, got {}", n))),
        JsonValue::String(s) => s
            .trim()
            .parse::<i64>()
            .or_else(|_| s.trim().parse::<f64>().map(|f| f as i64))
            .map_err(|_| DbError::decode(column, format!("expected integer, got '{}'", s))),
        JsonValue::Bool(b) => Ok(i64::from(*b)),
        other => Err(DbError::decode(column, format!("expected integer, got {}", other))),
    }
}

fn as_f64(column: &str, value: &JsonValue) -> DbResult<f64> {
    match value {
        JsonValue::Number(n) => n
            .as_f64()
            .ok_or_else(|| DbError::decode(column, format!("expected number, got {}", n))),
        JsonValue::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| DbError::decode(column, format!("expected number, got '{}'", s))),
        other => Err(DbError::decode(column, format!("expected number, got {}", other))),
    }
}

fn as_bool(column: &str, value: &JsonValue) -> DbResult<bool> {
    match value {
        JsonValue::Bool(b) => Ok(*b),
        JsonValue::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "t" | "y" => Ok(true),
            "0" | "false" | "f" | "n" => Ok(false),
            _ => Err(DbError::decode(column, format!("expected boolean, got '{}'", s))),
        },
        other => Err(DbError::decode(column, format!("expected boolean, got {}", other))),
    }
}

/// Parse the timestamp spellings the engines hand back.
///
/// Offset-less values are taken as UTC, which is what this crate writes.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> Row {
        let mut row = Row::new();
        row.insert("ID", json!("u1"));
        row.insert("is_active", json!(1));
        row.insert("is_verified", json!("false"));
        row.insert("price", json!("250.50"));
        row.insert("seats", json!(4.0));
        row.insert("features", json!("[\"ac\",\"music\"]"));
        row.insert("profile_image", JsonValue::Null);
        row.insert("created_at", json!("2025-03-01 10:15:30.250"));
        row
    }

    #[test]
    fn test_typed_getters() {
        let row = sample();
        assert_eq!(row.get_str("id").unwrap(), "u1");
        assert!(row.get_bool("is_active").unwrap());
        assert!(!row.get_bool("is_verified").unwrap());
        assert_eq!(row.get_f64("price").unwrap(), 250.5);
        assert_eq!(row.get_i64("seats").unwrap(), 4);
        assert_eq!(row.get_json("features").unwrap(), json!(["ac", "music"]));
        assert_eq!(row.get_opt_str("profile_image").unwrap(), None);
    }

    #[test]
    fn test_missing_and_null_columns() {
        let row = sample();
        assert!(matches!(row.get_str("nope"), Err(DbError::Decode { .. })));
        assert!(matches!(
            row.get_str("profile_image"),
            Err(DbError::Decode { .. })
        ));
        assert_eq!(row.get_opt_str("nope").unwrap(), None);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 30).unwrap()
            + chrono::Duration::milliseconds(250);
        assert_eq!(parse_timestamp("2025-03-01T10:15:30.250Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T10:15:30.250+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01 10:15:30.250"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01 10:15:30.250+00:00"), Some(expected));
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(sample().get_datetime("created_at").unwrap(), expected);
    }

    #[test]
    fn test_insert_replaces_existing_column() {
        let mut row = Row::new();
        row.insert("a", json!(1));
        row.insert("A", json!(2));
        assert_eq!(row.len(), 1);
        assert_eq!(row.get_i64("a").unwrap(), 2);
    }
}
