//! Error types for the HushRyd database layer.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Each variant carries enough context for the caller (or an operator reading the
//! migration CLI output) to act on it. Nothing in this crate retries on its own.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "23505" for unique violation on PostgreSQL
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Transaction error: {message}")]
    Transaction { message: String },

    #[error("Migration {version} ({name}) failed: {source}")]
    Migration {
        version: String,
        name: String,
        #[source]
        source: Box<DbError>,
    },

    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    #[error(
        "Ride {ride_id} cannot take {requested} passenger(s): only {available} seat(s) available"
    )]
    CapacityExceeded {
        ride_id: String,
        requested: i64,
        available: i64,
    },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },

    #[error("Failed to decode column '{column}': {message}")]
    Decode { column: String, message: String },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u32,
    },

    #[error("Connection not found: {name}")]
    ConnectionNotFound { name: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    /// Create a transaction error.
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
        }
    }

    /// Wrap an error raised while applying a migration.
    pub fn migration(version: impl Into<String>, name: impl Into<String>, source: DbError) -> Self {
        Self::Migration {
            version: version.into(),
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Create an invalid query error (query builder misuse).
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Create a capacity exceeded error for an over-booked ride.
    pub fn capacity_exceeded(ride_id: impl Into<String>, requested: i64, available: i64) -> Self {
        Self::CapacityExceeded {
            ride_id: ride_id.into(),
            requested,
            available,
        }
    }

    /// Create a not found error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a decode error for a row column.
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u32) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// Create a connection not found error.
    pub fn connection_not_found(name: impl Into<String>) -> Self {
        Self::ConnectionNotFound { name: name.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { suggestion, .. } => Some(suggestion),
            Self::Migration { source, .. } => source.suggestion(),
            _ => None,
        }
    }

    /// SQL state (or engine error code) attached to the error, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Database { sql_state, .. } => sql_state.as_deref(),
            Self::Migration { source, .. } => source.sql_state(),
            _ => None,
        }
    }

    /// Check if this error is a unique/foreign-key/check constraint violation.
    ///
    /// Covers SQLSTATE class 23 (MySQL, PostgreSQL), Oracle `ORA-00001`/`ORA-02291`/
    /// `ORA-02292`/`ORA-02290` and SQLite extended constraint codes.
    pub fn is_constraint_violation(&self) -> bool {
        let Some(code) = self.sql_state() else {
            return false;
        };
        code.starts_with("23")
            || matches!(code, "ORA-00001" | "ORA-02290" | "ORA-02291" | "ORA-02292")
            || matches!(code, "19" | "275" | "531" | "787" | "1299" | "1555" | "2067")
    }

    /// Check if this error is worth retrying by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::configuration(msg.to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::database(
                    db_err.message(),
                    code,
                    "Check the SQL syntax, referenced objects and constraint values",
                )
            }
            sqlx::Error::RowNotFound => DbError::database(
                "No rows returned",
                None,
                "Verify the query conditions match existing data",
            ),
            sqlx::Error::PoolTimedOut => DbError::timeout("connection pool acquire", 30),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Reconnect to the database")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration or build with the tls-native/tls-rustls feature",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::decode(col.clone(), format!("Column not found: {}", col))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::internal(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::decode(index, source.to_string())
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

#[cfg(feature = "oracle")]
impl From<oracle::Error> for DbError {
    fn from(err: oracle::Error) -> Self {
        match err.db_error() {
            Some(db_err) => DbError::database(
                db_err.message(),
                Some(format!("ORA-{:05}", db_err.code())),
                "Check the SQL syntax, referenced objects and constraint values",
            ),
            None => DbError::connection(
                err.to_string(),
                "Check that Oracle Instant Client is installed and the listener is reachable",
            ),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::connection("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_error_suggestion() {
        let err = DbError::database(
            "Syntax error",
            Some("42601".to_string()),
            "Check SQL syntax",
        );
        assert_eq!(err.suggestion(), Some("Check SQL syntax"));
    }

    #[test]
    fn test_error_retryable() {
        assert!(DbError::timeout("query", 30).is_retryable());
        assert!(DbError::connection("err", "sugg").is_retryable());
        assert!(!DbError::configuration("unsupported engine").is_retryable());
    }

    #[test]
    fn test_constraint_violation_codes() {
        let pg = DbError::database("duplicate key", Some("23505".to_string()), "");
        let ora = DbError::database("unique constraint", Some("ORA-00001".to_string()), "");
        let sqlite = DbError::database("UNIQUE constraint failed", Some("2067".to_string()), "");
        let syntax = DbError::database("syntax", Some("42601".to_string()), "");
        assert!(pg.is_constraint_violation());
        assert!(ora.is_constraint_violation());
        assert!(sqlite.is_constraint_violation());
        assert!(!syntax.is_constraint_violation());
        assert!(!DbError::internal("x").is_constraint_violation());
    }

    #[test]
    fn test_migration_error_wraps_source() {
        let err = DbError::migration(
            "001",
            "create_core_tables",
            DbError::database("table exists", Some("42P07".to_string()), "drop it"),
        );
        let text = err.to_string();
        assert!(text.contains("001"));
        assert!(text.contains("create_core_tables"));
        assert!(text.contains("table exists"));
        assert_eq!(err.suggestion(), Some("drop it"));
        assert_eq!(err.sql_state(), Some("42P07"));
    }

    #[test]
    fn test_capacity_exceeded_message() {
        let err = DbError::capacity_exceeded("ride-1", 3, 2);
        assert_eq!(
            err.to_string(),
            "Ride ride-1 cannot take 3 passenger(s): only 2 seat(s) available"
        );
    }
}
