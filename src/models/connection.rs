//! Connection-related data models.
//!
//! This module defines the engine selector shared by configuration, pooling,
//! query rendering and schema generation.

use crate::error::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// Includes MariaDB
    MySQL,
    PostgreSQL,
    Oracle,
    /// Embedded engine, used for local runs and the test-suite
    SQLite,
}

impl DatabaseType {
    /// Parse database type from a connection string.
    pub fn from_connection_string(connection_string: &str) -> Option<Self> {
        let lower = connection_string.to_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Some(Self::PostgreSQL)
        } else if lower.starts_with("mysql://") || lower.starts_with("mariadb://") {
            Some(Self::MySQL)
        } else if lower.starts_with("oracle://") {
            Some(Self::Oracle)
        } else if lower.starts_with("sqlite://") || lower.starts_with("sqlite:") {
            Some(Self::SQLite)
        } else {
            None
        }
    }

    /// Get the display name for this database type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MySQL => "MySQL",
            Self::PostgreSQL => "PostgreSQL",
            Self::Oracle => "Oracle",
            Self::SQLite => "SQLite",
        }
    }

    /// Get the default port for this database type.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::MySQL => Some(3306),
            Self::PostgreSQL => Some(5432),
            Self::Oracle => Some(1521),
            Self::SQLite => None,
        }
    }

    /// Get the conventional administrative user for this database type.
    pub fn default_username(&self) -> &'static str {
        match self {
            Self::MySQL => "root",
            Self::PostgreSQL => "postgres",
            Self::Oracle => "system",
            Self::SQLite => "",
        }
    }

    /// True for engines reached over a network socket.
    pub fn is_networked(&self) -> bool {
        !matches!(self, Self::SQLite)
    }
}

impl FromStr for DatabaseType {
    type Err = DbError;

    fn from_str(s: &str) -> DbResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySQL),
            "postgres" | "postgresql" | "pg" => Ok(Self::PostgreSQL),
            "oracle" => Ok(Self::Oracle),
            "sqlite" => Ok(Self::SQLite),
            other => Err(DbError::configuration(format!(
                "Unsupported database type '{}'. Supported types: mysql, postgresql, oracle, sqlite",
                other
            ))),
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_type_from_connection_string() {
        assert_eq!(
            DatabaseType::from_connection_string("postgres://localhost/db"),
            Some(DatabaseType::PostgreSQL)
        );
        assert_eq!(
            DatabaseType::from_connection_string("postgresql://localhost/db"),
            Some(DatabaseType::PostgreSQL)
        );
        assert_eq!(
            DatabaseType::from_connection_string("mysql://localhost/db"),
            Some(DatabaseType::MySQL)
        );
        assert_eq!(
            DatabaseType::from_connection_string("oracle://system@localhost:1521/XEPDB1"),
            Some(DatabaseType::Oracle)
        );
        assert_eq!(
            DatabaseType::from_connection_string("sqlite:test.db"),
            Some(DatabaseType::SQLite)
        );
        assert_eq!(
            DatabaseType::from_connection_string("unknown://localhost"),
            None
        );
    }

    #[test]
    fn test_database_type_from_str() {
        assert_eq!("MySQL".parse::<DatabaseType>().unwrap(), DatabaseType::MySQL);
        assert_eq!("pg".parse::<DatabaseType>().unwrap(), DatabaseType::PostgreSQL);
        assert_eq!(" oracle ".parse::<DatabaseType>().unwrap(), DatabaseType::Oracle);
        assert_eq!("sqlite".parse::<DatabaseType>().unwrap(), DatabaseType::SQLite);
    }

    #[test]
    fn test_unsupported_database_type() {
        let err = "mongodb".parse::<DatabaseType>().unwrap_err();
        assert!(matches!(err, DbError::Configuration { .. }));
        assert!(err.to_string().contains("mongodb"));
    }

    #[test]
    fn test_default_ports() {
        assert_eq!(DatabaseType::MySQL.default_port(), Some(3306));
        assert_eq!(DatabaseType::PostgreSQL.default_port(), Some(5432));
        assert_eq!(DatabaseType::Oracle.default_port(), Some(1521));
        assert_eq!(DatabaseType::SQLite.default_port(), None);
    }
}
