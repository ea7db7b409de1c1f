//! hushryd-migrate - Apply HushRyd migrations.
//!
//! Connects to the configured database, applies pending migrations (schema
//! then sample data) and prints per-table row counts. `--status` only lists
//! applied and pending migrations.

use hushryd_db::config::Config;
use hushryd_db::db::DbPool;
use hushryd_db::error::DbError;
use hushryd_db::migrations::{MigrationReport, MigrationRunner};
use hushryd_db::models::DatabaseType;
use hushryd_db::schema::core_tables;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

async fn print_status(runner: &MigrationRunner) -> Result<(), DbError> {
    let status = runner.status().await?;
    println!("Migrations:");
    for entry in &status {
        match entry.executed_at {
            Some(at) => println!("  [applied] {}_{} ({})", entry.version, entry.name, at),
            None => println!("  [pending] {}_{}", entry.version, entry.name),
        }
    }
    let pending = status.iter().filter(|s| !s.is_applied()).count();
    println!("{} applied, {} pending", status.len() - pending, pending);
    Ok(())
}

/// Confirmation lines for a run. Table creation is `IF NOT EXISTS`, so a
/// table is reported as ensured rather than created.
fn report_lines(report: &MigrationReport) -> Vec<String> {
    let mut lines = Vec::new();
    if report.applied.is_empty() {
        lines.push(format!(
            "Database is up to date ({} migrations already applied)",
            report.skipped.len()
        ));
    }
    for applied in &report.applied {
        if applied.version == "001" {
            for table in core_tables() {
                lines.push(format!("  Ensured table {}", table.name));
            }
        }
        lines.push(format!(
            "Applied migration {}_{} ({} statements)",
            applied.version, applied.name, applied.statements
        ));
    }
    lines
}

async fn migrate(runner: &MigrationRunner) -> Result<(), DbError> {
    let report = runner.run().await?;
    for line in report_lines(&report) {
        println!("{}", line);
    }

    println!();
    println!("Table row counts:");
    for (table, count) in runner.table_counts().await? {
        println!("  {:<20} {}", table, count);
    }
    Ok(())
}

fn print_hints(err: &DbError, db_type: Option<DatabaseType>) {
    eprintln!("Error: {}", err);
    if let Some(suggestion) = err.suggestion() {
        eprintln!("Hint: {}", suggestion);
    }
    eprintln!();
    eprintln!("Troubleshooting:");
    match db_type {
        Some(DatabaseType::SQLite) => {
            eprintln!("  - Check that the directory of DB_NAME exists and is writable");
        }
        Some(db_type) => {
            eprintln!(
                "  - Check that the {} server is running and reachable at DB_HOST:DB_PORT",
                db_type.display_name()
            );
            eprintln!("  - Verify DB_USER / DB_PASSWORD and that the user may create tables");
            eprintln!("  - Make sure the database named by DB_NAME exists");
        }
        None => {
            eprintln!("  - Set DB_TYPE to one of: mysql, postgresql, oracle, sqlite");
            eprintln!("  - Or pass a full connection URL with --database-url / DATABASE_URL");
        }
    }
}

async fn run(config: &Config) -> Result<(), DbError> {
    let db_config = config.database_config()?;
    info!(
        db_type = %db_config.db_type,
        target = %db_config.masked(),
        "Connecting to database"
    );

    let pool = DbPool::connect(&db_config).await?;
    if let Some(version) = pool.server_version().await {
        info!(version = %version, "Connected");
    }

    let runner = MigrationRunner::new(pool.clone());
    let result = if config.status {
        print_status(&runner).await
    } else {
        migrate(&runner).await
    };

    pool.close().await;
    result
}

#[tokio::main]
async fn main() {
    // Parse configuration from command line and environment
    let config = Config::parse_args();

    // Initialize logging
    init_tracing(&config);

    info!("Starting hushryd-migrate v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&config).await {
        error!(error = %e, "Migration failed");
        let db_type = config
            .database_config()
            .map(|c| c.db_type)
            .ok();
        print_hints(&e, db_type);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hushryd_db::migrations::AppliedMigration;

    #[test]
    fn test_report_lines_for_schema_run() {
        let report = MigrationReport {
            applied: vec![AppliedMigration {
                version: "001".to_string(),
                name: "create_core_tables".to_string(),
                statements: 12,
            }],
            skipped: Vec::new(),
        };
        let lines = report_lines(&report);
        assert_eq!(lines[0], "  Ensured table users");
        assert!(lines.iter().all(|l| !l.contains("Created")));
        assert_eq!(
            lines.last().unwrap(),
            "Applied migration 001_create_core_tables (12 statements)"
        );
    }

    #[test]
    fn test_report_lines_when_up_to_date() {
        let report = MigrationReport {
            applied: Vec::new(),
            skipped: vec!["001".to_string(), "002".to_string()],
        };
        assert_eq!(
            report_lines(&report),
            vec!["Database is up to date (2 migrations already applied)".to_string()]
        );
    }
}
