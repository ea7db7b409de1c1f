//! Integration tests for the migration runner on SQLite files.

mod common;

use common::sqlite_pool;
use hushryd_db::migrations::MigrationRunner;
use hushryd_db::models::UserRole;
use std::collections::HashMap;

#[tokio::test]
async fn test_running_twice_is_idempotent() {
    let (pool, _dir) = sqlite_pool().await;
    let runner = MigrationRunner::new(pool.clone());

    let first = runner.run().await.unwrap();
    let applied: Vec<&str> = first.applied.iter().map(|m| m.version.as_str()).collect();
    assert_eq!(applied, vec!["001", "002"]);
    let counts_after_first = runner.table_counts().await.unwrap();

    let second = runner.run().await.unwrap();
    assert!(second.applied.is_empty());
    assert_eq!(second.skipped, vec!["001", "002"]);
    assert_eq!(runner.table_counts().await.unwrap(), counts_after_first);

    let tracked = pool
        .query("SELECT COUNT(*) AS total FROM migrations", &[])
        .await
        .unwrap();
    assert_eq!(tracked.first().unwrap().get_i64("total").unwrap(), 2);
}

#[tokio::test]
async fn test_seed_data_counts() {
    let (pool, _dir) = sqlite_pool().await;
    let runner = MigrationRunner::new(pool);
    runner.run().await.unwrap();

    let counts: HashMap<String, i64> = runner.table_counts().await.unwrap().into_iter().collect();
    assert_eq!(counts["users"], 2);
    assert_eq!(counts["emergency_contacts"], 1);
    assert_eq!(counts["rides"], 1);
    assert_eq!(counts["bookings"], 0);
    assert_eq!(counts["sos_alerts"], 0);
    assert_eq!(counts["admins"], 1);
}

#[tokio::test]
async fn test_seeded_rows_decode_through_service() {
    let (pool, _dir) = sqlite_pool().await;
    MigrationRunner::new(pool.clone()).run().await.unwrap();

    let service = hushryd_db::DatabaseService::new(pool);
    let drivers = service.list_users(Some(UserRole::Driver), 10, 0).await.unwrap();
    assert_eq!(drivers.len(), 1);

    let rides = service.get_rides_by_driver(&drivers[0].id).await.unwrap();
    assert_eq!(rides.len(), 1);
    assert_eq!(rides[0].vehicle_info.features, vec!["ac", "music"]);
    assert_eq!(rides[0].available_seats, 4);

    let admin = service
        .get_admin_by_email("ops@hushryd.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.permissions.len(), 4);
}

#[tokio::test]
async fn test_status_before_and_after() {
    let (pool, _dir) = sqlite_pool().await;
    let runner = MigrationRunner::new(pool);

    let before = runner.status().await.unwrap();
    assert_eq!(before.len(), 2);
    assert!(before.iter().all(|s| !s.is_applied()));

    runner.run().await.unwrap();
    let after = runner.status().await.unwrap();
    assert!(after.iter().all(|s| s.is_applied()));
}

#[tokio::test]
async fn test_revert_then_reapply() {
    let (pool, _dir) = sqlite_pool().await;
    let runner = MigrationRunner::new(pool);
    runner.run().await.unwrap();

    assert_eq!(runner.revert_last().await.unwrap().as_deref(), Some("002"));
    assert_eq!(runner.revert_last().await.unwrap().as_deref(), Some("001"));
    assert_eq!(runner.revert_last().await.unwrap(), None);

    let report = runner.run().await.unwrap();
    assert_eq!(report.applied.len(), 2);
}
