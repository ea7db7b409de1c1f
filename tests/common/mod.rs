//! Shared setup for the integration tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use hushryd_db::config::{ConfigOverrides, DatabaseConfig};
use hushryd_db::db::DbPool;
use hushryd_db::migrations::{MigrationRunner, builtin_migrations};
use hushryd_db::models::{Location, NewRide, NewUser, Ride, User, UserRole, VehicleInfo};
use hushryd_db::service::DatabaseService;
use tempfile::TempDir;

/// A SQLite database file in a temporary directory.
///
/// The directory is removed when the returned guard drops.
pub async fn sqlite_pool() -> (DbPool, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hushryd.db");
    let url = format!("sqlite:{}", path.display());
    let config = DatabaseConfig::parse_url(&url, &ConfigOverrides::default()).unwrap();
    let pool = DbPool::connect(&config).await.unwrap();
    (pool, dir)
}

/// A service over a fresh database holding the schema but no sample data.
pub async fn empty_service() -> (DatabaseService, TempDir) {
    let (pool, dir) = sqlite_pool().await;
    let schema_only = builtin_migrations()
        .into_iter()
        .filter(|m| m.version == "001")
        .collect();
    MigrationRunner::with_migrations(pool.clone(), schema_only)
        .run()
        .await
        .unwrap();
    (DatabaseService::new(pool), dir)
}

pub fn new_user(tag: &str, role: UserRole) -> NewUser {
    NewUser {
        email: format!("{}@example.com", tag),
        first_name: "Test".to_string(),
        last_name: tag.to_string(),
        phone: format!("+91-{}", tag),
        role,
        ..NewUser::default()
    }
}

pub async fn create_user(service: &DatabaseService, tag: &str, role: UserRole) -> User {
    service.create_user(new_user(tag, role)).await.unwrap()
}

pub fn location(city: &str, latitude: f64, longitude: f64) -> Location {
    Location {
        latitude,
        longitude,
        address: format!("1 Main Street, {}", city),
        city: city.to_string(),
        state: "Karnataka".to_string(),
        country: "India".to_string(),
        postal_code: Some("560001".to_string()),
    }
}

pub fn bengaluru() -> Location {
    location("Bengaluru", 12.9715987, 77.5945627)
}

pub fn mysuru() -> Location {
    location("Mysuru", 12.2958104, 76.6393805)
}

pub fn new_ride(driver_id: &str, seats: i32) -> NewRide {
    NewRide {
        driver_id: driver_id.to_string(),
        from_location: bengaluru(),
        to_location: mysuru(),
        departure_time: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        arrival_time: None,
        price: 450.5,
        currency: "INR".to_string(),
        max_passengers: seats,
        available_seats: None,
        status: Default::default(),
        vehicle_info: VehicleInfo {
            make: "Tata".to_string(),
            model: "Nexon".to_string(),
            year: 2023,
            color: "Blue".to_string(),
            license_plate: "KA05MN4321".to_string(),
            capacity: seats,
            features: vec!["ac".to_string(), "music".to_string()],
        },
        route_id: None,
    }
}

pub async fn create_ride(service: &DatabaseService, driver_id: &str, seats: i32) -> Ride {
    service.create_ride(new_ride(driver_id, seats)).await.unwrap()
}
