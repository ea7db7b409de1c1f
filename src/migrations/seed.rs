//! Sample data for development databases.
//!
//! Rows carry fixed ids and are inserted one statement each with duplicate
//! keys ignored, so re-running the seed never fails or doubles data.

use crate::error::{DbError, DbResult};
use crate::models::{
    AdminRole, DatabaseType, QueryParam, RideStatus, UserRole,
};
use crate::query::{BuiltQuery, DeleteBuilder, InsertBuilder};
use crate::schema::tables::{ADMINS, EMERGENCY_CONTACTS, RIDE_FROM, RIDE_TO, RIDES, USERS};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

pub const DRIVER_ID: &str = "00000000-0000-4000-8000-000000000001";
pub const PASSENGER_ID: &str = "00000000-0000-4000-8000-000000000002";
pub const CONTACT_ID: &str = "00000000-0000-4000-8000-000000000101";
pub const RIDE_ID: &str = "00000000-0000-4000-8000-000000000201";
pub const ADMIN_ID: &str = "00000000-0000-4000-8000-000000000301";

type Record = Vec<(&'static str, QueryParam)>;

fn seed_insert(table: &str, record: Record, db: DatabaseType) -> DbResult<BuiltQuery> {
    let (columns, values): (Vec<&str>, Vec<QueryParam>) = record.into_iter().unzip();
    InsertBuilder::new()
        .into(table)
        .columns(columns)
        .values(values)
        .ignore_duplicates("id")
        .build_for(db)
}

fn departure() -> DbResult<DateTime<Utc>> {
    Utc.with_ymd_and_hms(2025, 1, 15, 8, 30, 0)
        .single()
        .ok_or_else(|| DbError::internal("invalid seed departure time"))
}

fn users() -> Vec<Record> {
    vec![
        vec![
            ("id", DRIVER_ID.into()),
            ("email", "ravi.driver@hushryd.com".into()),
            ("first_name", "Ravi".into()),
            ("last_name", "Kumar".into()),
            ("phone", "+919876543210".into()),
            ("is_verified", true.into()),
            ("is_active", true.into()),
            ("role", UserRole::Driver.into()),
        ],
        vec![
            ("id", PASSENGER_ID.into()),
            ("email", "priya.rider@hushryd.com".into()),
            ("first_name", "Priya".into()),
            ("last_name", "Sharma".into()),
            ("phone", "+919876543211".into()),
            ("is_verified", true.into()),
            ("is_active", true.into()),
            ("role", UserRole::User.into()),
        ],
    ]
}

fn contacts() -> Vec<Record> {
    vec![vec![
        ("id", CONTACT_ID.into()),
        ("user_id", PASSENGER_ID.into()),
        ("name", "Anil Sharma".into()),
        ("phone", "+919876543212".into()),
        ("relationship", "father".into()),
        ("is_primary", true.into()),
    ]]
}

fn rides() -> DbResult<Vec<Record>> {
    Ok(vec![vec![
        ("id", RIDE_ID.into()),
        ("driver_id", DRIVER_ID.into()),
        (RIDE_FROM.latitude, 12.9715987.into()),
        (RIDE_FROM.longitude, 77.5945627.into()),
        (RIDE_FROM.address, "MG Road".into()),
        (RIDE_FROM.city, "Bengaluru".into()),
        (RIDE_FROM.state, "Karnataka".into()),
        (RIDE_FROM.country, "India".into()),
        (RIDE_FROM.postal_code, "560001".into()),
        (RIDE_TO.latitude, 13.0826802.into()),
        (RIDE_TO.longitude, 80.2707184.into()),
        (RIDE_TO.address, "Anna Salai".into()),
        (RIDE_TO.city, "Chennai".into()),
        (RIDE_TO.state, "Tamil Nadu".into()),
        (RIDE_TO.country, "India".into()),
        (RIDE_TO.postal_code, "600002".into()),
        ("departure_time", departure()?.into()),
        ("price", 850.0.into()),
        ("currency", "INR".into()),
        ("max_passengers", 4i64.into()),
        ("available_seats", 4i64.into()),
        ("status", RideStatus::Scheduled.into()),
        ("vehicle_make", "Maruti Suzuki".into()),
        ("vehicle_model", "Dzire".into()),
        ("vehicle_year", 2022i64.into()),
        ("vehicle_color", "White".into()),
        ("vehicle_license_plate", "KA01AB1234".into()),
        ("vehicle_capacity", 4i64.into()),
        ("vehicle_features", json!(["ac", "music"]).into()),
    ]])
}

fn admins() -> Vec<Record> {
    vec![vec![
        ("id", ADMIN_ID.into()),
        ("email", "ops@hushryd.com".into()),
        ("first_name", "Operations".into()),
        ("last_name", "Lead".into()),
        ("role", AdminRole::SuperAdmin.into()),
        ("permissions", json!(["users", "rides", "bookings", "sos"]).into()),
        ("is_active", true.into()),
    ]]
}

pub(super) fn seed_statements(db: DatabaseType) -> DbResult<Vec<BuiltQuery>> {
    let tables = [
        (USERS, users()),
        (EMERGENCY_CONTACTS, contacts()),
        (RIDES, rides()?),
        (ADMINS, admins()),
    ];

    let mut statements = Vec::new();
    for (table, records) in tables {
        for record in records {
            statements.push(seed_insert(table, record, db)?);
        }
    }
    Ok(statements)
}

pub(super) fn unseed_statements(db: DatabaseType) -> DbResult<Vec<BuiltQuery>> {
    let seeded = [
        (ADMINS, vec![ADMIN_ID]),
        (RIDES, vec![RIDE_ID]),
        (EMERGENCY_CONTACTS, vec![CONTACT_ID]),
        (USERS, vec![PASSENGER_ID, DRIVER_ID]),
    ];

    seeded
        .into_iter()
        .map(|(table, ids)| {
            DeleteBuilder::new()
                .from(table)
                .where_in("id", ids)
                .build_for(db)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::count_placeholders;

    #[test]
    fn test_seed_statements_ignore_duplicates() {
        let statements = seed_statements(DatabaseType::SQLite).unwrap();
        assert_eq!(statements.len(), 5);
        assert!(statements.iter().all(|q| q.sql.starts_with("INSERT OR IGNORE INTO")));
        for q in &statements {
            assert_eq!(count_placeholders(&q.sql), q.params.len());
        }
    }

    #[test]
    fn test_oracle_seed_uses_one_row_per_statement() {
        let statements = seed_statements(DatabaseType::Oracle).unwrap();
        assert!(statements.iter().all(|q| q.sql.contains("IGNORE_ROW_ON_DUPKEY_INDEX")));
    }

    #[test]
    fn test_unseed_deletes_children_first() {
        let statements = unseed_statements(DatabaseType::PostgreSQL).unwrap();
        assert!(statements[0].sql.starts_with("DELETE FROM admins"));
        assert_eq!(
            statements.last().unwrap().sql,
            "DELETE FROM users WHERE id IN (?, ?)"
        );
    }
}
