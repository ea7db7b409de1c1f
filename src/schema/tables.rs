//! The HushRyd tables, defined once for every engine.

use super::model::{
    ColumnDef, ColumnDefault, ColumnType, ForeignKey, ForeignKeyAction, TableDef,
};
use crate::models::{
    AdminRole, AlertType, BookingStatus, PaymentStatus, RideStatus, SosPriority, SosStatus,
    UserRole,
};

pub const USERS: &str = "users";
pub const EMERGENCY_CONTACTS: &str = "emergency_contacts";
pub const RIDES: &str = "rides";
pub const BOOKINGS: &str = "bookings";
pub const SOS_ALERTS: &str = "sos_alerts";
pub const ADMINS: &str = "admins";
pub const MIGRATIONS: &str = "migrations";

fn id() -> ColumnDef {
    ColumnDef::new("id", ColumnType::Id)
}

fn varchar(name: &'static str, len: u32) -> ColumnDef {
    ColumnDef::new(name, ColumnType::Varchar(len))
}

fn timestamps(table: TableDef) -> TableDef {
    table
        .column(
            ColumnDef::new("created_at", ColumnType::Timestamp)
                .default(ColumnDefault::CurrentTimestamp),
        )
        .column(
            ColumnDef::new("updated_at", ColumnType::Timestamp)
                .default(ColumnDefault::CurrentTimestamp),
        )
}

/// Column names holding one embedded [`Location`](crate::models::Location).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationColumns {
    pub latitude: &'static str,
    pub longitude: &'static str,
    pub address: &'static str,
    pub city: &'static str,
    pub state: &'static str,
    pub country: &'static str,
    pub postal_code: &'static str,
}

pub const RIDE_FROM: LocationColumns = LocationColumns {
    latitude: "from_latitude",
    longitude: "from_longitude",
    address: "from_address",
    city: "from_city",
    state: "from_state",
    country: "from_country",
    postal_code: "from_postal_code",
};

pub const RIDE_TO: LocationColumns = LocationColumns {
    latitude: "to_latitude",
    longitude: "to_longitude",
    address: "to_address",
    city: "to_city",
    state: "to_state",
    country: "to_country",
    postal_code: "to_postal_code",
};

pub const SOS_LOCATION: LocationColumns = LocationColumns {
    latitude: "latitude",
    longitude: "longitude",
    address: "address",
    city: "city",
    state: "state",
    country: "country",
    postal_code: "postal_code",
};

fn location_columns(table: TableDef, names: LocationColumns) -> TableDef {
    table
        .column(ColumnDef::new(names.latitude, ColumnType::Decimal(10, 8)))
        .column(ColumnDef::new(names.longitude, ColumnType::Decimal(11, 8)))
        .column(ColumnDef::new(names.address, ColumnType::Text))
        .column(varchar(names.city, 100))
        .column(varchar(names.state, 100))
        .column(varchar(names.country, 100))
        .column(varchar(names.postal_code, 20).nullable())
}

pub fn users() -> TableDef {
    let table = TableDef::new(USERS, "id")
        .column(id())
        .column(varchar("email", 255).unique())
        .column(varchar("first_name", 100))
        .column(varchar("last_name", 100))
        .column(varchar("phone", 20).unique())
        .column(
            ColumnDef::new("is_verified", ColumnType::Boolean)
                .default(ColumnDefault::Bool(false)),
        )
        .column(ColumnDef::new("is_active", ColumnType::Boolean).default(ColumnDefault::Bool(true)))
        .column(
            ColumnDef::new("role", ColumnType::Enum(UserRole::values()))
                .default(ColumnDefault::Text("user")),
        )
        .column(varchar("profile_image", 500).nullable());
    timestamps(table).index("idx_users_role", &["role"])
}

pub fn emergency_contacts() -> TableDef {
    let table = TableDef::new(EMERGENCY_CONTACTS, "id")
        .column(id())
        .column(ColumnDef::new("user_id", ColumnType::Id))
        .column(varchar("name", 100))
        .column(varchar("phone", 20))
        .column(varchar("relationship", 50))
        .column(
            ColumnDef::new("is_primary", ColumnType::Boolean).default(ColumnDefault::Bool(false)),
        );
    timestamps(table)
        .foreign_key(ForeignKey::to("user_id", USERS, ForeignKeyAction::Cascade))
        .index("idx_emergency_contacts_user_id", &["user_id"])
}

pub fn rides() -> TableDef {
    let table = TableDef::new(RIDES, "id")
        .column(id())
        .column(ColumnDef::new("driver_id", ColumnType::Id));
    let table = location_columns(table, RIDE_FROM);
    let table = location_columns(table, RIDE_TO)
        .column(ColumnDef::new("departure_time", ColumnType::Timestamp))
        .column(ColumnDef::new("arrival_time", ColumnType::Timestamp).nullable())
        .column(ColumnDef::new("price", ColumnType::Decimal(10, 2)))
        .column(varchar("currency", 3).default(ColumnDefault::Text("INR")))
        .column(ColumnDef::new("max_passengers", ColumnType::Integer))
        .column(ColumnDef::new("available_seats", ColumnType::Integer))
        .column(
            ColumnDef::new("status", ColumnType::Enum(RideStatus::values()))
                .default(ColumnDefault::Text("scheduled")),
        )
        .column(varchar("vehicle_make", 50))
        .column(varchar("vehicle_model", 50))
        .column(ColumnDef::new("vehicle_year", ColumnType::Integer))
        .column(varchar("vehicle_color", 30))
        .column(varchar("vehicle_license_plate", 20))
        .column(ColumnDef::new("vehicle_capacity", ColumnType::Integer))
        .column(ColumnDef::new("vehicle_features", ColumnType::Json).nullable())
        .column(varchar("route_id", 36).nullable());
    timestamps(table)
        .foreign_key(ForeignKey::to("driver_id", USERS, ForeignKeyAction::Cascade))
        .check("available_seats >= 0")
        .check("available_seats <= max_passengers")
        .index("idx_rides_driver_id", &["driver_id"])
        .index("idx_rides_status", &["status"])
        .index("idx_rides_departure_time", &["departure_time"])
}

pub fn bookings() -> TableDef {
    let table = TableDef::new(BOOKINGS, "id")
        .column(id())
        .column(ColumnDef::new("user_id", ColumnType::Id))
        .column(ColumnDef::new("ride_id", ColumnType::Id))
        .column(ColumnDef::new("passenger_count", ColumnType::Integer).default(ColumnDefault::Int(1)))
        .column(ColumnDef::new("total_price", ColumnType::Decimal(10, 2)))
        .column(varchar("currency", 3).default(ColumnDefault::Text("INR")))
        .column(
            ColumnDef::new("status", ColumnType::Enum(BookingStatus::values()))
                .default(ColumnDefault::Text("pending")),
        )
        .column(
            ColumnDef::new("payment_status", ColumnType::Enum(PaymentStatus::values()))
                .default(ColumnDefault::Text("pending")),
        )
        .column(varchar("payment_method", 50).nullable())
        .column(ColumnDef::new("special_requests", ColumnType::Text).nullable());
    timestamps(table)
        .foreign_key(ForeignKey::to("user_id", USERS, ForeignKeyAction::Cascade))
        .foreign_key(ForeignKey::to("ride_id", RIDES, ForeignKeyAction::Cascade))
        .check("passenger_count > 0")
        .index("idx_bookings_user_id", &["user_id"])
        .index("idx_bookings_ride_id", &["ride_id"])
        .index("idx_bookings_status", &["status"])
}

pub fn sos_alerts() -> TableDef {
    let table = TableDef::new(SOS_ALERTS, "id")
        .column(id())
        .column(ColumnDef::new("user_id", ColumnType::Id))
        .column(ColumnDef::new("ride_id", ColumnType::Id).nullable());
    let table = location_columns(table, SOS_LOCATION)
        .column(ColumnDef::new("alert_type", ColumnType::Enum(AlertType::values())))
        .column(ColumnDef::new("message", ColumnType::Text).nullable())
        .column(
            ColumnDef::new("status", ColumnType::Enum(SosStatus::values()))
                .default(ColumnDefault::Text("active")),
        )
        .column(
            ColumnDef::new("priority", ColumnType::Enum(SosPriority::values()))
                .default(ColumnDefault::Text("medium")),
        )
        .column(ColumnDef::new("resolved_by", ColumnType::Id).nullable())
        .column(ColumnDef::new("resolved_at", ColumnType::Timestamp).nullable())
        .column(ColumnDef::new("admin_notes", ColumnType::Text).nullable());
    timestamps(table)
        .foreign_key(ForeignKey::to("user_id", USERS, ForeignKeyAction::Cascade))
        .foreign_key(ForeignKey::to("ride_id", RIDES, ForeignKeyAction::SetNull))
        .foreign_key(ForeignKey::to("resolved_by", USERS, ForeignKeyAction::SetNull))
        .index("idx_sos_alerts_user_id", &["user_id"])
        .index("idx_sos_alerts_status", &["status"])
        .index("idx_sos_alerts_priority", &["priority"])
}

pub fn admins() -> TableDef {
    let table = TableDef::new(ADMINS, "id")
        .column(id())
        .column(varchar("email", 255).unique())
        .column(varchar("first_name", 100))
        .column(varchar("last_name", 100))
        .column(
            ColumnDef::new("role", ColumnType::Enum(AdminRole::values()))
                .default(ColumnDefault::Text("admin")),
        )
        .column(ColumnDef::new("permissions", ColumnType::Json).nullable())
        .column(ColumnDef::new("is_active", ColumnType::Boolean).default(ColumnDefault::Bool(true)))
        .column(ColumnDef::new("last_login", ColumnType::Timestamp).nullable());
    timestamps(table)
}

/// Bookkeeping table for applied migrations.
pub fn migrations() -> TableDef {
    TableDef::new(MIGRATIONS, "version")
        .column(varchar("version", 32))
        .column(varchar("name", 255))
        .column(
            ColumnDef::new("executed_at", ColumnType::Timestamp)
                .default(ColumnDefault::CurrentTimestamp),
        )
}

/// Domain tables in creation order (referenced tables first).
pub fn core_tables() -> Vec<TableDef> {
    vec![
        users(),
        emergency_contacts(),
        rides(),
        bookings(),
        sos_alerts(),
        admins(),
    ]
}
