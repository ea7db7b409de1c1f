//! Rides and the value objects they embed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    /// Lifecycle of a ride.
    pub enum RideStatus {
        Scheduled => "scheduled",
        Active => "active",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl Default for RideStatus {
    fn default() -> Self {
        RideStatus::Scheduled
    }
}

/// A geographic point with its postal address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfo {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub license_plate: String,
    pub capacity: i32,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: String,
    pub driver_id: String,
    pub from_location: Location,
    pub to_location: Location,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub price: f64,
    pub currency: String,
    pub max_passengers: i32,
    pub available_seats: i32,
    pub status: RideStatus,
    pub vehicle_info: VehicleInfo,
    pub route_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when a driver offers a ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRide {
    pub driver_id: String,
    pub from_location: Location,
    pub to_location: Location,
    pub departure_time: DateTime<Utc>,
    #[serde(default)]
    pub arrival_time: Option<DateTime<Utc>>,
    pub price: f64,
    pub currency: String,
    pub max_passengers: i32,
    /// Defaults to `max_passengers`
    #[serde(default)]
    pub available_seats: Option<i32>,
    #[serde(default)]
    pub status: RideStatus,
    pub vehicle_info: VehicleInfo,
    #[serde(default)]
    pub route_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideUpdate {
    pub from_location: Option<Location>,
    pub to_location: Option<Location>,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub max_passengers: Option<i32>,
    pub available_seats: Option<i32>,
    pub status: Option<RideStatus>,
    pub vehicle_info: Option<VehicleInfo>,
    pub route_id: Option<String>,
}
