//! Data models for the HushRyd database layer.
//!
//! This module re-exports all model types used throughout the crate: the
//! engine selector, query parameters and results, and the domain entities.

#[macro_use]
mod macros;

pub mod admin;
pub mod booking;
pub mod connection;
pub mod query;
pub mod ride;
pub mod row;
pub mod sos;
pub mod user;

// Re-export commonly used types
pub use admin::{Admin, AdminRole, AdminUpdate, NewAdmin};
pub use booking::{Booking, BookingStatus, NewBooking, PaymentStatus};
pub use connection::DatabaseType;
pub use query::{QueryParam, QueryResult};
pub use ride::{Location, NewRide, Ride, RideStatus, RideUpdate, VehicleInfo};
pub use row::{Row, parse_timestamp};
pub use sos::{AlertType, NewSosAlert, SosAlert, SosPriority, SosStatus};
pub use user::{
    EmergencyContact, EmergencyContactUpdate, NewEmergencyContact, NewUser, User, UserRole,
    UserUpdate,
};
