use super::geo::GeoPoint;
use super::{
    DatabaseService, FromRow, Record, by_id, insert_record, new_id, now_millis, parse_enum,
    string_list,
};
use crate::error::DbResult;
use crate::models::{Location, NewRide, QueryParam, Ride, RideStatus, RideUpdate, Row, VehicleInfo};
use crate::query::{SelectBuilder, SortOrder, UpdateBuilder};
use crate::schema::tables::{LocationColumns, RIDE_FROM, RIDE_TO, RIDES};
use serde_json::json;
use tracing::debug;

pub(crate) fn location_from_row(row: &Row, names: LocationColumns) -> DbResult<Location> {
    Ok(Location {
        latitude: row.get_f64(names.latitude)?,
        longitude: row.get_f64(names.longitude)?,
        address: row.get_str(names.address)?,
        city: row.get_str(names.city)?,
        state: row.get_str(names.state)?,
        country: row.get_str(names.country)?,
        postal_code: row.get_opt_str(names.postal_code)?,
    })
}

pub(crate) fn location_record(names: LocationColumns, location: &Location) -> Record {
    vec![
        (names.latitude, location.latitude.into()),
        (names.longitude, location.longitude.into()),
        (names.address, location.address.as_str().into()),
        (names.city, location.city.as_str().into()),
        (names.state, location.state.as_str().into()),
        (names.country, location.country.as_str().into()),
        (names.postal_code, location.postal_code.clone().into()),
    ]
}

fn vehicle_record(vehicle: &VehicleInfo) -> Record {
    vec![
        ("vehicle_make", vehicle.make.as_str().into()),
        ("vehicle_model", vehicle.model.as_str().into()),
        ("vehicle_year", vehicle.year.into()),
        ("vehicle_color", vehicle.color.as_str().into()),
        ("vehicle_license_plate", vehicle.license_plate.as_str().into()),
        ("vehicle_capacity", vehicle.capacity.into()),
        ("vehicle_features", QueryParam::Json(json!(vehicle.features))),
    ]
}

impl FromRow for Ride {
    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            id: row.get_str("id")?,
            driver_id: row.get_str("driver_id")?,
            from_location: location_from_row(row, RIDE_FROM)?,
            to_location: location_from_row(row, RIDE_TO)?,
            departure_time: row.get_datetime("departure_time")?,
            arrival_time: row.get_opt_datetime("arrival_time")?,
            price: row.get_f64("price")?,
            currency: row.get_str("currency")?,
            max_passengers: row.get_i32("max_passengers")?,
            available_seats: row.get_i32("available_seats")?,
            status: parse_enum(row, "status")?,
            vehicle_info: VehicleInfo {
                make: row.get_str("vehicle_make")?,
                model: row.get_str("vehicle_model")?,
                year: row.get_i32("vehicle_year")?,
                color: row.get_str("vehicle_color")?,
                license_plate: row.get_str("vehicle_license_plate")?,
                capacity: row.get_i32("vehicle_capacity")?,
                features: string_list(row, "vehicle_features")?,
            },
            route_id: row.get_opt_str("route_id")?,
            created_at: row.get_datetime("created_at")?,
            updated_at: row.get_datetime("updated_at")?,
        })
    }
}

impl DatabaseService {
    pub async fn create_ride(&self, input: NewRide) -> DbResult<Ride> {
        let now = now_millis();
        let ride = Ride {
            id: new_id(),
            driver_id: input.driver_id,
            from_location: input.from_location,
            to_location: input.to_location,
            departure_time: input.departure_time,
            arrival_time: input.arrival_time,
            price: input.price,
            currency: input.currency,
            max_passengers: input.max_passengers,
            available_seats: input.available_seats.unwrap_or(input.max_passengers),
            status: input.status,
            vehicle_info: input.vehicle_info,
            route_id: input.route_id,
            created_at: now,
            updated_at: now,
        };

        let mut record: Record = vec![
            ("id", ride.id.as_str().into()),
            ("driver_id", ride.driver_id.as_str().into()),
        ];
        record.extend(location_record(RIDE_FROM, &ride.from_location));
        record.extend(location_record(RIDE_TO, &ride.to_location));
        record.extend([
            ("departure_time", ride.departure_time.into()),
            ("arrival_time", ride.arrival_time.into()),
            ("price", ride.price.into()),
            ("currency", ride.currency.as_str().into()),
            ("max_passengers", ride.max_passengers.into()),
            ("available_seats", ride.available_seats.into()),
            ("status", ride.status.into()),
        ]);
        record.extend(vehicle_record(&ride.vehicle_info));
        record.extend([
            ("route_id", ride.route_id.clone().into()),
            ("created_at", now.into()),
            ("updated_at", now.into()),
        ]);
        insert_record(RIDES, record).execute(self.pool()).await?;

        debug!(ride_id = %ride.id, driver_id = %ride.driver_id, "Created ride");
        Ok(ride)
    }

    pub async fn get_ride_by_id(&self, id: &str) -> DbResult<Option<Ride>> {
        self.fetch_optional(&by_id(RIDES, id)).await
    }

    /// A driver's rides by departure time.
    pub async fn get_rides_by_driver(&self, driver_id: &str) -> DbResult<Vec<Ride>> {
        let query = SelectBuilder::new()
            .from(RIDES)
            .where_("driver_id = ?", [driver_id])
            .order_by("departure_time", SortOrder::Asc);
        self.fetch_all(&query).await
    }

    /// Scheduled rides with free seats that start within `radius_km` of
    /// `origin` and end within `radius_km` of `destination`.
    ///
    /// Distances are computed in process over every candidate ride; the
    /// boundary is inclusive.
    pub async fn get_rides_by_location(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        radius_km: f64,
    ) -> DbResult<Vec<Ride>> {
        let query = SelectBuilder::new()
            .from(RIDES)
            .where_("status = ?", [RideStatus::Scheduled])
            .where_("available_seats > ?", [0i64])
            .order_by("departure_time", SortOrder::Asc);
        let candidates: Vec<Ride> = self.fetch_all(&query).await?;
        let total = candidates.len();

        let matches: Vec<Ride> = candidates
            .into_iter()
            .filter(|ride| {
                origin.distance_km(&GeoPoint::from(&ride.from_location)) <= radius_km
                    && destination.distance_km(&GeoPoint::from(&ride.to_location)) <= radius_km
            })
            .collect();

        debug!(candidates = total, matches = matches.len(), radius_km, "Filtered rides by location");
        Ok(matches)
    }

    pub async fn update_ride(&self, id: &str, changes: RideUpdate) -> DbResult<Option<Ride>> {
        let mut update = UpdateBuilder::new().table(RIDES);
        let mut fields: Record = Vec::new();
        if let Some(from) = &changes.from_location {
            fields.extend(location_record(RIDE_FROM, from));
        }
        if let Some(to) = &changes.to_location {
            fields.extend(location_record(RIDE_TO, to));
        }
        if let Some(vehicle) = &changes.vehicle_info {
            fields.extend(vehicle_record(vehicle));
        }
        for (column, value) in fields {
            update = update.set(column, value);
        }

        if let Some(departure_time) = changes.departure_time {
            update = update.set("departure_time", departure_time);
        }
        if let Some(arrival_time) = changes.arrival_time {
            update = update.set("arrival_time", arrival_time);
        }
        if let Some(price) = changes.price {
            update = update.set("price", price);
        }
        if let Some(currency) = changes.currency {
            update = update.set("currency", currency);
        }
        if let Some(max_passengers) = changes.max_passengers {
            update = update.set("max_passengers", max_passengers);
        }
        if let Some(available_seats) = changes.available_seats {
            update = update.set("available_seats", available_seats);
        }
        if let Some(status) = changes.status {
            update = update.set("status", status);
        }
        if let Some(route_id) = changes.route_id {
            update = update.set("route_id", route_id);
        }

        update
            .set("updated_at", now_millis())
            .where_("id = ?", [id])
            .execute(self.pool())
            .await?;
        self.get_ride_by_id(id).await
    }

    pub async fn update_ride_status(&self, id: &str, status: RideStatus) -> DbResult<Option<Ride>> {
        self.update_ride(
            id,
            RideUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn delete_ride(&self, id: &str) -> DbResult<bool> {
        self.delete_by_id(RIDES, id).await
    }
}
