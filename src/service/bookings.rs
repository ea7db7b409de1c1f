use super::{
    DatabaseService, FromRow, Record, by_id, fetch_optional_in, insert_record, new_id, now_millis,
    parse_enum,
};
use crate::db::DbTransaction;
use crate::error::{DbError, DbResult};
use crate::models::{Booking, BookingStatus, NewBooking, QueryParam, Row};
use crate::query::{BuiltQuery, DeleteBuilder, SelectBuilder, SortOrder, UpdateBuilder};
use crate::schema::tables::{BOOKINGS, RIDES};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

impl FromRow for Booking {
    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            id: row.get_str("id")?,
            user_id: row.get_str("user_id")?,
            ride_id: row.get_str("ride_id")?,
            passenger_count: row.get_i32("passenger_count")?,
            total_price: row.get_f64("total_price")?,
            currency: row.get_str("currency")?,
            status: parse_enum(row, "status")?,
            payment_status: parse_enum(row, "payment_status")?,
            payment_method: row.get_opt_str("payment_method")?,
            special_requests: row.get_opt_str("special_requests")?,
            created_at: row.get_datetime("created_at")?,
            updated_at: row.get_datetime("updated_at")?,
        })
    }
}

/// Seats, price and currency of the ride being booked.
struct RideCapacity {
    available_seats: i64,
    price: f64,
    currency: String,
}

impl FromRow for RideCapacity {
    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            available_seats: row.get_i64("available_seats")?,
            price: row.get_f64("price")?,
            currency: row.get_str("currency")?,
        })
    }
}

/// Take `seats` from a ride only while enough remain.
fn reserve_seats(ride_id: &str, seats: i64, now: DateTime<Utc>) -> BuiltQuery {
    BuiltQuery {
        sql: format!(
            "UPDATE {} SET available_seats = available_seats - ?, updated_at = ? \
             WHERE id = ? AND available_seats >= ?",
            RIDES
        ),
        params: vec![
            seats.into(),
            now.into(),
            ride_id.into(),
            QueryParam::Int(seats),
        ],
    }
}

fn release_seats(ride_id: &str, seats: i64, now: DateTime<Utc>) -> BuiltQuery {
    BuiltQuery {
        sql: format!(
            "UPDATE {} SET available_seats = available_seats + ?, updated_at = ? WHERE id = ?",
            RIDES
        ),
        params: vec![seats.into(), now.into(), ride_id.into()],
    }
}

/// Lock the ride and take `seats` from it, failing when fewer remain.
async fn take_seats(
    tx: &mut DbTransaction,
    ride_id: &str,
    seats: i64,
    now: DateTime<Utc>,
) -> DbResult<RideCapacity> {
    let ride_query = SelectBuilder::new()
        .select(["available_seats", "price", "currency"])
        .from(RIDES)
        .where_("id = ?", [ride_id])
        .for_update();
    let ride = fetch_optional_in::<RideCapacity>(tx, &ride_query)
        .await?
        .ok_or_else(|| DbError::not_found("ride", ride_id))?;
    if seats > ride.available_seats {
        return Err(DbError::capacity_exceeded(ride_id, seats, ride.available_seats));
    }

    let reserved = reserve_seats(ride_id, seats, now).execute_in(tx).await?;
    if reserved.row_count == 0 {
        // Seats were taken between the read and the update
        return Err(DbError::capacity_exceeded(ride_id, seats, ride.available_seats));
    }
    Ok(ride)
}

fn set_status(id: &str, status: BookingStatus, now: DateTime<Utc>) -> UpdateBuilder {
    UpdateBuilder::new()
        .table(BOOKINGS)
        .set("status", status)
        .set("updated_at", now)
        .where_("id = ?", [id])
}

impl DatabaseService {
    /// Book seats on a ride.
    ///
    /// Runs in one transaction: the ride is read (and locked where the engine
    /// supports it), the seats taken with a guarded update and the booking
    /// inserted. Asking for more seats than remain fails with
    /// [`DbError::CapacityExceeded`] and leaves nothing behind. A booking
    /// created already cancelled holds no seats.
    pub async fn create_booking(&self, input: NewBooking) -> DbResult<Booking> {
        let now = now_millis();

        let booking = self
            .pool()
            .transaction(move |tx| {
                Box::pin(async move {
                    let held = match input.status {
                        BookingStatus::Cancelled => 0,
                        _ => i64::from(input.passenger_count),
                    };
                    let ride = take_seats(tx, &input.ride_id, held, now).await?;

                    let booking = Booking {
                        id: new_id(),
                        total_price: input
                            .total_price
                            .unwrap_or(ride.price * f64::from(input.passenger_count)),
                        currency: input.currency.unwrap_or(ride.currency),
                        user_id: input.user_id,
                        ride_id: input.ride_id,
                        passenger_count: input.passenger_count,
                        status: input.status,
                        payment_status: input.payment_status,
                        payment_method: input.payment_method,
                        special_requests: input.special_requests,
                        created_at: now,
                        updated_at: now,
                    };
                    let record: Record = vec![
                        ("id", booking.id.as_str().into()),
                        ("user_id", booking.user_id.as_str().into()),
                        ("ride_id", booking.ride_id.as_str().into()),
                        ("passenger_count", booking.passenger_count.into()),
                        ("total_price", booking.total_price.into()),
                        ("currency", booking.currency.as_str().into()),
                        ("status", booking.status.into()),
                        ("payment_status", booking.payment_status.into()),
                        ("payment_method", booking.payment_method.clone().into()),
                        ("special_requests", booking.special_requests.clone().into()),
                        ("created_at", now.into()),
                        ("updated_at", now.into()),
                    ];
                    insert_record(BOOKINGS, record).execute_in(tx).await?;
                    Ok::<_, DbError>(booking)
                })
            })
            .await?;

        info!(
            booking_id = %booking.id,
            ride_id = %booking.ride_id,
            seats = booking.passenger_count,
            "Created booking"
        );
        Ok(booking)
    }

    pub async fn get_booking_by_id(&self, id: &str) -> DbResult<Option<Booking>> {
        self.fetch_optional(&by_id(BOOKINGS, id)).await
    }

    /// A passenger's bookings, newest first.
    pub async fn get_bookings_by_user(&self, user_id: &str) -> DbResult<Vec<Booking>> {
        let query = SelectBuilder::new()
            .from(BOOKINGS)
            .where_("user_id = ?", [user_id])
            .order_by("created_at", SortOrder::Desc);
        self.fetch_all(&query).await
    }

    /// Bookings on a ride, oldest first.
    pub async fn get_bookings_by_ride(&self, ride_id: &str) -> DbResult<Vec<Booking>> {
        let query = SelectBuilder::new()
            .from(BOOKINGS)
            .where_("ride_id = ?", [ride_id])
            .order_by("created_at", SortOrder::Asc);
        self.fetch_all(&query).await
    }

    /// Change a booking's status. Cancelling goes through
    /// [`cancel_booking`](Self::cancel_booking) so the seats are returned.
    ///
    /// Reviving a cancelled booking takes its seats again and fails with
    /// [`DbError::CapacityExceeded`] when the ride no longer has them.
    pub async fn update_booking_status(
        &self,
        id: &str,
        status: BookingStatus,
    ) -> DbResult<Option<Booking>> {
        if status == BookingStatus::Cancelled {
            return self.cancel_booking(id).await;
        }
        let now = now_millis();
        let lookup = by_id(BOOKINGS, id).for_update();

        self.pool()
            .transaction(move |tx| {
                Box::pin(async move {
                    let Some(mut booking) = fetch_optional_in::<Booking>(tx, &lookup).await? else {
                        return Ok(None);
                    };
                    if booking.status == BookingStatus::Cancelled {
                        let seats = i64::from(booking.passenger_count);
                        take_seats(tx, &booking.ride_id, seats, now).await?;
                    }

                    set_status(&booking.id, status, now).execute_in(tx).await?;
                    booking.status = status;
                    booking.updated_at = now;
                    Ok::<_, DbError>(Some(booking))
                })
            })
            .await
    }

    /// Cancel a booking and give its seats back to the ride.
    ///
    /// Cancelling an already cancelled booking changes nothing. Completed
    /// bookings cannot be cancelled.
    pub async fn cancel_booking(&self, id: &str) -> DbResult<Option<Booking>> {
        let now = now_millis();
        let lookup = by_id(BOOKINGS, id).for_update();

        let cancelled = self
            .pool()
            .transaction(move |tx| {
                Box::pin(async move {
                    let Some(mut booking) = fetch_optional_in::<Booking>(tx, &lookup).await? else {
                        return Ok(None);
                    };
                    match booking.status {
                        BookingStatus::Cancelled => return Ok(Some(booking)),
                        BookingStatus::Completed => {
                            return Err(DbError::invalid_query(format!(
                                "booking {} is completed and cannot be cancelled",
                                booking.id
                            )));
                        }
                        BookingStatus::Pending | BookingStatus::Confirmed => {}
                    }

                    set_status(&booking.id, BookingStatus::Cancelled, now)
                        .execute_in(tx)
                        .await?;
                    release_seats(&booking.ride_id, i64::from(booking.passenger_count), now)
                        .execute_in(tx)
                        .await?;

                    booking.status = BookingStatus::Cancelled;
                    booking.updated_at = now;
                    Ok::<_, DbError>(Some(booking))
                })
            })
            .await?;

        if let Some(booking) = &cancelled {
            debug!(booking_id = %booking.id, ride_id = %booking.ride_id, "Cancelled booking");
        }
        Ok(cancelled)
    }

    /// Delete a booking. Seats it still holds go back to the ride.
    pub async fn delete_booking(&self, id: &str) -> DbResult<bool> {
        let now = now_millis();
        let lookup = by_id(BOOKINGS, id).for_update();

        self.pool()
            .transaction(move |tx| {
                Box::pin(async move {
                    let Some(booking) = fetch_optional_in::<Booking>(tx, &lookup).await? else {
                        return Ok(false);
                    };
                    if booking.status != BookingStatus::Cancelled {
                        release_seats(&booking.ride_id, i64::from(booking.passenger_count), now)
                            .execute_in(tx)
                            .await?;
                    }
                    let deleted = DeleteBuilder::new()
                        .from(BOOKINGS)
                        .where_("id = ?", [booking.id.as_str()])
                        .execute_in(tx)
                        .await?;
                    Ok::<_, DbError>(deleted.row_count > 0)
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::count_placeholders;

    #[test]
    fn test_seat_statements_bind_every_placeholder() {
        let now = Utc::now();
        for q in [reserve_seats("r1", 2, now), release_seats("r1", 2, now)] {
            assert_eq!(count_placeholders(&q.sql), q.params.len());
        }
        assert!(reserve_seats("r1", 2, now).sql.ends_with("AND available_seats >= ?"));
    }
}
