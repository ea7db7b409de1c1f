//! Integration tests for seat booking.
//!
//! Tests verify that:
//! - Booking takes seats and rejects over-booking with `CapacityExceeded`
//! - A failure anywhere in the booking transaction leaves nothing behind
//! - Cancelling returns seats exactly once
//! - Seat counts stay consistent over random booking/cancel sequences

mod common;

use common::{create_ride, create_user, empty_service};
use hushryd_db::error::DbError;
use hushryd_db::models::{BookingStatus, NewBooking, PaymentStatus, UserRole};
use hushryd_db::service::DatabaseService;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn booking(user_id: &str, ride_id: &str, passengers: i32) -> NewBooking {
    NewBooking {
        user_id: user_id.to_string(),
        ride_id: ride_id.to_string(),
        passenger_count: passengers,
        ..Default::default()
    }
}

async fn seats_left(service: &DatabaseService, ride_id: &str) -> i32 {
    service
        .get_ride_by_id(ride_id)
        .await
        .unwrap()
        .unwrap()
        .available_seats
}

#[tokio::test]
async fn test_book_two_then_reject_three() {
    let (service, _dir) = empty_service().await;
    let driver = create_user(&service, "driver", UserRole::Driver).await;
    let rider = create_user(&service, "rider", UserRole::User).await;
    let ride = create_ride(&service, &driver.id, 4).await;

    let first = service
        .create_booking(booking(&rider.id, &ride.id, 2))
        .await
        .unwrap();
    assert_eq!(first.total_price, ride.price * 2.0);
    assert_eq!(first.currency, "INR");
    assert_eq!(first.status, BookingStatus::Pending);
    assert_eq!(first.payment_status, PaymentStatus::Pending);
    assert_eq!(seats_left(&service, &ride.id).await, 2);

    let err = service
        .create_booking(booking(&rider.id, &ride.id, 3))
        .await
        .unwrap_err();
    match err {
        DbError::CapacityExceeded {
            ride_id,
            requested,
            available,
        } => {
            assert_eq!(ride_id, ride.id);
            assert_eq!(requested, 3);
            assert_eq!(available, 2);
        }
        other => panic!("expected CapacityExceeded, got {other:?}"),
    }

    assert_eq!(seats_left(&service, &ride.id).await, 2);
    assert_eq!(service.get_bookings_by_ride(&ride.id).await.unwrap(), vec![first]);
}

#[tokio::test]
async fn test_booking_round_trip_and_explicit_price() {
    let (service, _dir) = empty_service().await;
    let driver = create_user(&service, "driver", UserRole::Driver).await;
    let rider = create_user(&service, "rider", UserRole::User).await;
    let ride = create_ride(&service, &driver.id, 4).await;

    let created = service
        .create_booking(NewBooking {
            total_price: Some(999.0),
            currency: Some("USD".to_string()),
            payment_method: Some("upi".to_string()),
            special_requests: Some("front seat".to_string()),
            ..booking(&rider.id, &ride.id, 1)
        })
        .await
        .unwrap();
    assert_eq!(created.total_price, 999.0);
    assert_eq!(created.currency, "USD");

    assert_eq!(
        service.get_booking_by_id(&created.id).await.unwrap(),
        Some(created.clone())
    );
    assert_eq!(
        service.get_bookings_by_user(&rider.id).await.unwrap(),
        vec![created.clone()]
    );

    let confirmed = service
        .update_booking_status(&created.id, BookingStatus::Confirmed)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(seats_left(&service, &ride.id).await, 3);

    assert!(service.delete_booking(&created.id).await.unwrap());
    assert!(!service.delete_booking(&created.id).await.unwrap());
}

#[tokio::test]
async fn test_booking_unknown_ride_is_not_found() {
    let (service, _dir) = empty_service().await;
    let rider = create_user(&service, "rider", UserRole::User).await;

    let err = service
        .create_booking(booking(&rider.id, "no-such-ride", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "ride"));
    assert!(service.get_bookings_by_user(&rider.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_seat_update_rolls_back_booking() {
    let (service, _dir) = empty_service().await;
    let driver = create_user(&service, "driver", UserRole::Driver).await;
    let rider = create_user(&service, "rider", UserRole::User).await;
    let ride = create_ride(&service, &driver.id, 4).await;

    service
        .pool()
        .query(
            "CREATE TRIGGER block_seat_update BEFORE UPDATE OF available_seats ON rides \
             BEGIN SELECT RAISE(ABORT, 'seat update blocked'); END",
            &[],
        )
        .await
        .unwrap();

    let err = service
        .create_booking(booking(&rider.id, &ride.id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Database { .. }), "unexpected error: {err:?}");
    assert!(err.to_string().contains("seat update blocked"));

    assert!(service.get_bookings_by_ride(&ride.id).await.unwrap().is_empty());
    assert_eq!(seats_left(&service, &ride.id).await, 4);
}

#[tokio::test]
async fn test_cancel_restores_seats_once() {
    let (service, _dir) = empty_service().await;
    let driver = create_user(&service, "driver", UserRole::Driver).await;
    let rider = create_user(&service, "rider", UserRole::User).await;
    let ride = create_ride(&service, &driver.id, 4).await;

    let created = service
        .create_booking(booking(&rider.id, &ride.id, 3))
        .await
        .unwrap();
    assert_eq!(seats_left(&service, &ride.id).await, 1);

    let cancelled = service.cancel_booking(&created.id).await.unwrap().unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(seats_left(&service, &ride.id).await, 4);

    let again = service
        .update_booking_status(&created.id, BookingStatus::Cancelled)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again.status, BookingStatus::Cancelled);
    assert_eq!(seats_left(&service, &ride.id).await, 4);

    assert_eq!(service.cancel_booking("missing").await.unwrap(), None);
}

#[tokio::test]
async fn test_random_sequences_keep_seat_invariant() {
    const MAX_SEATS: i32 = 6;
    let (service, _dir) = empty_service().await;
    let driver = create_user(&service, "driver", UserRole::Driver).await;
    let rider = create_user(&service, "rider", UserRole::User).await;
    let ride = create_ride(&service, &driver.id, MAX_SEATS).await;

    let mut rng = StdRng::seed_from_u64(0x4855_5348);
    let mut active: Vec<(String, i32)> = Vec::new();
    let mut expected_left = MAX_SEATS;

    for _ in 0..40 {
        if active.is_empty() || rng.gen_bool(0.6) {
            let passengers = rng.gen_range(1..=3);
            match service
                .create_booking(booking(&rider.id, &ride.id, passengers))
                .await
            {
                Ok(b) => {
                    assert!(passengers <= expected_left);
                    expected_left -= passengers;
                    active.push((b.id, passengers));
                }
                Err(DbError::CapacityExceeded { available, .. }) => {
                    assert!(passengers > expected_left);
                    assert_eq!(available, i64::from(expected_left));
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        } else {
            let (id, passengers) = active.swap_remove(rng.gen_range(0..active.len()));
            service.cancel_booking(&id).await.unwrap().unwrap();
            expected_left += passengers;
        }

        let left = seats_left(&service, &ride.id).await;
        assert_eq!(left, expected_left);
        assert!((0..=MAX_SEATS).contains(&left));

        let booked: i32 = service
            .get_bookings_by_ride(&ride.id)
            .await
            .unwrap()
            .iter()
            .filter(|b| b.status != BookingStatus::Cancelled)
            .map(|b| b.passenger_count)
            .sum();
        assert_eq!(booked + left, MAX_SEATS);
    }
}

#[tokio::test]
async fn test_reviving_cancelled_booking_takes_seats_back() {
    let (service, _dir) = empty_service().await;
    let driver = create_user(&service, "driver", UserRole::Driver).await;
    let rider = create_user(&service, "rider", UserRole::User).await;
    let ride = create_ride(&service, &driver.id, 4).await;

    let first = service
        .create_booking(booking(&rider.id, &ride.id, 2))
        .await
        .unwrap();
    service.cancel_booking(&first.id).await.unwrap().unwrap();
    assert_eq!(seats_left(&service, &ride.id).await, 4);

    let revived = service
        .update_booking_status(&first.id, BookingStatus::Confirmed)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(revived.status, BookingStatus::Confirmed);
    assert_eq!(seats_left(&service, &ride.id).await, 2);

    // Only two seats remain, so four more cannot be booked
    let err = service
        .create_booking(booking(&rider.id, &ride.id, 4))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::CapacityExceeded { available: 2, .. }));
}

#[tokio::test]
async fn test_reviving_cancelled_booking_on_full_ride_fails() {
    let (service, _dir) = empty_service().await;
    let driver = create_user(&service, "driver", UserRole::Driver).await;
    let rider = create_user(&service, "rider", UserRole::User).await;
    let ride = create_ride(&service, &driver.id, 4).await;

    let first = service
        .create_booking(booking(&rider.id, &ride.id, 2))
        .await
        .unwrap();
    service.cancel_booking(&first.id).await.unwrap().unwrap();
    service
        .create_booking(booking(&rider.id, &ride.id, 3))
        .await
        .unwrap();

    let err = service
        .update_booking_status(&first.id, BookingStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::CapacityExceeded { requested: 2, available: 1, .. }
    ));

    let stored = service.get_booking_by_id(&first.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Cancelled);
    assert_eq!(seats_left(&service, &ride.id).await, 1);
}

#[tokio::test]
async fn test_status_change_between_active_states_keeps_seats() {
    let (service, _dir) = empty_service().await;
    let driver = create_user(&service, "driver", UserRole::Driver).await;
    let rider = create_user(&service, "rider", UserRole::User).await;
    let ride = create_ride(&service, &driver.id, 4).await;

    let created = service
        .create_booking(booking(&rider.id, &ride.id, 3))
        .await
        .unwrap();
    for status in [BookingStatus::Confirmed, BookingStatus::Completed] {
        let updated = service
            .update_booking_status(&created.id, status)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, status);
        assert_eq!(seats_left(&service, &ride.id).await, 1);
    }
}

#[tokio::test]
async fn test_completed_booking_cannot_be_cancelled() {
    let (service, _dir) = empty_service().await;
    let driver = create_user(&service, "driver", UserRole::Driver).await;
    let rider = create_user(&service, "rider", UserRole::User).await;
    let ride = create_ride(&service, &driver.id, 4).await;

    let created = service
        .create_booking(booking(&rider.id, &ride.id, 2))
        .await
        .unwrap();
    service
        .update_booking_status(&created.id, BookingStatus::Completed)
        .await
        .unwrap()
        .unwrap();

    let err = service.cancel_booking(&created.id).await.unwrap_err();
    assert!(matches!(err, DbError::InvalidQuery { .. }));

    let stored = service.get_booking_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Completed);
    assert_eq!(seats_left(&service, &ride.id).await, 2);
}

#[tokio::test]
async fn test_delete_booking_returns_held_seats() {
    let (service, _dir) = empty_service().await;
    let driver = create_user(&service, "driver", UserRole::Driver).await;
    let rider = create_user(&service, "rider", UserRole::User).await;
    let ride = create_ride(&service, &driver.id, 4).await;

    let active = service
        .create_booking(booking(&rider.id, &ride.id, 3))
        .await
        .unwrap();
    assert_eq!(seats_left(&service, &ride.id).await, 1);
    assert!(service.delete_booking(&active.id).await.unwrap());
    assert_eq!(seats_left(&service, &ride.id).await, 4);

    // A cancelled booking already gave its seats back
    let cancelled = service
        .create_booking(booking(&rider.id, &ride.id, 2))
        .await
        .unwrap();
    service.cancel_booking(&cancelled.id).await.unwrap().unwrap();
    assert!(service.delete_booking(&cancelled.id).await.unwrap());
    assert_eq!(seats_left(&service, &ride.id).await, 4);

    assert!(!service.delete_booking(&cancelled.id).await.unwrap());
    assert!(service.get_bookings_by_ride(&ride.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_booking_created_cancelled_holds_no_seats() {
    let (service, _dir) = empty_service().await;
    let driver = create_user(&service, "driver", UserRole::Driver).await;
    let rider = create_user(&service, "rider", UserRole::User).await;
    let ride = create_ride(&service, &driver.id, 4).await;

    service
        .create_booking(NewBooking {
            status: BookingStatus::Cancelled,
            ..booking(&rider.id, &ride.id, 3)
        })
        .await
        .unwrap();
    assert_eq!(seats_left(&service, &ride.id).await, 4);
}
