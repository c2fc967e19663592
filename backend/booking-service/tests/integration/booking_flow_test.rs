//! End-to-end reservation flow against PostgreSQL.
//!
//! Run with `DATABASE_URL=... cargo test --test booking_flow_test -- --ignored`.

#[path = "../common/fixtures.rs"]
mod fixtures;

use booking_service::config::BookingConfig;
use booking_service::db::payment_repo::Payer;
use booking_service::db::{booking_repo, category_repo, hotel_repo, review_repo, room_repo};
use booking_service::error::AppError;
use booking_service::models::{BookingStatus, NewBooking, Role};
use booking_service::services::{availability, cascade, BookingService, Decision};
use chrono::NaiveDate;
use serial_test::serial;
use uuid::Uuid;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2031, 3, d).unwrap()
}

/// Live pending or accepted details on `room` overlapping the stay.
async fn holders(
    pool: &sqlx::PgPool,
    room: Uuid,
    date_in: NaiveDate,
    date_out: NaiveDate,
) -> usize {
    let mut conn = pool.acquire().await.unwrap();
    booking_repo::blocking_details(&mut conn, &[room], date_in, date_out, None)
        .await
        .unwrap()
        .len()
}

fn request(hotel_id: Uuid, rooms: &[Uuid], date_in: NaiveDate, date_out: NaiveDate) -> NewBooking {
    NewBooking {
        hotel_id,
        date_in,
        date_out,
        room_count: rooms.len() as i32,
        room_ids: rooms.to_vec(),
    }
}

#[tokio::test]
#[serial]
#[ignore = "Requires PostgreSQL database"]
async fn test_first_guest_to_pay_wins() {
    let pool = fixtures::create_test_pool().await;
    fixtures::cleanup_test_data(&pool).await;
    let service = BookingService::new(pool.clone(), BookingConfig::default());

    let owner = fixtures::create_test_user(&pool, Role::Hotel).await;
    let alice = fixtures::auth_user(&fixtures::create_test_user(&pool, Role::User).await);
    let bob = fixtures::auth_user(&fixtures::create_test_user(&pool, Role::User).await);
    let hotel = fixtures::create_test_hotel(&pool, &owner).await;
    let category = fixtures::create_test_category(&pool, &hotel, 100.0).await;
    let room = fixtures::create_test_room(&pool, &category, "101").await;

    let first = service
        .create(&alice, &request(hotel.id, &[room.id], day(1), day(3)))
        .await
        .unwrap();
    assert_eq!(first.booking.status, BookingStatus::Unpaid);
    assert_eq!(first.booking.total_amount, 200.0);
    assert_eq!(first.details.len(), 1);
    assert!(!first.payment.payment_status);

    // unpaid reservations do not hold the room
    let second = service
        .create(&bob, &request(hotel.id, &[room.id], day(2), day(4)))
        .await
        .unwrap();

    let paid = service
        .confirm_payment(&alice, first.booking.id, true, &Payer::default())
        .await
        .unwrap();
    assert!(paid.payment_status);
    let booking = booking_repo::find_by_id(&pool, first.booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);

    let err = service
        .confirm_payment(&bob, second.booking.id, true, &Payer::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = service
        .create(&bob, &request(hotel.id, &[room.id], day(3), day(5)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    service
        .create(&bob, &request(hotel.id, &[room.id], day(10), day(12)))
        .await
        .unwrap();
}

#[tokio::test]
#[serial]
#[ignore = "Requires PostgreSQL database"]
async fn test_rejection_frees_the_room() {
    let pool = fixtures::create_test_pool().await;
    fixtures::cleanup_test_data(&pool).await;
    let service = BookingService::new(pool.clone(), BookingConfig::default());

    let owner_row = fixtures::create_test_user(&pool, Role::Hotel).await;
    let owner = fixtures::auth_user(&owner_row);
    let guest = fixtures::auth_user(&fixtures::create_test_user(&pool, Role::User).await);
    let hotel = fixtures::create_test_hotel(&pool, &owner_row).await;
    let category = fixtures::create_test_category(&pool, &hotel, 80.0).await;
    let room = fixtures::create_test_room(&pool, &category, "201").await;

    let receipt = service
        .create(&guest, &request(hotel.id, &[room.id], day(5), day(6)))
        .await
        .unwrap();
    service
        .confirm_payment(&guest, receipt.booking.id, true, &Payer::default())
        .await
        .unwrap();

    let free = availability::available_count_for_category(&pool, category.id, day(5), day(6), 7)
        .await
        .unwrap();
    assert_eq!(free, 0);

    let rejected = service
        .decide(&owner, receipt.booking.id, Decision::Reject)
        .await
        .unwrap();
    assert_eq!(rejected.status, BookingStatus::Rejected);

    let err = service
        .decide(&owner, receipt.booking.id, Decision::Accept)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let free = availability::available_count_for_category(&pool, category.id, day(5), day(6), 7)
        .await
        .unwrap();
    assert_eq!(free, 1);
}

#[tokio::test]
#[serial]
#[ignore = "Requires PostgreSQL database"]
async fn test_unpaid_booking_expires() {
    let pool = fixtures::create_test_pool().await;
    fixtures::cleanup_test_data(&pool).await;
    let service = BookingService::new(pool.clone(), BookingConfig::default());

    let owner = fixtures::create_test_user(&pool, Role::Hotel).await;
    let guest = fixtures::auth_user(&fixtures::create_test_user(&pool, Role::User).await);
    let hotel = fixtures::create_test_hotel(&pool, &owner).await;
    let category = fixtures::create_test_category(&pool, &hotel, 50.0).await;
    let room = fixtures::create_test_room(&pool, &category, "301").await;

    let receipt = service
        .create(&guest, &request(hotel.id, &[room.id], day(7), day(9)))
        .await
        .unwrap();

    let cutoff = chrono::Utc::now() + chrono::Duration::seconds(1);
    let expired = booking_repo::expired_unpaid(&pool, cutoff).await.unwrap();
    assert!(expired.contains(&receipt.booking.id));

    assert!(cascade::expire_unpaid_booking(&pool, receipt.booking.id)
        .await
        .unwrap());
    assert!(booking_repo::find_by_id(&pool, receipt.booking.id)
        .await
        .unwrap()
        .is_none());
    assert!(booking_repo::details_for_booking(&pool, receipt.booking.id)
        .await
        .unwrap()
        .is_empty());

    // second pass is a no-op
    assert!(!cascade::expire_unpaid_booking(&pool, receipt.booking.id)
        .await
        .unwrap());
}

#[tokio::test]
#[serial]
#[ignore = "Requires PostgreSQL database"]
async fn test_hotel_delete_and_restore_cascade() {
    let pool = fixtures::create_test_pool().await;
    fixtures::cleanup_test_data(&pool).await;

    let owner = fixtures::create_test_user(&pool, Role::Hotel).await;
    let hotel = fixtures::create_test_hotel(&pool, &owner).await;
    let category = fixtures::create_test_category(&pool, &hotel, 120.0).await;
    let room = fixtures::create_test_room(&pool, &category, "401").await;

    cascade::delete_hotel(&pool, hotel.id).await.unwrap();
    assert!(hotel_repo::find_by_id(&pool, hotel.id).await.unwrap().is_none());
    assert!(category_repo::find_by_id(&pool, category.id)
        .await
        .unwrap()
        .is_none());
    assert!(room_repo::find_by_id(&pool, room.id).await.unwrap().is_none());

    let deleted = hotel_repo::find_including_deleted(&pool, hotel.id)
        .await
        .unwrap()
        .unwrap();
    cascade::restore_hotel(&pool, hotel.id, deleted.deleted_at)
        .await
        .unwrap();
    assert!(hotel_repo::find_by_id(&pool, hotel.id).await.unwrap().is_some());
    assert!(category_repo::find_by_id(&pool, category.id)
        .await
        .unwrap()
        .is_some());
    assert!(room_repo::find_by_id(&pool, room.id).await.unwrap().is_some());

    let err = cascade::restore_hotel(&pool, hotel.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
#[serial]
#[ignore = "Requires PostgreSQL database"]
async fn test_rejected_detail_cannot_be_restored() {
    let pool = fixtures::create_test_pool().await;
    fixtures::cleanup_test_data(&pool).await;
    let service = BookingService::new(pool.clone(), BookingConfig::default());

    let owner_row = fixtures::create_test_user(&pool, Role::Hotel).await;
    let owner = fixtures::auth_user(&owner_row);
    let alice = fixtures::auth_user(&fixtures::create_test_user(&pool, Role::User).await);
    let bob = fixtures::auth_user(&fixtures::create_test_user(&pool, Role::User).await);
    let hotel = fixtures::create_test_hotel(&pool, &owner_row).await;
    let category = fixtures::create_test_category(&pool, &hotel, 90.0).await;
    let room = fixtures::create_test_room(&pool, &category, "501").await;

    let first = service
        .create(&alice, &request(hotel.id, &[room.id], day(1), day(3)))
        .await
        .unwrap();
    service
        .confirm_payment(&alice, first.booking.id, true, &Payer::default())
        .await
        .unwrap();
    service
        .decide(&owner, first.booking.id, Decision::Reject)
        .await
        .unwrap();

    let second = service
        .create(&bob, &request(hotel.id, &[room.id], day(1), day(3)))
        .await
        .unwrap();
    service
        .confirm_payment(&bob, second.booking.id, true, &Payer::default())
        .await
        .unwrap();
    service
        .decide(&owner, second.booking.id, Decision::Accept)
        .await
        .unwrap();

    let rejected_detail = booking_repo::find_detail(&pool, first.details[0].id)
        .await
        .unwrap()
        .unwrap();
    assert!(rejected_detail.deleted_at.is_some());

    let err = service.restore_detail(&rejected_detail).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(holders(&pool, room.id, day(1), day(3)).await, 1);
}

#[tokio::test]
#[serial]
#[ignore = "Requires PostgreSQL database"]
async fn test_restored_detail_must_find_its_room_free() {
    let pool = fixtures::create_test_pool().await;
    fixtures::cleanup_test_data(&pool).await;
    let service = BookingService::new(pool.clone(), BookingConfig::default());

    let owner_row = fixtures::create_test_user(&pool, Role::Hotel).await;
    let owner = fixtures::auth_user(&owner_row);
    let alice = fixtures::auth_user(&fixtures::create_test_user(&pool, Role::User).await);
    let bob = fixtures::auth_user(&fixtures::create_test_user(&pool, Role::User).await);
    let hotel = fixtures::create_test_hotel(&pool, &owner_row).await;
    let category = fixtures::create_test_category(&pool, &hotel, 90.0).await;
    let room = fixtures::create_test_room(&pool, &category, "502").await;

    let first = service
        .create(&alice, &request(hotel.id, &[room.id], day(4), day(6)))
        .await
        .unwrap();
    service
        .confirm_payment(&alice, first.booking.id, true, &Payer::default())
        .await
        .unwrap();
    assert!(booking_repo::soft_delete_detail(&pool, first.details[0].id)
        .await
        .unwrap());

    // the room is free again, so another guest takes it
    let second = service
        .create(&bob, &request(hotel.id, &[room.id], day(5), day(7)))
        .await
        .unwrap();
    service
        .confirm_payment(&bob, second.booking.id, true, &Payer::default())
        .await
        .unwrap();

    let deleted = booking_repo::find_detail(&pool, first.details[0].id)
        .await
        .unwrap()
        .unwrap();
    let err = service.restore_detail(&deleted).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(holders(&pool, room.id, day(4), day(7)).await, 1);

    service
        .decide(&owner, second.booking.id, Decision::Reject)
        .await
        .unwrap();
    let restored = service.restore_detail(&deleted).await.unwrap();
    assert!(restored.deleted_at.is_none());
    assert_eq!(holders(&pool, room.id, day(4), day(7)).await, 1);

    let err = service.restore_detail(&restored).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
#[ignore = "Requires PostgreSQL database"]
async fn test_concurrent_payments_keep_one_holder() {
    let pool = fixtures::create_test_pool().await;
    fixtures::cleanup_test_data(&pool).await;
    let service = BookingService::new(pool.clone(), BookingConfig::default());

    let owner = fixtures::create_test_user(&pool, Role::Hotel).await;
    let alice = fixtures::auth_user(&fixtures::create_test_user(&pool, Role::User).await);
    let bob = fixtures::auth_user(&fixtures::create_test_user(&pool, Role::User).await);
    let hotel = fixtures::create_test_hotel(&pool, &owner).await;
    let category = fixtures::create_test_category(&pool, &hotel, 70.0).await;

    for trial in 0..20u32 {
        let name = format!("6{:02}", trial);
        let room = fixtures::create_test_room(&pool, &category, &name).await;
        let first = service
            .create(&alice, &request(hotel.id, &[room.id], day(10), day(12)))
            .await
            .unwrap();
        let second = service
            .create(&bob, &request(hotel.id, &[room.id], day(11), day(13)))
            .await
            .unwrap();

        let payer_a = Payer::default();
        let payer_b = Payer::default();
        let (a, b) = tokio::join!(
            service.confirm_payment(&alice, first.booking.id, true, &payer_a),
            service.confirm_payment(&bob, second.booking.id, true, &payer_b),
        );

        let outcomes = [&a, &b];
        let paid = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(paid, 1, "trial {}: {:?} / {:?}", trial, a, b);
        assert!(
            outcomes
                .iter()
                .all(|r| matches!(r, Ok(_) | Err(AppError::Conflict(_)))),
            "trial {}: {:?} / {:?}",
            trial,
            a,
            b
        );
        assert_eq!(holders(&pool, room.id, day(10), day(13)).await, 1);

        let winner = if a.is_ok() { &first } else { &second };
        let details = booking_repo::details_for_booking(&pool, winner.booking.id)
            .await
            .unwrap();
        assert_eq!(details.len(), 1);
    }
}

#[tokio::test]
#[serial]
#[ignore = "Requires PostgreSQL database"]
async fn test_review_restore_only_once() {
    let pool = fixtures::create_test_pool().await;
    fixtures::cleanup_test_data(&pool).await;
    let service = BookingService::new(pool.clone(), BookingConfig::default());

    let owner_row = fixtures::create_test_user(&pool, Role::Hotel).await;
    let owner = fixtures::auth_user(&owner_row);
    let guest = fixtures::auth_user(&fixtures::create_test_user(&pool, Role::User).await);
    let hotel = fixtures::create_test_hotel(&pool, &owner_row).await;
    let category = fixtures::create_test_category(&pool, &hotel, 60.0).await;
    let room = fixtures::create_test_room(&pool, &category, "701").await;

    let receipt = service
        .create(&guest, &request(hotel.id, &[room.id], day(20), day(21)))
        .await
        .unwrap();
    service
        .confirm_payment(&guest, receipt.booking.id, true, &Payer::default())
        .await
        .unwrap();
    service
        .decide(&owner, receipt.booking.id, Decision::Accept)
        .await
        .unwrap();

    let review = review_repo::create(
        &pool,
        receipt.booking.id,
        hotel.id,
        guest.id,
        "Quiet room",
        "Would stay again",
        4,
    )
    .await
    .unwrap();
    hotel_repo::refresh_rating(&pool, hotel.id).await.unwrap();

    cascade::delete_review(&pool, review.id, hotel.id).await.unwrap();
    assert!(review_repo::find_by_id(&pool, review.id).await.unwrap().is_none());

    let deleted = review_repo::find_including_deleted(&pool, review.id)
        .await
        .unwrap()
        .unwrap();
    cascade::restore_review(&pool, review.id, hotel.id, deleted.deleted_at)
        .await
        .unwrap();
    let live = review_repo::find_by_id(&pool, review.id)
        .await
        .unwrap()
        .unwrap();
    assert!(live.deleted_at.is_none());

    let err = cascade::restore_review(&pool, review.id, hotel.id, live.deleted_at)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}
