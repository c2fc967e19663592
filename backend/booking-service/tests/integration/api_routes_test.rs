//! HTTP surface tests that never reach the database: authentication,
//! role checks and request validation all reject before the first query.

#[path = "../common/fixtures.rs"]
mod fixtures;

use actix_web::{http::StatusCode, test, web, App};
use booking_service::config::BookingConfig;
use booking_service::models::Role;
use booking_service::services::BookingService;
use booking_service::{middleware, routes, Config};
use serde_json::{json, Value};
use serial_test::serial;
use uuid::Uuid;

macro_rules! test_app {
    () => {{
        let pool = fixtures::lazy_pool();
        test::init_service(
            App::new()
                .app_data(web::Data::new(pool.clone()))
                .app_data(web::Data::new(Config::default()))
                .app_data(web::Data::new(BookingService::new(
                    pool,
                    BookingConfig::default(),
                )))
                .wrap(middleware::JwtAuthMiddleware)
                .configure(routes::configure),
        )
        .await
    }};
}

fn guest() -> String {
    fixtures::bearer(Uuid::new_v4(), "guest@example.com", Role::User)
}

fn hotelier() -> String {
    fixtures::bearer(Uuid::new_v4(), "hotel@example.com", Role::Hotel)
}

#[actix_rt::test]
#[serial]
async fn test_health_is_public() {
    let app = test_app!();
    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
#[serial]
async fn test_metrics_endpoint() {
    let app = test_app!();
    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
#[serial]
async fn test_booking_requires_token() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .set_json(json!({
            "hotel_id": Uuid::new_v4(),
            "date_in": "2030-01-01",
            "date_out": "2030-01-03",
            "room_count": 1,
            "room_ids": [Uuid::new_v4()]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "AUTHENTICATION_ERROR");
}

#[actix_rt::test]
#[serial]
async fn test_garbage_token_rejected() {
    let app = test_app!();
    let req = test::TestRequest::get()
        .uri("/api/v1/users/me")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::try_call_service(&app, req).await;
    let status = match resp {
        Ok(resp) => resp.status(),
        Err(e) => e.as_response_error().status_code(),
    };
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
#[serial]
async fn test_hotel_account_cannot_book() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(("Authorization", hotelier()))
        .set_json(json!({
            "hotel_id": Uuid::new_v4(),
            "date_in": "2030-01-01",
            "date_out": "2030-01-03",
            "room_count": 1,
            "room_ids": [Uuid::new_v4()]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
#[serial]
async fn test_guest_cannot_create_hotel() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/api/v1/hotels")
        .insert_header(("Authorization", guest()))
        .set_json(json!({
            "name": "Sea View",
            "address": "1 Beach Road",
            "city": "Da Nang",
            "nation": "Vietnam",
            "hotline": "0912345678",
            "email": "seaview@example.com",
            "room_total": 10,
            "parking_slot": 2,
            "bathrooms": 10,
            "amenities": "wifi",
            "safety_hygiene": "daily cleaning"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
#[serial]
async fn test_booking_dates_must_move_forward() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(("Authorization", guest()))
        .set_json(json!({
            "hotel_id": Uuid::new_v4(),
            "date_in": "2030-01-05",
            "date_out": "2030-01-05",
            "room_count": 1,
            "room_ids": [Uuid::new_v4()]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
#[serial]
async fn test_booking_stay_too_long() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(("Authorization", guest()))
        .set_json(json!({
            "hotel_id": Uuid::new_v4(),
            "date_in": "2030-01-01",
            "date_out": "2030-01-30",
            "room_count": 1,
            "room_ids": [Uuid::new_v4()]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
#[serial]
async fn test_booking_needs_rooms() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(("Authorization", guest()))
        .set_json(json!({
            "hotel_id": Uuid::new_v4(),
            "date_in": "2030-01-01",
            "date_out": "2030-01-03",
            "room_count": 0,
            "room_ids": []
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
#[serial]
async fn test_malformed_json_is_bad_request() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "BAD_REQUEST");
}

#[actix_rt::test]
#[serial]
async fn test_weak_password_rejected() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "name": "Guest",
            "email": "guest@example.com",
            "password": "short"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
#[serial]
async fn test_admin_routes_need_admin() {
    let app = test_app!();
    let req = test::TestRequest::get()
        .uri("/api/v1/admin/users")
        .insert_header(("Authorization", guest()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
#[serial]
async fn test_guest_cannot_reply() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/api/v1/replies")
        .insert_header(("Authorization", guest()))
        .set_json(json!({ "review_id": Uuid::new_v4(), "content": "Thanks!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
#[serial]
async fn test_review_rating_bounds() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/api/v1/reviews")
        .insert_header(("Authorization", guest()))
        .set_json(json!({
            "booking_id": Uuid::new_v4(),
            "title": "Great",
            "content": "Lovely stay",
            "rating": 9
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
