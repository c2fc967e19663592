/// Booking handlers - guest reservations and host approval queues
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{created, ok, owned_hotel};
use crate::db::booking_repo::{self, BookingFilter};
use crate::db::hotel_repo;
use crate::error::{AppError, Result};
use crate::middleware::{permissions, AuthUser};
use crate::models::{BookingStatus, NewBooking, Page, PageQuery};
use crate::services::{BookingService, Decision};

const GUEST_PER_PAGE: i64 = 10;
const HOST_PER_PAGE: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct HostQuery {
    pub status: Option<BookingStatus>,
    pub page: Option<i64>,
}

async fn page_of(
    pool: &PgPool,
    filter: BookingFilter,
    query: PageQuery,
    per_page: i64,
) -> Result<HttpResponse> {
    let bookings = booking_repo::list(pool, &filter, per_page, query.offset(per_page)).await?;
    let total = booking_repo::count(pool, &filter).await?;
    Ok(ok("Bookings", Page::new(bookings, query, per_page, total)))
}

/// POST /api/v1/bookings
pub async fn create_booking(
    service: web::Data<BookingService>,
    user: AuthUser,
    req: web::Json<NewBooking>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    permissions::require_guest(&user)?;
    req.validate()?;
    let receipt = service.create(&user, &req).await?;
    Ok(created("Booking created", receipt))
}

/// GET /api/v1/bookings/mine - unpaid and pending
pub async fn my_bookings(
    pool: web::Data<PgPool>,
    user: AuthUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    permissions::require_guest(&user)?;
    let filter = BookingFilter {
        user_id: Some(user.id),
        statuses: vec![BookingStatus::Unpaid, BookingStatus::Pending],
        ..Default::default()
    };
    page_of(pool.get_ref(), filter, query.into_inner(), GUEST_PER_PAGE).await
}

/// GET /api/v1/bookings/mine/history - accepted and rejected
pub async fn my_booking_history(
    pool: web::Data<PgPool>,
    user: AuthUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    permissions::require_guest(&user)?;
    let filter = BookingFilter {
        user_id: Some(user.id),
        statuses: vec![BookingStatus::Accepted, BookingStatus::Rejected],
        ..Default::default()
    };
    page_of(pool.get_ref(), filter, query.into_inner(), GUEST_PER_PAGE).await
}

/// GET /api/v1/bookings/hotel?status= - bookings on the caller's hotels,
/// pending unless another status is asked for
pub async fn host_bookings(
    pool: web::Data<PgPool>,
    user: AuthUser,
    query: web::Query<HostQuery>,
) -> Result<HttpResponse> {
    permissions::require_hotel_manager(&user)?;
    let filter = BookingFilter {
        hotel_owner: Some(user.id),
        statuses: vec![query.status.unwrap_or(BookingStatus::Pending)],
        ..Default::default()
    };
    let page = PageQuery { page: query.page };
    page_of(pool.get_ref(), filter, page, HOST_PER_PAGE).await
}

/// GET /api/v1/bookings/hotel/history - decided stays that already ended
pub async fn host_booking_history(
    pool: web::Data<PgPool>,
    user: AuthUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    permissions::require_hotel_manager(&user)?;
    let filter = BookingFilter {
        hotel_owner: Some(user.id),
        statuses: vec![BookingStatus::Accepted, BookingStatus::Rejected],
        ended_before: Some(Utc::now().date_naive()),
        ..Default::default()
    };
    page_of(pool.get_ref(), filter, query.into_inner(), HOST_PER_PAGE).await
}

/// GET /api/v1/hotels/{id}/bookings?status=
pub async fn bookings_of_hotel(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
    query: web::Query<HostQuery>,
) -> Result<HttpResponse> {
    let hotel = owned_hotel(pool.get_ref(), &user, path.into_inner()).await?;
    let filter = BookingFilter {
        hotel_id: Some(hotel.id),
        statuses: query.status.into_iter().collect(),
        ..Default::default()
    };
    let page = PageQuery { page: query.page };
    page_of(pool.get_ref(), filter, page, HOST_PER_PAGE).await
}

/// GET /api/v1/bookings/{id} - visible to the guest and the hotel owner
pub async fn get_booking(
    pool: web::Data<PgPool>,
    service: web::Data<BookingService>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let booking = booking_repo::find_by_id(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Booking"))?;
    if booking.user_id != user.id {
        let hotel = hotel_repo::find_including_deleted(pool.get_ref(), booking.hotel_id)
            .await?
            .ok_or_else(|| AppError::not_found("Hotel"))?;
        permissions::check_hotel_owner(&user, &hotel)?;
    }
    let receipt = service.receipt(booking).await?;
    Ok(ok("Booking", receipt))
}

/// POST /api/v1/bookings/{id}/accept
pub async fn accept_booking(
    service: web::Data<BookingService>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let booking = service
        .decide(&user, path.into_inner(), Decision::Accept)
        .await?;
    Ok(ok("Booking accepted", booking))
}

/// POST /api/v1/bookings/{id}/reject
pub async fn reject_booking(
    service: web::Data<BookingService>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let booking = service
        .decide(&user, path.into_inner(), Decision::Reject)
        .await?;
    Ok(ok("Booking rejected", booking))
}
