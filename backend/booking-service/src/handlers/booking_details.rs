/// Booking detail handlers, for hotel owners.
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use super::{done, ok, owned_category};
use crate::db::{booking_repo, hotel_repo, room_repo};
use crate::error::{AppError, Result};
use crate::middleware::{permissions, AuthUser};
use crate::models::{BookingDetail, Page, PageQuery};
use crate::services::BookingService;

const DETAILS_PER_PAGE: i64 = 20;

/// Caller must own the hotel the booking was made at.
async fn check_booking_hotel(pool: &PgPool, user: &AuthUser, booking_id: Uuid) -> Result<()> {
    permissions::require_hotel_manager(user)?;
    let booking = booking_repo::find_including_deleted(pool, booking_id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking"))?;
    let hotel = hotel_repo::find_including_deleted(pool, booking.hotel_id)
        .await?
        .ok_or_else(|| AppError::not_found("Hotel"))?;
    permissions::check_hotel_owner(user, &hotel)
}

async fn owned_detail(pool: &PgPool, user: &AuthUser, id: Uuid) -> Result<BookingDetail> {
    let detail = booking_repo::find_detail(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking detail"))?;
    check_booking_hotel(pool, user, detail.booking_id).await?;
    Ok(detail)
}

/// GET /api/v1/booking-details
pub async fn list_details(
    pool: web::Data<PgPool>,
    user: AuthUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    permissions::require_hotel_manager(&user)?;
    let query = query.into_inner();
    let details = booking_repo::details_for_owner(
        pool.get_ref(),
        user.id,
        DETAILS_PER_PAGE,
        query.offset(DETAILS_PER_PAGE),
    )
    .await?;
    let total = booking_repo::count_details_for_owner(pool.get_ref(), user.id).await?;
    Ok(ok("Booking details", Page::new(details, query, DETAILS_PER_PAGE, total)))
}

/// GET /api/v1/booking-details/{id}
pub async fn get_detail(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let detail = owned_detail(pool.get_ref(), &user, path.into_inner()).await?;
    if detail.deleted_at.is_some() {
        return Err(AppError::not_found("Booking detail"));
    }
    Ok(ok("Booking detail", detail))
}

/// GET /api/v1/bookings/{id}/details
pub async fn details_of_booking(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let booking_id = path.into_inner();
    check_booking_hotel(pool.get_ref(), &user, booking_id).await?;
    let details = booking_repo::details_for_booking(pool.get_ref(), booking_id).await?;
    Ok(ok("Booking details", details))
}

/// GET /api/v1/rooms/{id}/booking-details
pub async fn details_of_room(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let room = room_repo::find_including_deleted(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Room"))?;
    owned_category(pool.get_ref(), &user, room.category_id).await?;
    let details = booking_repo::details_for_room(pool.get_ref(), room.id).await?;
    Ok(ok("Booking details", details))
}

/// DELETE /api/v1/booking-details/{id}
pub async fn delete_detail(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let detail = owned_detail(pool.get_ref(), &user, path.into_inner()).await?;
    if !booking_repo::soft_delete_detail(pool.get_ref(), detail.id).await? {
        return Err(AppError::not_found("Booking detail"));
    }
    Ok(done("Booking detail deleted"))
}

/// POST /api/v1/booking-details/{id}/restore
pub async fn restore_detail(
    pool: web::Data<PgPool>,
    service: web::Data<BookingService>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let detail = owned_detail(pool.get_ref(), &user, path.into_inner()).await?;
    let detail = service.restore_detail(&detail).await?;
    Ok(ok("Booking detail restored", detail))
}
