/// HTTP request handlers
pub mod booking_details;
pub mod bookings;
pub mod categories;
pub mod health;
pub mod hotels;
pub mod images;
pub mod payments;
pub mod replies;
pub mod reviews;
pub mod rooms;
pub mod users;

use actix_web::HttpResponse;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{category_repo, hotel_repo};
use crate::error::{AppError, Result};
use crate::middleware::{permissions, AuthUser};
use crate::models::{ApiResponse, Category, Hotel};

pub(crate) fn ok<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(message, data))
}

pub(crate) fn created<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Created().json(ApiResponse::ok(message, data))
}

pub(crate) fn done(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::done(message))
}

/// Live hotel owned by the caller.
pub(crate) async fn owned_hotel(pool: &PgPool, user: &AuthUser, hotel_id: Uuid) -> Result<Hotel> {
    permissions::require_hotel_manager(user)?;
    let hotel = hotel_repo::find_by_id(pool, hotel_id)
        .await?
        .ok_or_else(|| AppError::not_found("Hotel"))?;
    permissions::check_hotel_owner(user, &hotel)?;
    Ok(hotel)
}

/// Live category whose hotel is owned by the caller.
pub(crate) async fn owned_category(
    pool: &PgPool,
    user: &AuthUser,
    category_id: Uuid,
) -> Result<Category> {
    permissions::require_hotel_manager(user)?;
    let category = category_repo::find_by_id(pool, category_id)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;
    owned_hotel(pool, user, category.hotel_id).await?;
    Ok(category)
}
