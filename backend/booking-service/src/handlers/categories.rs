/// Category handlers - room classes, prices and availability
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use super::{created, done, ok, owned_category, owned_hotel};
use crate::config::Config;
use crate::db::image_repo::{self, ImageKind};
use crate::db::{category_repo, hotel_repo, room_repo};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{Category, CategoryDetail, CategoryPatch, NewCategory, Room};
use crate::services::{availability, cascade};

#[derive(Debug, Deserialize)]
pub struct StayQuery {
    pub date_in: NaiveDate,
    pub date_out: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct HotelStayQuery {
    pub hotel_id: Uuid,
    pub date_in: NaiveDate,
    pub date_out: NaiveDate,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePriceRequest {
    #[validate(range(min = 0.0))]
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct CategoryPrice {
    pub category_id: Uuid,
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct CategoryRoomCount {
    pub category_id: Uuid,
    pub available_count: i64,
}

/// Attach live rooms and images to each category.
async fn with_details(pool: &PgPool, categories: Vec<Category>) -> Result<Vec<CategoryDetail>> {
    let ids: Vec<Uuid> = categories.iter().map(|c| c.id).collect();
    let mut rooms: HashMap<Uuid, Vec<Room>> = HashMap::new();
    for room in room_repo::list_by_categories(pool, &ids).await? {
        rooms.entry(room.category_id).or_default().push(room);
    }
    let mut images: HashMap<Uuid, Vec<_>> = HashMap::new();
    for image in image_repo::for_owners(pool, ImageKind::Category, &ids).await? {
        images.entry(image.owner_id).or_default().push(image);
    }
    Ok(categories
        .into_iter()
        .map(|category| CategoryDetail {
            rooms: rooms.remove(&category.id).unwrap_or_default(),
            images: images.remove(&category.id).unwrap_or_default(),
            category,
        })
        .collect())
}

async fn live_category(pool: &PgPool, id: Uuid) -> Result<Category> {
    category_repo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))
}

/// GET /api/v1/categories/{id}
pub async fn get_category(pool: web::Data<PgPool>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let category = live_category(pool.get_ref(), path.into_inner()).await?;
    let detail = with_details(pool.get_ref(), vec![category])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::not_found("Category"))?;
    Ok(ok("Category", detail))
}

/// GET /api/v1/hotels/{id}/categories
pub async fn categories_of_hotel(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let hotel_id = path.into_inner();
    hotel_repo::find_by_id(pool.get_ref(), hotel_id)
        .await?
        .ok_or_else(|| AppError::not_found("Hotel"))?;
    let categories = category_repo::list_by_hotel(pool.get_ref(), hotel_id).await?;
    Ok(ok("Categories", with_details(pool.get_ref(), categories).await?))
}

/// GET /api/v1/categories/{id}/price
pub async fn get_price(pool: web::Data<PgPool>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let category = live_category(pool.get_ref(), path.into_inner()).await?;
    Ok(ok(
        "Category price",
        CategoryPrice {
            category_id: category.id,
            price: category.price,
        },
    ))
}

/// POST /api/v1/categories
pub async fn create_category(
    pool: web::Data<PgPool>,
    user: AuthUser,
    req: web::Json<NewCategory>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;
    owned_hotel(pool.get_ref(), &user, req.hotel_id).await?;

    let category = category_repo::create(pool.get_ref(), &req).await?;
    tracing::info!(category_id = %category.id, hotel_id = %category.hotel_id, "category created");
    Ok(created("Category created", category))
}

/// PUT /api/v1/categories/{id}
pub async fn update_category(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<CategoryPatch>,
) -> Result<HttpResponse> {
    let patch = req.into_inner();
    patch.validate()?;
    let category = owned_category(pool.get_ref(), &user, path.into_inner()).await?;

    let category = category_repo::update(pool.get_ref(), category.id, &patch)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;
    Ok(ok("Category updated", category))
}

/// PUT /api/v1/categories/{id}/price
pub async fn update_price(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<UpdatePriceRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let category = owned_category(pool.get_ref(), &user, path.into_inner()).await?;

    let category = category_repo::update_price(pool.get_ref(), category.id, req.price)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;
    Ok(ok("Category price updated", category))
}

/// DELETE /api/v1/categories/{id}
pub async fn delete_category(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let category = owned_category(pool.get_ref(), &user, path.into_inner()).await?;
    cascade::delete_category(pool.get_ref(), category.id).await?;
    Ok(done("Category deleted"))
}

/// POST /api/v1/categories/{id}/restore
pub async fn restore_category(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let category = category_repo::find_including_deleted(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;
    owned_hotel(pool.get_ref(), &user, category.hotel_id).await?;
    cascade::restore_category(pool.get_ref(), category.id, category.deleted_at).await?;
    Ok(done("Category restored"))
}

/// DELETE /api/v1/hotels/{id}/categories
pub async fn delete_categories_of_hotel(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let hotel = owned_hotel(pool.get_ref(), &user, path.into_inner()).await?;
    let removed = cascade::delete_categories_of_hotel(pool.get_ref(), hotel.id).await?;
    Ok(ok("Categories deleted", serde_json::json!({ "deleted": removed })))
}

/// POST /api/v1/hotels/{id}/categories/restore
pub async fn restore_categories_of_hotel(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let hotel = owned_hotel(pool.get_ref(), &user, path.into_inner()).await?;
    let restored = cascade::restore_categories_of_hotel(pool.get_ref(), hotel.id).await?;
    Ok(ok("Categories restored", serde_json::json!({ "restored": restored })))
}

/// GET /api/v1/categories/availability?hotel_id=&date_in=&date_out=
pub async fn hotel_availability(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    query: web::Query<HotelStayQuery>,
) -> Result<HttpResponse> {
    let available = availability::available_rooms_for_hotel(
        pool.get_ref(),
        query.hotel_id,
        query.date_in,
        query.date_out,
        config.booking.max_stay_nights,
    )
    .await?;
    Ok(ok("Available rooms", available))
}

/// GET /api/v1/categories/{id}/availability?date_in=&date_out=
pub async fn category_availability(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    path: web::Path<Uuid>,
    query: web::Query<StayQuery>,
) -> Result<HttpResponse> {
    let category_id = path.into_inner();
    let available_count = availability::available_count_for_category(
        pool.get_ref(),
        category_id,
        query.date_in,
        query.date_out,
        config.booking.max_stay_nights,
    )
    .await?;
    Ok(ok(
        "Available rooms",
        CategoryRoomCount {
            category_id,
            available_count,
        },
    ))
}
