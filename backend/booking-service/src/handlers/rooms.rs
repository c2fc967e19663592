/// Room handlers
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{created, done, ok, owned_category, owned_hotel};
use crate::db::{category_repo, room_repo};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{Page, PageQuery, Room};
use crate::services::cascade;

const ROOMS_PER_PAGE: i64 = 20;
const MAX_BATCH: u32 = 100;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomRequest {
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 32))]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomsRequest {
    pub category_id: Uuid,
    #[validate(range(min = 1, max = 100))]
    pub count: u32,
    #[validate(length(min = 1, max = 200))]
    pub name_prefix: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoomRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RoomCount {
    pub category_id: Uuid,
    pub rooms: i64,
}

async fn live_room(pool: &PgPool, id: Uuid) -> Result<Room> {
    room_repo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Room"))
}

/// GET /api/v1/rooms
pub async fn list_rooms(
    pool: web::Data<PgPool>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let rooms =
        room_repo::list(pool.get_ref(), ROOMS_PER_PAGE, query.offset(ROOMS_PER_PAGE)).await?;
    let total = room_repo::count(pool.get_ref()).await?;
    Ok(ok("Rooms", Page::new(rooms, query, ROOMS_PER_PAGE, total)))
}

/// GET /api/v1/rooms/{id}
pub async fn get_room(pool: web::Data<PgPool>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let room = live_room(pool.get_ref(), path.into_inner()).await?;
    Ok(ok("Room", room))
}

/// GET /api/v1/categories/{id}/rooms/count
pub async fn count_rooms_of_category(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let category_id = path.into_inner();
    category_repo::find_by_id(pool.get_ref(), category_id)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;
    let rooms = room_repo::count_by_category(pool.get_ref(), category_id).await?;
    Ok(ok("Room count", RoomCount { category_id, rooms }))
}

/// POST /api/v1/rooms
pub async fn create_room(
    pool: web::Data<PgPool>,
    user: AuthUser,
    req: web::Json<CreateRoomRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;
    owned_category(pool.get_ref(), &user, req.category_id).await?;

    let room =
        room_repo::create(pool.get_ref(), req.category_id, &req.name, req.status.as_deref()).await?;
    Ok(created("Room created", room))
}

/// POST /api/v1/rooms/batch
pub async fn create_rooms(
    pool: web::Data<PgPool>,
    user: AuthUser,
    req: web::Json<CreateRoomsRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;
    owned_category(pool.get_ref(), &user, req.category_id).await?;

    let rooms = room_repo::create_many(
        pool.get_ref(),
        req.category_id,
        req.name_prefix.trim(),
        req.count.min(MAX_BATCH),
    )
    .await?;
    tracing::info!(category_id = %req.category_id, rooms = rooms.len(), "rooms created");
    Ok(created("Rooms created", rooms))
}

/// PUT /api/v1/rooms/{id}
pub async fn update_room(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<UpdateRoomRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;
    let room = live_room(pool.get_ref(), path.into_inner()).await?;
    owned_category(pool.get_ref(), &user, room.category_id).await?;

    let room = room_repo::update(
        pool.get_ref(),
        room.id,
        req.name.as_deref(),
        req.status.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::not_found("Room"))?;
    Ok(ok("Room updated", room))
}

/// DELETE /api/v1/rooms/{id}
pub async fn delete_room(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let room = live_room(pool.get_ref(), path.into_inner()).await?;
    owned_category(pool.get_ref(), &user, room.category_id).await?;
    room_repo::soft_delete(pool.get_ref(), room.id).await?;
    Ok(done("Room deleted"))
}

/// POST /api/v1/rooms/{id}/restore
pub async fn restore_room(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let room = room_repo::find_including_deleted(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Room"))?;
    owned_category(pool.get_ref(), &user, room.category_id).await?;

    let room = room_repo::restore(pool.get_ref(), room.id)
        .await?
        .ok_or_else(|| AppError::Conflict("Room is not deleted".into()))?;
    Ok(ok("Room restored", room))
}

/// POST /api/v1/categories/{id}/rooms/restore
pub async fn restore_rooms_of_category(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let category = owned_category(pool.get_ref(), &user, path.into_inner()).await?;
    let restored = cascade::restore_rooms_of_categories(pool.get_ref(), &[category.id]).await?;
    Ok(ok("Rooms restored", serde_json::json!({ "restored": restored })))
}

/// POST /api/v1/hotels/{id}/rooms/restore
pub async fn restore_rooms_of_hotel(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let hotel = owned_hotel(pool.get_ref(), &user, path.into_inner()).await?;
    let categories: Vec<Uuid> = category_repo::list_by_hotel(pool.get_ref(), hotel.id)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();
    let restored = cascade::restore_rooms_of_categories(pool.get_ref(), &categories).await?;
    Ok(ok("Rooms restored", serde_json::json!({ "restored": restored })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_limits() {
        let req: CreateRoomsRequest = serde_json::from_value(serde_json::json!({
            "category_id": Uuid::new_v4(),
            "count": 0,
            "name_prefix": "Room"
        }))
        .unwrap();
        assert!(req.validate().is_err());

        let req: CreateRoomsRequest = serde_json::from_value(serde_json::json!({
            "category_id": Uuid::new_v4(),
            "count": MAX_BATCH,
            "name_prefix": "Room"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
    }
}
