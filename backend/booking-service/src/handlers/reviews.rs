/// Review handlers
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{created, done, ok};
use crate::db::{booking_repo, hotel_repo, review_repo};
use crate::error::{AppError, Result};
use crate::middleware::{permissions, AuthUser};
use crate::models::{BookingStatus, Page, PageQuery, Review};
use crate::services::cascade;

const REVIEWS_PER_PAGE: i64 = 20;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub booking_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub content: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i16>,
}

async fn authored_review(pool: &PgPool, user: &AuthUser, id: Uuid) -> Result<Review> {
    permissions::require_guest(user)?;
    let review = review_repo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Review"))?;
    permissions::check_review_author(user, &review)?;
    Ok(review)
}

/// GET /api/v1/reviews
pub async fn list_reviews(
    pool: web::Data<PgPool>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let reviews =
        review_repo::list(pool.get_ref(), REVIEWS_PER_PAGE, query.offset(REVIEWS_PER_PAGE)).await?;
    let total = review_repo::count(pool.get_ref()).await?;
    Ok(ok("Reviews", Page::new(reviews, query, REVIEWS_PER_PAGE, total)))
}

/// GET /api/v1/reviews/{id}
pub async fn get_review(pool: web::Data<PgPool>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let review = review_repo::find_by_id(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Review"))?;
    Ok(ok("Review", review))
}

/// GET /api/v1/hotels/{id}/reviews
pub async fn reviews_of_hotel(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let hotel_id = path.into_inner();
    hotel_repo::find_by_id(pool.get_ref(), hotel_id)
        .await?
        .ok_or_else(|| AppError::not_found("Hotel"))?;
    let query = query.into_inner();
    let reviews = review_repo::for_hotel(
        pool.get_ref(),
        hotel_id,
        REVIEWS_PER_PAGE,
        query.offset(REVIEWS_PER_PAGE),
    )
    .await?;
    let total = review_repo::count_for_hotel(pool.get_ref(), hotel_id).await?;
    Ok(ok("Reviews", Page::new(reviews, query, REVIEWS_PER_PAGE, total)))
}

/// GET /api/v1/bookings/{id}/review
pub async fn review_of_booking(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let review = review_repo::find_by_booking(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Review"))?;
    Ok(ok("Review", review))
}

/// POST /api/v1/reviews
pub async fn create_review(
    pool: web::Data<PgPool>,
    user: AuthUser,
    req: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse> {
    permissions::require_guest(&user)?;
    let req = req.into_inner();
    req.validate()?;

    let booking = booking_repo::find_by_id(pool.get_ref(), req.booking_id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking"))?;
    permissions::check_booking_owner(&user, &booking)?;
    if booking.status != BookingStatus::Accepted {
        return Err(AppError::BadRequest(
            "Only accepted bookings can be reviewed".into(),
        ));
    }
    if review_repo::find_by_booking(pool.get_ref(), booking.id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("This booking already has a review".into()));
    }

    let review = review_repo::create(
        pool.get_ref(),
        booking.id,
        booking.hotel_id,
        user.id,
        &req.title,
        &req.content,
        req.rating,
    )
    .await?;
    hotel_repo::refresh_rating(pool.get_ref(), review.hotel_id).await?;
    Ok(created("Review created", review))
}

/// PUT /api/v1/reviews/{id}
pub async fn update_review(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<UpdateReviewRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;
    let review = authored_review(pool.get_ref(), &user, path.into_inner()).await?;

    let review = review_repo::update(
        pool.get_ref(),
        review.id,
        req.title.as_deref(),
        req.content.as_deref(),
        req.rating,
    )
    .await?
    .ok_or_else(|| AppError::not_found("Review"))?;
    if req.rating.is_some() {
        hotel_repo::refresh_rating(pool.get_ref(), review.hotel_id).await?;
    }
    Ok(ok("Review updated", review))
}

/// DELETE /api/v1/reviews/{id}
pub async fn delete_review(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let review = authored_review(pool.get_ref(), &user, path.into_inner()).await?;
    cascade::delete_review(pool.get_ref(), review.id, review.hotel_id).await?;
    Ok(done("Review deleted"))
}

/// POST /api/v1/reviews/{id}/restore
pub async fn restore_review(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    permissions::require_guest(&user)?;
    let review = review_repo::find_including_deleted(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Review"))?;
    permissions::check_review_author(&user, &review)?;
    cascade::restore_review(pool.get_ref(), review.id, review.hotel_id, review.deleted_at).await?;
    Ok(done("Review restored"))
}

/// DELETE /api/v1/reviews/mine
pub async fn delete_my_reviews(pool: web::Data<PgPool>, user: AuthUser) -> Result<HttpResponse> {
    permissions::require_guest(&user)?;
    let removed = cascade::delete_reviews_by_author(pool.get_ref(), user.id, None).await?;
    Ok(ok("Reviews deleted", serde_json::json!({ "deleted": removed })))
}

/// POST /api/v1/reviews/mine/restore
pub async fn restore_my_reviews(pool: web::Data<PgPool>, user: AuthUser) -> Result<HttpResponse> {
    permissions::require_guest(&user)?;
    let restored = cascade::restore_reviews_by_author(pool.get_ref(), user.id, None).await?;
    Ok(ok("Reviews restored", serde_json::json!({ "restored": restored })))
}

/// DELETE /api/v1/hotels/{id}/reviews/mine
pub async fn delete_my_reviews_of_hotel(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    permissions::require_guest(&user)?;
    let hotel_id = path.into_inner();
    let removed = cascade::delete_reviews_by_author(pool.get_ref(), user.id, Some(hotel_id)).await?;
    Ok(ok("Reviews deleted", serde_json::json!({ "deleted": removed })))
}

/// POST /api/v1/hotels/{id}/reviews/mine/restore
pub async fn restore_my_reviews_of_hotel(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    permissions::require_guest(&user)?;
    let hotel_id = path.into_inner();
    let restored =
        cascade::restore_reviews_by_author(pool.get_ref(), user.id, Some(hotel_id)).await?;
    Ok(ok("Reviews restored", serde_json::json!({ "restored": restored })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        let review = |rating: i16| CreateReviewRequest {
            booking_id: Uuid::new_v4(),
            title: "Lovely".into(),
            content: "Great view".into(),
            rating,
        };
        assert!(review(0).validate().is_err());
        assert!(review(1).validate().is_ok());
        assert!(review(5).validate().is_ok());
        assert!(review(6).validate().is_err());
    }
}
