/// Reply handlers. Hotel accounts answer reviews of their own hotels,
/// admins may answer any review.
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{created, done, ok};
use crate::db::{hotel_repo, reply_repo, review_repo};
use crate::error::{AppError, Result};
use crate::middleware::{permissions, AuthUser};
use crate::models::{Page, PageQuery, Reply, Review, Role};
use crate::services::cascade;

const REPLIES_PER_PAGE: i64 = 20;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReplyRequest {
    pub review_id: Uuid,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReplyRequest {
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

/// Review the caller is allowed to answer or moderate.
async fn answerable_review(pool: &PgPool, user: &AuthUser, review_id: Uuid) -> Result<Review> {
    permissions::require_replier(user)?;
    let review = review_repo::find_by_id(pool, review_id)
        .await?
        .ok_or_else(|| AppError::not_found("Review"))?;
    if user.role != Role::Admin {
        let hotel = hotel_repo::find_by_id(pool, review.hotel_id)
            .await?
            .ok_or_else(|| AppError::not_found("Hotel"))?;
        permissions::check_hotel_owner(user, &hotel)?;
    }
    Ok(review)
}

async fn authored_reply(pool: &PgPool, user: &AuthUser, id: Uuid) -> Result<Reply> {
    let reply = reply_repo::find_including_deleted(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Reply"))?;
    permissions::check_reply_author(user, &reply)?;
    Ok(reply)
}

/// GET /api/v1/replies
pub async fn list_replies(
    pool: web::Data<PgPool>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let replies =
        reply_repo::list(pool.get_ref(), REPLIES_PER_PAGE, query.offset(REPLIES_PER_PAGE)).await?;
    let total = reply_repo::count(pool.get_ref()).await?;
    Ok(ok("Replies", Page::new(replies, query, REPLIES_PER_PAGE, total)))
}

/// GET /api/v1/replies/{id}
pub async fn get_reply(pool: web::Data<PgPool>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let reply = reply_repo::find_by_id(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Reply"))?;
    Ok(ok("Reply", reply))
}

/// GET /api/v1/reviews/{id}/replies
pub async fn replies_of_review(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let review_id = path.into_inner();
    review_repo::find_by_id(pool.get_ref(), review_id)
        .await?
        .ok_or_else(|| AppError::not_found("Review"))?;
    let replies = reply_repo::for_review(pool.get_ref(), review_id).await?;
    Ok(ok("Replies", replies))
}

/// POST /api/v1/replies
pub async fn create_reply(
    pool: web::Data<PgPool>,
    user: AuthUser,
    req: web::Json<CreateReplyRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    permissions::require_replier(&user)?;
    req.validate()?;
    let review = answerable_review(pool.get_ref(), &user, req.review_id).await?;

    let reply = reply_repo::create(pool.get_ref(), review.id, user.id, req.content.trim()).await?;
    tracing::info!(
        target: "notifications",
        recipient = %review.user_id,
        review_id = %review.id,
        "your review received a reply"
    );
    Ok(created("Reply created", reply))
}

/// PUT /api/v1/replies/{id}
pub async fn update_reply(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<UpdateReplyRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;
    let reply = authored_reply(pool.get_ref(), &user, path.into_inner()).await?;
    let reply = reply_repo::update(pool.get_ref(), reply.id, req.content.trim())
        .await?
        .ok_or_else(|| AppError::not_found("Reply"))?;
    Ok(ok("Reply updated", reply))
}

/// DELETE /api/v1/replies/{id}
pub async fn delete_reply(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let reply = authored_reply(pool.get_ref(), &user, path.into_inner()).await?;
    if !reply_repo::soft_delete(pool.get_ref(), reply.id).await? {
        return Err(AppError::not_found("Reply"));
    }
    Ok(done("Reply deleted"))
}

/// POST /api/v1/replies/{id}/restore
pub async fn restore_reply(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let reply = authored_reply(pool.get_ref(), &user, path.into_inner()).await?;
    review_repo::find_by_id(pool.get_ref(), reply.review_id)
        .await?
        .ok_or_else(|| AppError::Conflict("The review of this reply is deleted".into()))?;
    let reply = reply_repo::restore(pool.get_ref(), reply.id)
        .await?
        .ok_or_else(|| AppError::Conflict("Reply is not deleted".into()))?;
    Ok(ok("Reply restored", reply))
}

/// DELETE /api/v1/reviews/{id}/replies
pub async fn delete_replies_of_review(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let review = answerable_review(pool.get_ref(), &user, path.into_inner()).await?;
    let removed = cascade::delete_replies_of_review(pool.get_ref(), review.id).await?;
    Ok(ok("Replies deleted", serde_json::json!({ "deleted": removed })))
}

/// POST /api/v1/reviews/{id}/replies/restore
pub async fn restore_replies_of_review(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let review = answerable_review(pool.get_ref(), &user, path.into_inner()).await?;
    let restored = cascade::restore_replies_of_review(pool.get_ref(), review.id).await?;
    Ok(ok("Replies restored", serde_json::json!({ "restored": restored })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_reply_rejected() {
        let req = CreateReplyRequest {
            review_id: Uuid::new_v4(),
            content: String::new(),
        };
        assert!(req.validate().is_err());

        let req = UpdateReplyRequest {
            content: "Thanks for staying with us".into(),
        };
        assert!(req.validate().is_ok());
    }
}
