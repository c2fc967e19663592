/// Image handlers, shared by hotel and category pictures.
///
/// Routes pick the table by registering an [`ImageKind`] as resource data.
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{created, done, ok, owned_category, owned_hotel};
use crate::db::image_repo::{self, ImageKind};
use crate::db::{category_repo, hotel_repo};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{Page, PageQuery};
use crate::services::cascade;

const IMAGES_PER_PAGE: i64 = 20;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateImageRequest {
    /// Hotel or category id, depending on the route
    #[serde(alias = "hotel_id", alias = "category_id")]
    pub owner_id: Uuid,
    #[validate(url)]
    pub image_url: String,
    #[validate(length(max = 1000))]
    pub image_description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateImageRequest {
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(length(max = 1000))]
    pub image_description: Option<String>,
}

/// Fail unless the caller owns the hotel or category behind `owner_id`.
async fn check_owner(
    pool: &PgPool,
    user: &AuthUser,
    kind: ImageKind,
    owner_id: Uuid,
) -> Result<()> {
    match kind {
        ImageKind::Hotel => owned_hotel(pool, user, owner_id).await.map(|_| ()),
        ImageKind::Category => owned_category(pool, user, owner_id).await.map(|_| ()),
    }
}

async fn public_owner_exists(pool: &PgPool, kind: ImageKind, owner_id: Uuid) -> Result<()> {
    let found = match kind {
        ImageKind::Hotel => hotel_repo::find_by_id(pool, owner_id).await?.is_some(),
        ImageKind::Category => category_repo::find_by_id(pool, owner_id).await?.is_some(),
    };
    if found {
        Ok(())
    } else {
        Err(match kind {
            ImageKind::Hotel => AppError::not_found("Hotel"),
            ImageKind::Category => AppError::not_found("Category"),
        })
    }
}

/// GET /api/v1/{hotel,category}-images
pub async fn list_images(
    pool: web::Data<PgPool>,
    kind: web::Data<ImageKind>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let images =
        image_repo::list(pool.get_ref(), **kind, IMAGES_PER_PAGE, query.offset(IMAGES_PER_PAGE))
            .await?;
    let total = image_repo::count(pool.get_ref(), **kind).await?;
    Ok(ok("Images", Page::new(images, query, IMAGES_PER_PAGE, total)))
}

/// GET /api/v1/{hotel,category}-images/{id}
pub async fn get_image(
    pool: web::Data<PgPool>,
    kind: web::Data<ImageKind>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let image = image_repo::find_by_id(pool.get_ref(), **kind, path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Image"))?;
    Ok(ok("Image", image))
}

/// GET /api/v1/{hotels,categories}/{id}/images
pub async fn images_of_owner(
    pool: web::Data<PgPool>,
    kind: web::Data<ImageKind>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let owner_id = path.into_inner();
    public_owner_exists(pool.get_ref(), **kind, owner_id).await?;
    let images = image_repo::for_owners(pool.get_ref(), **kind, &[owner_id]).await?;
    Ok(ok("Images", images))
}

/// POST /api/v1/{hotel,category}-images
pub async fn create_image(
    pool: web::Data<PgPool>,
    kind: web::Data<ImageKind>,
    user: AuthUser,
    req: web::Json<CreateImageRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;
    check_owner(pool.get_ref(), &user, **kind, req.owner_id).await?;

    let image = image_repo::create(
        pool.get_ref(),
        **kind,
        req.owner_id,
        &req.image_url,
        req.image_description.as_deref(),
    )
    .await?;
    Ok(created("Image created", image))
}

/// PUT /api/v1/{hotel,category}-images/{id}
pub async fn update_image(
    pool: web::Data<PgPool>,
    kind: web::Data<ImageKind>,
    user: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<UpdateImageRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;
    let image = image_repo::find_by_id(pool.get_ref(), **kind, path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Image"))?;
    check_owner(pool.get_ref(), &user, **kind, image.owner_id).await?;

    let image = image_repo::update(
        pool.get_ref(),
        **kind,
        image.id,
        req.image_url.as_deref(),
        req.image_description.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::not_found("Image"))?;
    Ok(ok("Image updated", image))
}

/// DELETE /api/v1/{hotel,category}-images/{id}
pub async fn delete_image(
    pool: web::Data<PgPool>,
    kind: web::Data<ImageKind>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let image = image_repo::find_by_id(pool.get_ref(), **kind, path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Image"))?;
    check_owner(pool.get_ref(), &user, **kind, image.owner_id).await?;
    image_repo::soft_delete(pool.get_ref(), **kind, image.id).await?;
    Ok(done("Image deleted"))
}

/// DELETE /api/v1/{hotels,categories}/{id}/images
pub async fn delete_images_of_owner(
    pool: web::Data<PgPool>,
    kind: web::Data<ImageKind>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let owner_id = path.into_inner();
    check_owner(pool.get_ref(), &user, **kind, owner_id).await?;
    let removed = cascade::delete_images_of(pool.get_ref(), **kind, owner_id).await?;
    Ok(ok("Images deleted", serde_json::json!({ "deleted": removed })))
}

/// POST /api/v1/{hotels,categories}/{id}/images/restore
pub async fn restore_images_of_owner(
    pool: web::Data<PgPool>,
    kind: web::Data<ImageKind>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let owner_id = path.into_inner();
    check_owner(pool.get_ref(), &user, **kind, owner_id).await?;
    let restored = cascade::restore_images_of(pool.get_ref(), **kind, owner_id).await?;
    Ok(ok("Images restored", serde_json::json!({ "restored": restored })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_id_aliases() {
        let id = Uuid::new_v4();
        let req: CreateImageRequest = serde_json::from_value(serde_json::json!({
            "category_id": id,
            "image_url": "https://cdn.example.com/room.jpg"
        }))
        .unwrap();
        assert_eq!(req.owner_id, id);
        assert!(req.validate().is_ok());

        let bad: CreateImageRequest = serde_json::from_value(serde_json::json!({
            "hotel_id": id,
            "image_url": "not a url"
        }))
        .unwrap();
        assert!(bad.validate().is_err());
    }
}
