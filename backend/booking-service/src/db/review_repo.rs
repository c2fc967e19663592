/// Review repository
use crate::models::{Review, ReviewWithAuthor};
use sqlx::PgPool;
use uuid::Uuid;

macro_rules! review_columns {
    () => {
        "id, booking_id, hotel_id, user_id, title, content, rating, created_at, updated_at, deleted_at"
    };
}

pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Review>, sqlx::Error> {
    sqlx::query_as::<_, Review>(concat!(
        "SELECT ",
        review_columns!(),
        " FROM reviews WHERE deleted_at IS NULL ORDER BY created_at DESC, id LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews WHERE deleted_at IS NULL")
        .fetch_one(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Review>, sqlx::Error> {
    sqlx::query_as::<_, Review>(concat!(
        "SELECT ",
        review_columns!(),
        " FROM reviews WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_including_deleted(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Review>, sqlx::Error> {
    sqlx::query_as::<_, Review>(concat!(
        "SELECT ",
        review_columns!(),
        " FROM reviews WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_booking(
    pool: &PgPool,
    booking_id: Uuid,
) -> Result<Option<Review>, sqlx::Error> {
    sqlx::query_as::<_, Review>(concat!(
        "SELECT ",
        review_columns!(),
        " FROM reviews WHERE booking_id = $1 AND deleted_at IS NULL"
    ))
    .bind(booking_id)
    .fetch_optional(pool)
    .await
}

/// Live reviews of a hotel with the reviewer's name, newest first.
pub async fn for_hotel(
    pool: &PgPool,
    hotel_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<ReviewWithAuthor>, sqlx::Error> {
    sqlx::query_as::<_, ReviewWithAuthor>(
        r#"
        SELECT r.id, r.booking_id, r.hotel_id, r.user_id, r.title, r.content, r.rating,
               r.created_at, u.name AS author_name
        FROM reviews r
        JOIN users u ON u.id = r.user_id
        WHERE r.hotel_id = $1 AND r.deleted_at IS NULL
        ORDER BY r.created_at DESC, r.id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(hotel_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_for_hotel(pool: &PgPool, hotel_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM reviews WHERE hotel_id = $1 AND deleted_at IS NULL",
    )
    .bind(hotel_id)
    .fetch_one(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    booking_id: Uuid,
    hotel_id: Uuid,
    user_id: Uuid,
    title: &str,
    content: &str,
    rating: i16,
) -> Result<Review, sqlx::Error> {
    sqlx::query_as::<_, Review>(concat!(
        "INSERT INTO reviews (booking_id, hotel_id, user_id, title, content, rating) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING ",
        review_columns!()
    ))
    .bind(booking_id)
    .bind(hotel_id)
    .bind(user_id)
    .bind(title)
    .bind(content)
    .bind(rating)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    title: Option<&str>,
    content: Option<&str>,
    rating: Option<i16>,
) -> Result<Option<Review>, sqlx::Error> {
    sqlx::query_as::<_, Review>(concat!(
        r#"
        UPDATE reviews SET
            title = COALESCE($2, title),
            content = COALESCE($3, content),
            rating = COALESCE($4, rating),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING "#,
        review_columns!()
    ))
    .bind(id)
    .bind(title)
    .bind(content)
    .bind(rating)
    .fetch_optional(pool)
    .await
}
