/// Reply repository
use crate::models::Reply;
use sqlx::PgPool;
use uuid::Uuid;

macro_rules! reply_columns {
    () => {
        "id, review_id, user_id, content, created_at, updated_at, deleted_at"
    };
}

pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Reply>, sqlx::Error> {
    sqlx::query_as::<_, Reply>(concat!(
        "SELECT ",
        reply_columns!(),
        " FROM replies WHERE deleted_at IS NULL ORDER BY created_at DESC, id LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM replies WHERE deleted_at IS NULL")
        .fetch_one(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Reply>, sqlx::Error> {
    sqlx::query_as::<_, Reply>(concat!(
        "SELECT ",
        reply_columns!(),
        " FROM replies WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_including_deleted(pool: &PgPool, id: Uuid) -> Result<Option<Reply>, sqlx::Error> {
    sqlx::query_as::<_, Reply>(concat!("SELECT ", reply_columns!(), " FROM replies WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn for_review(pool: &PgPool, review_id: Uuid) -> Result<Vec<Reply>, sqlx::Error> {
    sqlx::query_as::<_, Reply>(concat!(
        "SELECT ",
        reply_columns!(),
        " FROM replies WHERE review_id = $1 AND deleted_at IS NULL ORDER BY created_at"
    ))
    .bind(review_id)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    review_id: Uuid,
    user_id: Uuid,
    content: &str,
) -> Result<Reply, sqlx::Error> {
    sqlx::query_as::<_, Reply>(concat!(
        "INSERT INTO replies (review_id, user_id, content) VALUES ($1, $2, $3) RETURNING ",
        reply_columns!()
    ))
    .bind(review_id)
    .bind(user_id)
    .bind(content)
    .fetch_one(pool)
    .await
}

pub async fn update(pool: &PgPool, id: Uuid, content: &str) -> Result<Option<Reply>, sqlx::Error> {
    sqlx::query_as::<_, Reply>(concat!(
        "UPDATE replies SET content = $2, updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NULL RETURNING ",
        reply_columns!()
    ))
    .bind(id)
    .bind(content)
    .fetch_optional(pool)
    .await
}

pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE replies SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn restore(pool: &PgPool, id: Uuid) -> Result<Option<Reply>, sqlx::Error> {
    sqlx::query_as::<_, Reply>(concat!(
        "UPDATE replies SET deleted_at = NULL, updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NOT NULL RETURNING ",
        reply_columns!()
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}
