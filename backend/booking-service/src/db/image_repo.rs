/// Image rows for hotels and categories. Both tables share a shape and
/// differ only in the owning column.
use crate::models::Image;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Hotel,
    Category,
}

impl ImageKind {
    fn table(self) -> &'static str {
        match self {
            ImageKind::Hotel => "hotel_images",
            ImageKind::Category => "category_images",
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            ImageKind::Hotel => "hotel_id",
            ImageKind::Category => "category_id",
        }
    }

    fn select(self) -> String {
        format!(
            "SELECT id, {} AS owner_id, image_url, image_description, created_at, updated_at FROM {}",
            self.owner_column(),
            self.table()
        )
    }

    fn returning(self) -> String {
        format!(
            "RETURNING id, {} AS owner_id, image_url, image_description, created_at, updated_at",
            self.owner_column()
        )
    }
}

pub async fn list(
    pool: &PgPool,
    kind: ImageKind,
    limit: i64,
    offset: i64,
) -> Result<Vec<Image>, sqlx::Error> {
    let sql = format!(
        "{} WHERE deleted_at IS NULL ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        kind.select()
    );
    sqlx::query_as::<_, Image>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn count(pool: &PgPool, kind: ImageKind) -> Result<i64, sqlx::Error> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL",
        kind.table()
    );
    sqlx::query_scalar::<_, i64>(&sql).fetch_one(pool).await
}

pub async fn find_by_id(
    pool: &PgPool,
    kind: ImageKind,
    id: Uuid,
) -> Result<Option<Image>, sqlx::Error> {
    let sql = format!("{} WHERE id = $1 AND deleted_at IS NULL", kind.select());
    sqlx::query_as::<_, Image>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Live images of the given owners, oldest first.
pub async fn for_owners(
    pool: &PgPool,
    kind: ImageKind,
    owner_ids: &[Uuid],
) -> Result<Vec<Image>, sqlx::Error> {
    if owner_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "{} WHERE {} = ANY($1) AND deleted_at IS NULL ORDER BY created_at",
        kind.select(),
        kind.owner_column()
    );
    sqlx::query_as::<_, Image>(&sql)
        .bind(owner_ids)
        .fetch_all(pool)
        .await
}

pub async fn create(
    pool: &PgPool,
    kind: ImageKind,
    owner_id: Uuid,
    image_url: &str,
    image_description: Option<&str>,
) -> Result<Image, sqlx::Error> {
    let sql = format!(
        "INSERT INTO {} ({}, image_url, image_description) VALUES ($1, $2, $3) {}",
        kind.table(),
        kind.owner_column(),
        kind.returning()
    );
    sqlx::query_as::<_, Image>(&sql)
        .bind(owner_id)
        .bind(image_url)
        .bind(image_description)
        .fetch_one(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    kind: ImageKind,
    id: Uuid,
    image_url: Option<&str>,
    image_description: Option<&str>,
) -> Result<Option<Image>, sqlx::Error> {
    let sql = format!(
        "UPDATE {} SET image_url = COALESCE($2, image_url), \
         image_description = COALESCE($3, image_description), updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NULL {}",
        kind.table(),
        kind.returning()
    );
    sqlx::query_as::<_, Image>(&sql)
        .bind(id)
        .bind(image_url)
        .bind(image_description)
        .fetch_optional(pool)
        .await
}

pub async fn soft_delete(pool: &PgPool, kind: ImageKind, id: Uuid) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "UPDATE {} SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        kind.table()
    );
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Soft-delete every live image of `owner_ids`, stamping `at`.
pub async fn soft_delete_for_owners(
    conn: &mut PgConnection,
    kind: ImageKind,
    owner_ids: &[Uuid],
    at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let sql = format!(
        "UPDATE {} SET deleted_at = $2 WHERE {} = ANY($1) AND deleted_at IS NULL",
        kind.table(),
        kind.owner_column()
    );
    let result = sqlx::query(&sql)
        .bind(owner_ids)
        .bind(at)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Restore images of `owner_ids` deleted at exactly `at`.
pub async fn restore_for_owners(
    conn: &mut PgConnection,
    kind: ImageKind,
    owner_ids: &[Uuid],
    at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let sql = format!(
        "UPDATE {} SET deleted_at = NULL, updated_at = NOW() WHERE {} = ANY($1) AND deleted_at = $2",
        kind.table(),
        kind.owner_column()
    );
    let result = sqlx::query(&sql)
        .bind(owner_ids)
        .bind(at)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Most recent deletion stamp among the images of `owner_id`.
pub async fn last_deleted_at(
    pool: &PgPool,
    kind: ImageKind,
    owner_id: Uuid,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    let sql = format!(
        "SELECT MAX(deleted_at) FROM {} WHERE {} = $1",
        kind.table(),
        kind.owner_column()
    );
    sqlx::query_scalar::<_, Option<DateTime<Utc>>>(&sql)
        .bind(owner_id)
        .fetch_one(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_aliases_owner_column() {
        assert_eq!(
            ImageKind::Category.select(),
            "SELECT id, category_id AS owner_id, image_url, image_description, created_at, updated_at FROM category_images"
        );
        assert!(ImageKind::Hotel.returning().contains("hotel_id AS owner_id"));
    }
}
