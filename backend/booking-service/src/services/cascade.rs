/// Soft-delete and restore across the ownership graph.
///
/// A cascade stamps every reached row with the same `deleted_at`, inside a
/// single transaction. Restore walks the same edges but only clears rows
/// whose stamp equals the parent's, so rows deleted on their own earlier
/// stay deleted.
use crate::db::hotel_repo;
use crate::db::image_repo::{self, ImageKind};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Delete,
    Restore,
}

#[derive(Debug, Clone, Copy)]
enum Table {
    Hotels,
    Categories,
    Rooms,
    Bookings,
    BookingDetails,
    Payments,
    Reviews,
    Replies,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::Hotels => "hotels",
            Table::Categories => "categories",
            Table::Rooms => "rooms",
            Table::Bookings => "bookings",
            Table::BookingDetails => "booking_details",
            Table::Payments => "payments",
            Table::Reviews => "reviews",
            Table::Replies => "replies",
        }
    }
}

/// Stamp or unstamp rows of `table` whose `column` is in `parents`.
/// Returns the ids touched.
async fn apply(
    conn: &mut PgConnection,
    mode: Mode,
    table: Table,
    column: &'static str,
    parents: &[Uuid],
    at: DateTime<Utc>,
) -> Result<Vec<Uuid>> {
    if parents.is_empty() {
        return Ok(Vec::new());
    }
    let sql = match mode {
        Mode::Delete => format!(
            "UPDATE {} SET deleted_at = $2 WHERE {} = ANY($1) AND deleted_at IS NULL RETURNING id",
            table.name(),
            column
        ),
        Mode::Restore => format!(
            "UPDATE {} SET deleted_at = NULL, updated_at = NOW() \
             WHERE {} = ANY($1) AND deleted_at = $2 RETURNING id",
            table.name(),
            column
        ),
    };
    let ids = sqlx::query_scalar::<_, Uuid>(&sql)
        .bind(parents)
        .bind(at)
        .fetch_all(conn)
        .await?;
    Ok(ids)
}

async fn apply_images(
    conn: &mut PgConnection,
    mode: Mode,
    kind: ImageKind,
    owners: &[Uuid],
    at: DateTime<Utc>,
) -> Result<u64> {
    if owners.is_empty() {
        return Ok(0);
    }
    let rows = match mode {
        Mode::Delete => image_repo::soft_delete_for_owners(conn, kind, owners, at).await?,
        Mode::Restore => image_repo::restore_for_owners(conn, kind, owners, at).await?,
    };
    Ok(rows)
}

/// Most recent stamp among rows of `table` under `parents`.
async fn last_stamp(
    conn: &mut PgConnection,
    table: Table,
    column: &'static str,
    parents: &[Uuid],
) -> Result<Option<DateTime<Utc>>> {
    let sql = format!(
        "SELECT MAX(deleted_at) FROM {} WHERE {} = ANY($1)",
        table.name(),
        column
    );
    let at = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(&sql)
        .bind(parents)
        .fetch_one(conn)
        .await?;
    Ok(at)
}

async fn review_tree(
    conn: &mut PgConnection,
    mode: Mode,
    reviews: &[Uuid],
    at: DateTime<Utc>,
) -> Result<u64> {
    let replies = apply(conn, mode, Table::Replies, "review_id", reviews, at).await?;
    Ok(replies.len() as u64)
}

async fn booking_tree(
    conn: &mut PgConnection,
    mode: Mode,
    bookings: &[Uuid],
    at: DateTime<Utc>,
) -> Result<u64> {
    let details = apply(conn, mode, Table::BookingDetails, "booking_id", bookings, at).await?;
    let payments = apply(conn, mode, Table::Payments, "booking_id", bookings, at).await?;
    let reviews = apply(conn, mode, Table::Reviews, "booking_id", bookings, at).await?;
    let replies = review_tree(conn, mode, &reviews, at).await?;
    Ok((details.len() + payments.len() + reviews.len()) as u64 + replies)
}

async fn category_tree(
    conn: &mut PgConnection,
    mode: Mode,
    categories: &[Uuid],
    at: DateTime<Utc>,
) -> Result<u64> {
    let rooms = apply(conn, mode, Table::Rooms, "category_id", categories, at).await?;
    let images = apply_images(conn, mode, ImageKind::Category, categories, at).await?;
    Ok(rooms.len() as u64 + images)
}

async fn hotel_tree(
    conn: &mut PgConnection,
    mode: Mode,
    hotel_id: Uuid,
    at: DateTime<Utc>,
) -> Result<u64> {
    let hotel = [hotel_id];
    let categories = apply(conn, mode, Table::Categories, "hotel_id", &hotel, at).await?;
    let mut rows = categories.len() as u64;
    rows += category_tree(conn, mode, &categories, at).await?;
    rows += apply_images(conn, mode, ImageKind::Hotel, &hotel, at).await?;
    let bookings = apply(conn, mode, Table::Bookings, "hotel_id", &hotel, at).await?;
    rows += bookings.len() as u64;
    rows += booking_tree(conn, mode, &bookings, at).await?;
    Ok(rows)
}

fn deleted_at(stamp: Option<DateTime<Utc>>, what: &str) -> Result<DateTime<Utc>> {
    stamp.ok_or_else(|| AppError::Conflict(format!("{} is not deleted", what)))
}

pub async fn delete_hotel(pool: &PgPool, hotel_id: Uuid) -> Result<u64> {
    let at = Utc::now();
    let mut tx = pool.begin().await?;
    let root = apply(&mut *tx, Mode::Delete, Table::Hotels, "id", &[hotel_id], at).await?;
    if root.is_empty() {
        return Err(AppError::not_found("Hotel"));
    }
    let rows = hotel_tree(&mut *tx, Mode::Delete, hotel_id, at).await?;
    tx.commit().await?;

    tracing::info!(hotel_id = %hotel_id, rows, "hotel soft-deleted");
    Ok(rows + 1)
}

pub async fn restore_hotel(
    pool: &PgPool,
    hotel_id: Uuid,
    stamp: Option<DateTime<Utc>>,
) -> Result<u64> {
    let at = deleted_at(stamp, "Hotel")?;
    let mut tx = pool.begin().await?;
    apply(&mut *tx, Mode::Restore, Table::Hotels, "id", &[hotel_id], at).await?;
    let rows = hotel_tree(&mut *tx, Mode::Restore, hotel_id, at).await?;
    tx.commit().await?;

    hotel_repo::refresh_rating(pool, hotel_id).await?;
    tracing::info!(hotel_id = %hotel_id, rows, "hotel restored");
    Ok(rows + 1)
}

pub async fn delete_category(pool: &PgPool, category_id: Uuid) -> Result<u64> {
    let at = Utc::now();
    let mut tx = pool.begin().await?;
    let root = apply(&mut *tx, Mode::Delete, Table::Categories, "id", &[category_id], at).await?;
    if root.is_empty() {
        return Err(AppError::not_found("Category"));
    }
    let rows = category_tree(&mut *tx, Mode::Delete, &root, at).await?;
    tx.commit().await?;

    tracing::info!(category_id = %category_id, rows, "category soft-deleted");
    Ok(rows + 1)
}

pub async fn restore_category(
    pool: &PgPool,
    category_id: Uuid,
    stamp: Option<DateTime<Utc>>,
) -> Result<u64> {
    let at = deleted_at(stamp, "Category")?;
    let mut tx = pool.begin().await?;
    let root = apply(&mut *tx, Mode::Restore, Table::Categories, "id", &[category_id], at).await?;
    let rows = category_tree(&mut *tx, Mode::Restore, &root, at).await?;
    tx.commit().await?;

    tracing::info!(category_id = %category_id, rows, "category restored");
    Ok(rows + root.len() as u64)
}

/// Soft-delete every live category of a hotel with its rooms and images.
pub async fn delete_categories_of_hotel(pool: &PgPool, hotel_id: Uuid) -> Result<u64> {
    let at = Utc::now();
    let mut tx = pool.begin().await?;
    let categories = apply(
        &mut *tx,
        Mode::Delete,
        Table::Categories,
        "hotel_id",
        &[hotel_id],
        at,
    )
    .await?;
    category_tree(&mut *tx, Mode::Delete, &categories, at).await?;
    tx.commit().await?;
    Ok(categories.len() as u64)
}

/// Restore the categories of a hotel removed by the most recent deletion.
pub async fn restore_categories_of_hotel(pool: &PgPool, hotel_id: Uuid) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let Some(at) = last_stamp(&mut *tx, Table::Categories, "hotel_id", &[hotel_id]).await? else {
        return Ok(0);
    };
    let categories = apply(
        &mut *tx,
        Mode::Restore,
        Table::Categories,
        "hotel_id",
        &[hotel_id],
        at,
    )
    .await?;
    category_tree(&mut *tx, Mode::Restore, &categories, at).await?;
    tx.commit().await?;
    Ok(categories.len() as u64)
}

/// Restore the most recently deleted rooms of the given categories.
pub async fn restore_rooms_of_categories(pool: &PgPool, categories: &[Uuid]) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let Some(at) = last_stamp(&mut *tx, Table::Rooms, "category_id", categories).await? else {
        return Ok(0);
    };
    let rooms = apply(&mut *tx, Mode::Restore, Table::Rooms, "category_id", categories, at).await?;
    tx.commit().await?;
    Ok(rooms.len() as u64)
}

/// Soft-delete every live image of an owner.
pub async fn delete_images_of(pool: &PgPool, kind: ImageKind, owner: Uuid) -> Result<u64> {
    let mut conn = pool.acquire().await?;
    apply_images(&mut *conn, Mode::Delete, kind, &[owner], Utc::now()).await
}

/// Restore the images of an owner removed by the most recent deletion.
pub async fn restore_images_of(pool: &PgPool, kind: ImageKind, owner: Uuid) -> Result<u64> {
    let Some(at) = image_repo::last_deleted_at(pool, kind, owner).await? else {
        return Ok(0);
    };
    let mut conn = pool.acquire().await?;
    apply_images(&mut *conn, Mode::Restore, kind, &[owner], at).await
}

/// Soft-delete a booking still `unpaid`, with its details and payment.
/// Returns false if it was paid or removed meanwhile.
pub async fn expire_unpaid_booking(pool: &PgPool, booking_id: Uuid) -> Result<bool> {
    let at = Utc::now();
    let mut tx = pool.begin().await?;
    let expired = sqlx::query_scalar::<_, Uuid>(
        "UPDATE bookings SET deleted_at = $2 \
         WHERE id = $1 AND status = 'unpaid' AND deleted_at IS NULL RETURNING id",
    )
    .bind(booking_id)
    .bind(at)
    .fetch_all(&mut *tx)
    .await?;
    if expired.is_empty() {
        return Ok(false);
    }
    booking_tree(&mut *tx, Mode::Delete, &expired, at).await?;
    tx.commit().await?;
    Ok(true)
}

/// Soft-delete the live details of a booking. Runs inside the caller's
/// transaction.
pub async fn delete_details_of_booking(
    conn: &mut PgConnection,
    booking_id: Uuid,
    at: DateTime<Utc>,
) -> Result<u64> {
    let details = apply(
        conn,
        Mode::Delete,
        Table::BookingDetails,
        "booking_id",
        &[booking_id],
        at,
    )
    .await?;
    Ok(details.len() as u64)
}

pub async fn delete_review(pool: &PgPool, review_id: Uuid, hotel_id: Uuid) -> Result<u64> {
    let at = Utc::now();
    let mut tx = pool.begin().await?;
    let root = apply(&mut *tx, Mode::Delete, Table::Reviews, "id", &[review_id], at).await?;
    if root.is_empty() {
        return Err(AppError::not_found("Review"));
    }
    let rows = review_tree(&mut *tx, Mode::Delete, &root, at).await?;
    tx.commit().await?;

    hotel_repo::refresh_rating(pool, hotel_id).await?;
    Ok(rows + 1)
}

pub async fn restore_review(
    pool: &PgPool,
    review_id: Uuid,
    hotel_id: Uuid,
    stamp: Option<DateTime<Utc>>,
) -> Result<u64> {
    let at = deleted_at(stamp, "Review")?;
    let mut tx = pool.begin().await?;
    let root = apply(&mut *tx, Mode::Restore, Table::Reviews, "id", &[review_id], at).await?;
    let rows = review_tree(&mut *tx, Mode::Restore, &root, at).await?;
    tx.commit().await?;

    hotel_repo::refresh_rating(pool, hotel_id).await?;
    Ok(rows + root.len() as u64)
}

/// Soft-delete the caller's live reviews, optionally only for one hotel.
pub async fn delete_reviews_by_author(
    pool: &PgPool,
    user_id: Uuid,
    hotel_id: Option<Uuid>,
) -> Result<u64> {
    let at = Utc::now();
    let mut tx = pool.begin().await?;
    let removed: Vec<(Uuid, Uuid)> = sqlx::query_as(
        r#"
        UPDATE reviews SET deleted_at = $3
        WHERE user_id = $1 AND ($2::uuid IS NULL OR hotel_id = $2) AND deleted_at IS NULL
        RETURNING id, hotel_id
        "#,
    )
    .bind(user_id)
    .bind(hotel_id)
    .bind(at)
    .fetch_all(&mut *tx)
    .await?;
    let reviews: Vec<Uuid> = removed.iter().map(|(id, _)| *id).collect();
    review_tree(&mut *tx, Mode::Delete, &reviews, at).await?;
    tx.commit().await?;

    refresh_ratings(pool, removed.into_iter().map(|(_, hotel)| hotel)).await?;
    Ok(reviews.len() as u64)
}

/// Restore the caller's reviews removed by their most recent deletion.
pub async fn restore_reviews_by_author(
    pool: &PgPool,
    user_id: Uuid,
    hotel_id: Option<Uuid>,
) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let stamp = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        "SELECT MAX(deleted_at) FROM reviews \
         WHERE user_id = $1 AND ($2::uuid IS NULL OR hotel_id = $2)",
    )
    .bind(user_id)
    .bind(hotel_id)
    .fetch_one(&mut *tx)
    .await?;
    let Some(at) = stamp else {
        return Ok(0);
    };
    let restored: Vec<(Uuid, Uuid)> = sqlx::query_as(
        r#"
        UPDATE reviews SET deleted_at = NULL, updated_at = NOW()
        WHERE user_id = $1 AND ($2::uuid IS NULL OR hotel_id = $2) AND deleted_at = $3
        RETURNING id, hotel_id
        "#,
    )
    .bind(user_id)
    .bind(hotel_id)
    .bind(at)
    .fetch_all(&mut *tx)
    .await?;
    let reviews: Vec<Uuid> = restored.iter().map(|(id, _)| *id).collect();
    review_tree(&mut *tx, Mode::Restore, &reviews, at).await?;
    tx.commit().await?;

    refresh_ratings(pool, restored.into_iter().map(|(_, hotel)| hotel)).await?;
    Ok(reviews.len() as u64)
}

pub async fn delete_replies_of_review(pool: &PgPool, review_id: Uuid) -> Result<u64> {
    let mut conn = pool.acquire().await?;
    review_tree(&mut *conn, Mode::Delete, &[review_id], Utc::now()).await
}

pub async fn restore_replies_of_review(pool: &PgPool, review_id: Uuid) -> Result<u64> {
    let mut conn = pool.acquire().await?;
    let Some(at) = last_stamp(&mut *conn, Table::Replies, "review_id", &[review_id]).await? else {
        return Ok(0);
    };
    review_tree(&mut *conn, Mode::Restore, &[review_id], at).await
}

async fn refresh_ratings<I>(pool: &PgPool, hotels: I) -> Result<()>
where
    I: IntoIterator<Item = Uuid>,
{
    let mut hotels: Vec<Uuid> = hotels.into_iter().collect();
    hotels.sort();
    hotels.dedup();
    for hotel_id in hotels {
        hotel_repo::refresh_rating(pool, hotel_id).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_requires_a_stamp() {
        assert!(matches!(
            deleted_at(None, "Hotel"),
            Err(AppError::Conflict(msg)) if msg == "Hotel is not deleted"
        ));
        let now = Utc::now();
        assert_eq!(deleted_at(Some(now), "Hotel").unwrap(), now);
    }

    #[test]
    fn test_table_names() {
        assert_eq!(Table::BookingDetails.name(), "booking_details");
        assert_eq!(Table::Replies.name(), "replies");
    }
}
