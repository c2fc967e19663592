/// Room repository, including the free-room queries used for availability.
use crate::models::Room;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

macro_rules! room_columns {
    () => {
        "id, category_id, name, status, created_at, updated_at, deleted_at"
    };
}

/// Rooms with no live pending or accepted detail overlapping `$2..$3`.
macro_rules! not_blocked {
    () => {
        concat!(
            r#"
        NOT EXISTS (
            SELECT 1 FROM booking_details d
            JOIN bookings b ON b.id = d.booking_id
            WHERE d.room_id = r.id
              AND d.deleted_at IS NULL
              AND b.deleted_at IS NULL
              AND d.date_in <= $3
              AND d.date_out >= $2
              AND b.status IN "#,
            blocking_statuses!(),
            "\n        )\n"
        )
    };
}

pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>(concat!(
        "SELECT ",
        room_columns!(),
        " FROM rooms WHERE deleted_at IS NULL ORDER BY created_at DESC, id LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM rooms WHERE deleted_at IS NULL")
        .fetch_one(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>(concat!(
        "SELECT ",
        room_columns!(),
        " FROM rooms WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_including_deleted(pool: &PgPool, id: Uuid) -> Result<Option<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>(concat!("SELECT ", room_columns!(), " FROM rooms WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_categories(
    pool: &PgPool,
    category_ids: &[Uuid],
) -> Result<Vec<Room>, sqlx::Error> {
    if category_ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, Room>(concat!(
        "SELECT ",
        room_columns!(),
        " FROM rooms WHERE category_id = ANY($1) AND deleted_at IS NULL ORDER BY name"
    ))
    .bind(category_ids)
    .fetch_all(pool)
    .await
}

pub async fn count_by_category(pool: &PgPool, category_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM rooms WHERE category_id = $1 AND deleted_at IS NULL",
    )
    .bind(category_id)
    .fetch_one(pool)
    .await
}

/// Free rooms in live categories of a hotel for the stay `date_in..date_out`.
pub async fn free_in_hotel(
    pool: &PgPool,
    hotel_id: Uuid,
    date_in: NaiveDate,
    date_out: NaiveDate,
) -> Result<Vec<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>(concat!(
        r#"
        SELECT r.id, r.category_id, r.name, r.status, r.created_at, r.updated_at, r.deleted_at
        FROM rooms r
        JOIN categories c ON c.id = r.category_id AND c.deleted_at IS NULL
        WHERE c.hotel_id = $1
          AND r.deleted_at IS NULL
          AND "#,
        not_blocked!(),
        " ORDER BY r.name"
    ))
    .bind(hotel_id)
    .bind(date_in)
    .bind(date_out)
    .fetch_all(pool)
    .await
}

pub async fn free_count_in_category(
    pool: &PgPool,
    category_id: Uuid,
    date_in: NaiveDate,
    date_out: NaiveDate,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(concat!(
        r#"
        SELECT COUNT(*)
        FROM rooms r
        WHERE r.category_id = $1
          AND r.deleted_at IS NULL
          AND "#,
        not_blocked!()
    ))
    .bind(category_id)
    .bind(date_in)
    .bind(date_out)
    .fetch_one(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    category_id: Uuid,
    name: &str,
    status: Option<&str>,
) -> Result<Room, sqlx::Error> {
    sqlx::query_as::<_, Room>(concat!(
        "INSERT INTO rooms (category_id, name, status) \
         VALUES ($1, $2, COALESCE($3, 'available')) RETURNING ",
        room_columns!()
    ))
    .bind(category_id)
    .bind(name)
    .bind(status)
    .fetch_one(pool)
    .await
}

/// Insert `count` rooms named `{prefix} 1..=count` in one transaction.
pub async fn create_many(
    pool: &PgPool,
    category_id: Uuid,
    prefix: &str,
    count: u32,
) -> Result<Vec<Room>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut rooms = Vec::with_capacity(count as usize);
    for n in 1..=count {
        let room = sqlx::query_as::<_, Room>(concat!(
            "INSERT INTO rooms (category_id, name) VALUES ($1, $2) RETURNING ",
            room_columns!()
        ))
        .bind(category_id)
        .bind(format!("{} {}", prefix, n))
        .fetch_one(&mut *tx)
        .await?;
        rooms.push(room);
    }
    tx.commit().await?;
    Ok(rooms)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: Option<&str>,
    status: Option<&str>,
) -> Result<Option<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>(concat!(
        "UPDATE rooms SET name = COALESCE($2, name), status = COALESCE($3, status), \
         updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL RETURNING ",
        room_columns!()
    ))
    .bind(id)
    .bind(name)
    .bind(status)
    .fetch_optional(pool)
    .await
}

pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE rooms SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn restore(pool: &PgPool, id: Uuid) -> Result<Option<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>(concat!(
        "UPDATE rooms SET deleted_at = NULL, updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NOT NULL RETURNING ",
        room_columns!()
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}
