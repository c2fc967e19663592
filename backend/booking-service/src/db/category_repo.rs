/// Category repository
use crate::models::{Category, CategoryPatch, NewCategory};
use sqlx::PgPool;
use uuid::Uuid;

macro_rules! category_columns {
    () => {
        "id, hotel_id, name, description, size, bed, bathroom_facilities, amenities, \
         directions_view, price, max_people, is_smoking, created_at, updated_at, deleted_at"
    };
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(concat!(
        "SELECT ",
        category_columns!(),
        " FROM categories WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_including_deleted(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(concat!(
        "SELECT ",
        category_columns!(),
        " FROM categories WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_by_hotel(pool: &PgPool, hotel_id: Uuid) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(concat!(
        "SELECT ",
        category_columns!(),
        " FROM categories WHERE hotel_id = $1 AND deleted_at IS NULL ORDER BY price, name"
    ))
    .bind(hotel_id)
    .fetch_all(pool)
    .await
}

pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Category>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, Category>(concat!(
        "SELECT ",
        category_columns!(),
        " FROM categories WHERE id = ANY($1) ORDER BY name"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await
}

/// Categories of the rooms reserved by a booking.
pub async fn for_booking(pool: &PgPool, booking_id: Uuid) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT DISTINCT c.id, c.hotel_id, c.name, c.description, c.size, c.bed,
               c.bathroom_facilities, c.amenities, c.directions_view, c.price,
               c.max_people, c.is_smoking, c.created_at, c.updated_at, c.deleted_at
        FROM categories c
        JOIN rooms r ON r.category_id = c.id
        JOIN booking_details d ON d.room_id = r.id
        WHERE d.booking_id = $1
        "#,
    )
    .bind(booking_id)
    .fetch_all(pool)
    .await
}

pub async fn create(pool: &PgPool, input: &NewCategory) -> Result<Category, sqlx::Error> {
    sqlx::query_as::<_, Category>(concat!(
        r#"
        INSERT INTO categories (
            hotel_id, name, description, size, bed, bathroom_facilities, amenities,
            directions_view, price, max_people, is_smoking
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING "#,
        category_columns!()
    ))
    .bind(input.hotel_id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.size)
    .bind(input.bed)
    .bind(&input.bathroom_facilities)
    .bind(&input.amenities)
    .bind(&input.directions_view)
    .bind(input.price)
    .bind(input.max_people)
    .bind(input.is_smoking)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    patch: &CategoryPatch,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(concat!(
        r#"
        UPDATE categories SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            size = COALESCE($4, size),
            bed = COALESCE($5, bed),
            bathroom_facilities = COALESCE($6, bathroom_facilities),
            amenities = COALESCE($7, amenities),
            directions_view = COALESCE($8, directions_view),
            price = COALESCE($9, price),
            max_people = COALESCE($10, max_people),
            is_smoking = COALESCE($11, is_smoking),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING "#,
        category_columns!()
    ))
    .bind(id)
    .bind(&patch.name)
    .bind(&patch.description)
    .bind(patch.size)
    .bind(patch.bed)
    .bind(&patch.bathroom_facilities)
    .bind(&patch.amenities)
    .bind(&patch.directions_view)
    .bind(patch.price)
    .bind(patch.max_people)
    .bind(patch.is_smoking)
    .fetch_optional(pool)
    .await
}

pub async fn update_price(
    pool: &PgPool,
    id: Uuid,
    price: f64,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(concat!(
        "UPDATE categories SET price = $2, updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NULL RETURNING ",
        category_columns!()
    ))
    .bind(id)
    .bind(price)
    .fetch_optional(pool)
    .await
}
