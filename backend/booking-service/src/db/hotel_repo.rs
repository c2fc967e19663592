/// Hotel repository - lookups, search filters and writes
use crate::models::{Hotel, HotelBookingCount, HotelPatch, NewHotel};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

macro_rules! hotel_columns {
    () => {
        "id, name, address, city, nation, hotline, email, description, room_total, parking_slot, \
         bathrooms, amenities, safety_hygiene, check_in, check_out, guests, price, rating, \
         created_by, created_at, updated_at, deleted_at"
    };
}

/// Selection applied by hotel listings.
#[derive(Debug, Clone)]
pub enum HotelFilter<'a> {
    All,
    Owner(Uuid),
    NameLike(&'a str),
    AddressLike(&'a str),
    CityLike(&'a str),
    NationLike(&'a str),
    Price {
        min: f64,
        max: f64,
        city: Option<&'a str>,
    },
    MinRating(f64),
    MinGuests(i32),
    AmenitiesLike(&'a str),
    SafetyHygieneLike(&'a str),
}

/// Escape LIKE wildcards so user input matches literally.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

impl<'a> HotelFilter<'a> {
    fn push_where(&self, qb: &mut QueryBuilder<'a, Postgres>) {
        match self {
            HotelFilter::All => {}
            HotelFilter::Owner(owner) => {
                qb.push(" AND created_by = ").push_bind(*owner);
            }
            HotelFilter::NameLike(term) => push_like(qb, "name", term),
            HotelFilter::AddressLike(term) => push_like(qb, "address", term),
            HotelFilter::CityLike(term) => push_like(qb, "city", term),
            HotelFilter::NationLike(term) => push_like(qb, "nation", term),
            HotelFilter::Price { min, max, city } => {
                qb.push(" AND price BETWEEN ")
                    .push_bind(*min)
                    .push(" AND ")
                    .push_bind(*max);
                if let Some(city) = city {
                    push_like(qb, "city", city);
                }
            }
            HotelFilter::MinRating(rating) => {
                qb.push(" AND rating >= ").push_bind(*rating);
            }
            HotelFilter::MinGuests(guests) => {
                qb.push(" AND guests >= ").push_bind(*guests);
            }
            HotelFilter::AmenitiesLike(term) => push_like(qb, "amenities", term),
            HotelFilter::SafetyHygieneLike(term) => push_like(qb, "safety_hygiene", term),
        }
    }

    fn order_by(&self) -> &'static str {
        match self {
            HotelFilter::All | HotelFilter::Owner(_) => "created_at DESC",
            HotelFilter::NameLike(_) => "name ASC",
            HotelFilter::AddressLike(_) => "address ASC",
            HotelFilter::CityLike(_) => "city ASC",
            HotelFilter::NationLike(_) => "nation ASC",
            HotelFilter::Price { .. } => "price ASC",
            HotelFilter::MinRating(_) => "rating ASC",
            HotelFilter::MinGuests(_) => "guests ASC",
            HotelFilter::AmenitiesLike(_) => "amenities ASC",
            HotelFilter::SafetyHygieneLike(_) => "safety_hygiene ASC",
        }
    }
}

fn push_like<'a>(qb: &mut QueryBuilder<'a, Postgres>, column: &'static str, term: &str) {
    qb.push(" AND ")
        .push(column)
        .push(" ILIKE ")
        .push_bind(like_pattern(term));
}

pub async fn list(
    pool: &PgPool,
    filter: &HotelFilter<'_>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Hotel>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(concat!(
        "SELECT ",
        hotel_columns!(),
        " FROM hotels WHERE deleted_at IS NULL"
    ));
    filter.push_where(&mut qb);
    qb.push(" ORDER BY ")
        .push(filter.order_by())
        .push(", id LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    qb.build_query_as::<Hotel>().fetch_all(pool).await
}

pub async fn count(pool: &PgPool, filter: &HotelFilter<'_>) -> Result<i64, sqlx::Error> {
    let mut qb =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM hotels WHERE deleted_at IS NULL");
    filter.push_where(&mut qb);
    qb.build_query_scalar::<i64>().fetch_one(pool).await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Hotel>, sqlx::Error> {
    sqlx::query_as::<_, Hotel>(concat!(
        "SELECT ",
        hotel_columns!(),
        " FROM hotels WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Lookup that also returns soft-deleted hotels, for restore.
pub async fn find_including_deleted(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Hotel>, sqlx::Error> {
    sqlx::query_as::<_, Hotel>(concat!("SELECT ", hotel_columns!(), " FROM hotels WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Hotel>, sqlx::Error> {
    sqlx::query_as::<_, Hotel>(concat!(
        "SELECT ",
        hotel_columns!(),
        " FROM hotels WHERE id = ANY($1) AND deleted_at IS NULL"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await
}

pub async fn latest(pool: &PgPool, limit: i64) -> Result<Vec<Hotel>, sqlx::Error> {
    sqlx::query_as::<_, Hotel>(concat!(
        "SELECT ",
        hotel_columns!(),
        " FROM hotels WHERE deleted_at IS NULL ORDER BY created_at DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn in_city(pool: &PgPool, city: &str, limit: i64) -> Result<Vec<Hotel>, sqlx::Error> {
    sqlx::query_as::<_, Hotel>(concat!(
        "SELECT ",
        hotel_columns!(),
        " FROM hotels WHERE deleted_at IS NULL AND city ILIKE $1 ORDER BY created_at LIMIT $2"
    ))
    .bind(like_pattern(city))
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Hotels with the most live bookings.
pub async fn top_booked(pool: &PgPool, limit: i64) -> Result<Vec<HotelBookingCount>, sqlx::Error> {
    sqlx::query_as::<_, HotelBookingCount>(
        r#"
        SELECT b.hotel_id, COUNT(*) AS total
        FROM bookings b
        JOIN hotels h ON h.id = b.hotel_id AND h.deleted_at IS NULL
        WHERE b.deleted_at IS NULL
        GROUP BY b.hotel_id
        ORDER BY total DESC, b.hotel_id
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn distinct_cities(pool: &PgPool, limit: i64) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT city FROM (
            SELECT city, COUNT(*) AS hotels
            FROM hotels
            WHERE deleted_at IS NULL
            GROUP BY city
        ) c
        ORDER BY hotels DESC, city
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn hotline_taken(
    pool: &PgPool,
    hotline: &str,
    except: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM hotels
            WHERE hotline = $1 AND deleted_at IS NULL AND ($2::uuid IS NULL OR id <> $2)
        )
        "#,
    )
    .bind(hotline)
    .bind(except)
    .fetch_one(pool)
    .await
}

pub async fn email_taken(
    pool: &PgPool,
    email: &str,
    except: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM hotels
            WHERE lower(email) = lower($1) AND deleted_at IS NULL AND ($2::uuid IS NULL OR id <> $2)
        )
        "#,
    )
    .bind(email)
    .bind(except)
    .fetch_one(pool)
    .await
}

pub async fn create(pool: &PgPool, owner: Uuid, input: &NewHotel) -> Result<Hotel, sqlx::Error> {
    sqlx::query_as::<_, Hotel>(concat!(
        r#"
        INSERT INTO hotels (
            name, address, city, nation, hotline, email, description, room_total,
            parking_slot, bathrooms, amenities, safety_hygiene, check_in, check_out,
            guests, price, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        RETURNING "#,
        hotel_columns!()
    ))
    .bind(&input.name)
    .bind(&input.address)
    .bind(&input.city)
    .bind(&input.nation)
    .bind(&input.hotline)
    .bind(&input.email)
    .bind(&input.description)
    .bind(input.room_total)
    .bind(input.parking_slot)
    .bind(input.bathrooms)
    .bind(&input.amenities)
    .bind(&input.safety_hygiene)
    .bind(&input.check_in)
    .bind(&input.check_out)
    .bind(input.guests)
    .bind(input.price)
    .bind(owner)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    patch: &HotelPatch,
) -> Result<Option<Hotel>, sqlx::Error> {
    sqlx::query_as::<_, Hotel>(concat!(
        r#"
        UPDATE hotels SET
            name = COALESCE($2, name),
            address = COALESCE($3, address),
            city = COALESCE($4, city),
            nation = COALESCE($5, nation),
            hotline = COALESCE($6, hotline),
            email = COALESCE($7, email),
            description = COALESCE($8, description),
            room_total = COALESCE($9, room_total),
            parking_slot = COALESCE($10, parking_slot),
            bathrooms = COALESCE($11, bathrooms),
            amenities = COALESCE($12, amenities),
            safety_hygiene = COALESCE($13, safety_hygiene),
            check_in = COALESCE($14, check_in),
            check_out = COALESCE($15, check_out),
            guests = COALESCE($16, guests),
            price = COALESCE($17, price),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING "#,
        hotel_columns!()
    ))
    .bind(id)
    .bind(&patch.name)
    .bind(&patch.address)
    .bind(&patch.city)
    .bind(&patch.nation)
    .bind(&patch.hotline)
    .bind(&patch.email)
    .bind(&patch.description)
    .bind(patch.room_total)
    .bind(patch.parking_slot)
    .bind(patch.bathrooms)
    .bind(&patch.amenities)
    .bind(&patch.safety_hygiene)
    .bind(&patch.check_in)
    .bind(&patch.check_out)
    .bind(patch.guests)
    .bind(patch.price)
    .fetch_optional(pool)
    .await
}

/// Recompute the average rating from live reviews.
pub async fn refresh_rating(pool: &PgPool, hotel_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE hotels SET
            rating = COALESCE((
                SELECT ROUND(AVG(rating)::numeric, 1)::float8
                FROM reviews
                WHERE hotel_id = $1 AND deleted_at IS NULL
            ), 0),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(hotel_id)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Da Nang"), "%Da Nang%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_filter_sql() {
        let filter = HotelFilter::Price {
            min: 10.0,
            max: 90.0,
            city: Some("Hue"),
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM hotels WHERE deleted_at IS NULL");
        filter.push_where(&mut qb);
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM hotels WHERE deleted_at IS NULL AND price BETWEEN $1 AND $2 AND city ILIKE $3"
        );
        assert_eq!(filter.order_by(), "price ASC");
    }
}
