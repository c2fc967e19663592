/// Booking and booking-detail repository.
///
/// Functions taking `&mut PgConnection` are meant to run inside the
/// reservation and payment transactions.
use crate::models::{Booking, BookingDetail, BookingStatus, ReservedRange};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

macro_rules! booking_columns {
    () => {
        "id, user_id, hotel_id, date_in, date_out, room_count, total_amount, status, \
         is_payment, date_booking, created_at, updated_at, deleted_at"
    };
}

macro_rules! detail_columns {
    () => {
        "id, booking_id, room_id, date_in, date_out, status, created_at, updated_at, deleted_at"
    };
}

/// Selection applied by booking listings.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub user_id: Option<Uuid>,
    /// Account owning the booked hotel
    pub hotel_owner: Option<Uuid>,
    pub hotel_id: Option<Uuid>,
    pub statuses: Vec<BookingStatus>,
    /// Only stays that ended before this day
    pub ended_before: Option<NaiveDate>,
}

impl BookingFilter {
    fn push_where<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>) {
        if let Some(user_id) = self.user_id {
            qb.push(" AND b.user_id = ").push_bind(user_id);
        }
        if let Some(owner) = self.hotel_owner {
            qb.push(" AND h.created_by = ").push_bind(owner);
        }
        if let Some(hotel_id) = self.hotel_id {
            qb.push(" AND b.hotel_id = ").push_bind(hotel_id);
        }
        if !self.statuses.is_empty() {
            qb.push(" AND b.status IN (");
            let mut values = qb.separated(", ");
            for status in &self.statuses {
                values.push_bind(*status);
            }
            values.push_unseparated(")");
        }
        if let Some(day) = self.ended_before {
            qb.push(" AND b.date_out < ").push_bind(day);
        }
    }
}

const FILTER_FROM: &str =
    " FROM bookings b JOIN hotels h ON h.id = b.hotel_id WHERE b.deleted_at IS NULL";

pub async fn list(
    pool: &PgPool,
    filter: &BookingFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Booking>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT b.id, b.user_id, b.hotel_id, b.date_in, b.date_out, b.room_count, \
         b.total_amount, b.status, b.is_payment, b.date_booking, b.created_at, \
         b.updated_at, b.deleted_at",
    );
    qb.push(FILTER_FROM);
    filter.push_where(&mut qb);
    qb.push(" ORDER BY b.date_booking DESC, b.id LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    qb.build_query_as::<Booking>().fetch_all(pool).await
}

pub async fn count(pool: &PgPool, filter: &BookingFilter) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
    qb.push(FILTER_FROM);
    filter.push_where(&mut qb);
    qb.build_query_scalar::<i64>().fetch_one(pool).await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Booking>, sqlx::Error> {
    sqlx::query_as::<_, Booking>(concat!(
        "SELECT ",
        booking_columns!(),
        " FROM bookings WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_including_deleted(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Booking>, sqlx::Error> {
    sqlx::query_as::<_, Booking>(concat!(
        "SELECT ",
        booking_columns!(),
        " FROM bookings WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Unpaid bookings placed before `cutoff`.
pub async fn expired_unpaid(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id FROM bookings
        WHERE status = 'unpaid' AND deleted_at IS NULL AND date_booking < $1
        ORDER BY date_booking
        "#,
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await
}

/// A room row locked for the duration of a reservation.
#[derive(Debug, Clone, FromRow)]
pub struct LockedRoom {
    pub room_id: Uuid,
    pub category_id: Uuid,
    pub price: f64,
}

/// Lock the live rooms among `room_ids` that belong to live categories of
/// `hotel_id`. Ids not returned are unknown or foreign.
pub async fn lock_rooms(
    conn: &mut PgConnection,
    hotel_id: Uuid,
    room_ids: &[Uuid],
) -> Result<Vec<LockedRoom>, sqlx::Error> {
    sqlx::query_as::<_, LockedRoom>(
        r#"
        SELECT r.id AS room_id, r.category_id, c.price
        FROM rooms r
        JOIN categories c ON c.id = r.category_id
        WHERE r.id = ANY($1)
          AND c.hotel_id = $2
          AND r.deleted_at IS NULL
          AND c.deleted_at IS NULL
        ORDER BY r.id
        FOR UPDATE OF r
        "#,
    )
    .bind(room_ids)
    .bind(hotel_id)
    .fetch_all(conn)
    .await
}

/// Lock rooms by id, deleted rows included, in id order. Payment and
/// restore paths take these locks before re-checking availability.
pub async fn lock_room_ids(
    conn: &mut PgConnection,
    room_ids: &[Uuid],
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM rooms WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(room_ids)
    .fetch_all(conn)
    .await
}

/// Live details on `room_ids` that overlap the stay and whose booking is
/// pending or accepted.
pub async fn blocking_details(
    conn: &mut PgConnection,
    room_ids: &[Uuid],
    date_in: NaiveDate,
    date_out: NaiveDate,
    exclude_booking: Option<Uuid>,
) -> Result<Vec<ReservedRange>, sqlx::Error> {
    sqlx::query_as::<_, ReservedRange>(concat!(
        r#"
        SELECT d.room_id, d.booking_id, d.date_in, d.date_out, b.status
        FROM booking_details d
        JOIN bookings b ON b.id = d.booking_id
        WHERE d.room_id = ANY($1)
          AND d.deleted_at IS NULL
          AND b.deleted_at IS NULL
          AND d.date_in <= $3
          AND d.date_out >= $2
          AND ($4::uuid IS NULL OR d.booking_id <> $4)
          AND b.status IN "#,
        blocking_statuses!()
    ))
    .bind(room_ids)
    .bind(date_in)
    .bind(date_out)
    .bind(exclude_booking)
    .fetch_all(conn)
    .await
}

pub async fn insert_booking(
    conn: &mut PgConnection,
    user_id: Uuid,
    hotel_id: Uuid,
    date_in: NaiveDate,
    date_out: NaiveDate,
    room_count: i32,
    total_amount: f64,
) -> Result<Booking, sqlx::Error> {
    sqlx::query_as::<_, Booking>(concat!(
        r#"
        INSERT INTO bookings (
            user_id, hotel_id, date_in, date_out, room_count, total_amount,
            status, is_payment, date_booking
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, NOW())
        RETURNING "#,
        booking_columns!()
    ))
    .bind(user_id)
    .bind(hotel_id)
    .bind(date_in)
    .bind(date_out)
    .bind(room_count)
    .bind(total_amount)
    .bind(BookingStatus::Unpaid)
    .fetch_one(conn)
    .await
}

pub async fn insert_detail(
    conn: &mut PgConnection,
    booking: &Booking,
    room_id: Uuid,
) -> Result<BookingDetail, sqlx::Error> {
    sqlx::query_as::<_, BookingDetail>(concat!(
        "INSERT INTO booking_details (booking_id, room_id, date_in, date_out, status) \
         VALUES ($1, $2, $3, $4, $5) RETURNING ",
        detail_columns!()
    ))
    .bind(booking.id)
    .bind(room_id)
    .bind(booking.date_in)
    .bind(booking.date_out)
    .bind(booking.status)
    .fetch_one(conn)
    .await
}

pub async fn lock_booking(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<Booking>, sqlx::Error> {
    sqlx::query_as::<_, Booking>(concat!(
        "SELECT ",
        booking_columns!(),
        " FROM bookings WHERE id = $1 AND deleted_at IS NULL FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Move a booking and its live details to `status`.
pub async fn set_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: BookingStatus,
    is_payment: Option<bool>,
) -> Result<Booking, sqlx::Error> {
    let booking = sqlx::query_as::<_, Booking>(concat!(
        "UPDATE bookings SET status = $2, is_payment = COALESCE($3, is_payment), \
         updated_at = NOW() WHERE id = $1 RETURNING ",
        booking_columns!()
    ))
    .bind(id)
    .bind(status)
    .bind(is_payment)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query(
        "UPDATE booking_details SET status = $2, updated_at = NOW() \
         WHERE booking_id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(status)
    .execute(&mut *conn)
    .await?;

    Ok(booking)
}

/// Hard-delete details of other still-unpaid bookings that overlap the stay
/// on `room_ids`.
pub async fn purge_unpaid_overlaps(
    conn: &mut PgConnection,
    room_ids: &[Uuid],
    date_in: NaiveDate,
    date_out: NaiveDate,
    keep_booking: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM booking_details d
        USING bookings b
        WHERE b.id = d.booking_id
          AND b.status = 'unpaid'
          AND d.booking_id <> $4
          AND d.room_id = ANY($1)
          AND d.date_in <= $3
          AND d.date_out >= $2
        "#,
    )
    .bind(room_ids)
    .bind(date_in)
    .bind(date_out)
    .bind(keep_booking)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Live details of a booking. Accepts a pool or an open transaction.
pub async fn details_for_booking<'e>(
    executor: impl PgExecutor<'e>,
    booking_id: Uuid,
) -> Result<Vec<BookingDetail>, sqlx::Error> {
    sqlx::query_as::<_, BookingDetail>(concat!(
        "SELECT ",
        detail_columns!(),
        " FROM booking_details WHERE booking_id = $1 AND deleted_at IS NULL ORDER BY created_at"
    ))
    .bind(booking_id)
    .fetch_all(executor)
    .await
}

pub async fn details_for_room(
    pool: &PgPool,
    room_id: Uuid,
) -> Result<Vec<BookingDetail>, sqlx::Error> {
    sqlx::query_as::<_, BookingDetail>(concat!(
        "SELECT ",
        detail_columns!(),
        " FROM booking_details WHERE room_id = $1 AND deleted_at IS NULL ORDER BY date_in"
    ))
    .bind(room_id)
    .fetch_all(pool)
    .await
}

/// Live details on hotels owned by `owner`, newest first.
pub async fn details_for_owner(
    pool: &PgPool,
    owner: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<BookingDetail>, sqlx::Error> {
    sqlx::query_as::<_, BookingDetail>(
        r#"
        SELECT d.id, d.booking_id, d.room_id, d.date_in, d.date_out, d.status,
               d.created_at, d.updated_at, d.deleted_at
        FROM booking_details d
        JOIN bookings b ON b.id = d.booking_id
        JOIN hotels h ON h.id = b.hotel_id
        WHERE h.created_by = $1 AND d.deleted_at IS NULL
        ORDER BY d.created_at DESC, d.id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(owner)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_details_for_owner(pool: &PgPool, owner: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM booking_details d
        JOIN bookings b ON b.id = d.booking_id
        JOIN hotels h ON h.id = b.hotel_id
        WHERE h.created_by = $1 AND d.deleted_at IS NULL
        "#,
    )
    .bind(owner)
    .fetch_one(pool)
    .await
}

/// Detail by id, deleted rows included.
pub async fn find_detail(pool: &PgPool, id: Uuid) -> Result<Option<BookingDetail>, sqlx::Error> {
    sqlx::query_as::<_, BookingDetail>(concat!(
        "SELECT ",
        detail_columns!(),
        " FROM booking_details WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn soft_delete_detail(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE booking_details SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Clear the deletion stamp of a detail. Callers check availability first,
/// inside the same transaction.
pub async fn restore_detail(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<BookingDetail>, sqlx::Error> {
    sqlx::query_as::<_, BookingDetail>(concat!(
        "UPDATE booking_details SET deleted_at = NULL, updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NOT NULL RETURNING ",
        detail_columns!()
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_sql() {
        let filter = BookingFilter {
            hotel_owner: Some(Uuid::new_v4()),
            statuses: vec![BookingStatus::Accepted, BookingStatus::Rejected],
            ended_before: NaiveDate::from_ymd_opt(2024, 5, 1),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1");
        qb.push(FILTER_FROM);
        filter.push_where(&mut qb);
        assert!(qb
            .sql()
            .ends_with("AND h.created_by = $1 AND b.status IN ($2, $3) AND b.date_out < $4"));
    }

    #[test]
    fn test_empty_filter_adds_nothing() {
        let filter = BookingFilter::default();
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1");
        qb.push(FILTER_FROM);
        filter.push_where(&mut qb);
        assert!(qb.sql().ends_with("WHERE b.deleted_at IS NULL"));
    }
}
