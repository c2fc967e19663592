/// Payment repository
use crate::models::Payment;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

macro_rules! payment_columns {
    () => {
        "id, booking_id, first_name, last_name, email, phone, qr_code_url, payment_status, \
         total_amount, discount, created_at, updated_at, deleted_at"
    };
}

/// Payer details supplied when confirming a payment.
#[derive(Debug, Clone, Default)]
pub struct Payer<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
}

pub async fn insert(
    conn: &mut PgConnection,
    booking_id: Uuid,
    total_amount: f64,
    qr_code_url: &str,
) -> Result<Payment, sqlx::Error> {
    sqlx::query_as::<_, Payment>(concat!(
        "INSERT INTO payments (booking_id, qr_code_url, payment_status, total_amount, discount) \
         VALUES ($1, $2, FALSE, $3, 0) RETURNING ",
        payment_columns!()
    ))
    .bind(booking_id)
    .bind(qr_code_url)
    .bind(total_amount)
    .fetch_one(conn)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(concat!(
        "SELECT ",
        payment_columns!(),
        " FROM payments WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_booking(
    pool: &PgPool,
    booking_id: Uuid,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(concat!(
        "SELECT ",
        payment_columns!(),
        " FROM payments WHERE booking_id = $1 AND deleted_at IS NULL"
    ))
    .bind(booking_id)
    .fetch_optional(pool)
    .await
}

pub async fn lock_by_booking(
    conn: &mut PgConnection,
    booking_id: Uuid,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(concat!(
        "SELECT ",
        payment_columns!(),
        " FROM payments WHERE booking_id = $1 AND deleted_at IS NULL FOR UPDATE"
    ))
    .bind(booking_id)
    .fetch_optional(conn)
    .await
}

pub async fn record(
    conn: &mut PgConnection,
    id: Uuid,
    paid: bool,
    payer: &Payer<'_>,
) -> Result<Payment, sqlx::Error> {
    sqlx::query_as::<_, Payment>(concat!(
        r#"
        UPDATE payments SET
            payment_status = $2,
            first_name = COALESCE($3, first_name),
            last_name = COALESCE($4, last_name),
            email = COALESCE($5, email),
            phone = COALESCE($6, phone),
            updated_at = NOW()
        WHERE id = $1
        RETURNING "#,
        payment_columns!()
    ))
    .bind(id)
    .bind(paid)
    .bind(payer.first_name)
    .bind(payer.last_name)
    .bind(payer.email)
    .bind(payer.phone)
    .fetch_one(conn)
    .await
}

pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE payments SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}
