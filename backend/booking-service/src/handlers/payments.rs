/// Payment handlers, for the guest who placed the booking.
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{done, ok};
use crate::db::booking_repo;
use crate::db::payment_repo::{self, Payer};
use crate::error::{AppError, Result};
use crate::middleware::{permissions, AuthUser};
use crate::models::Payment;
use crate::services::BookingService;
use crate::validators;

#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmPaymentRequest {
    pub booking_id: Uuid,
    pub payment_status: bool,
    #[validate(length(min = 1, max = 255))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Caller must have placed the booking the payment belongs to.
async fn check_payer(pool: &PgPool, user: &AuthUser, booking_id: Uuid) -> Result<()> {
    permissions::require_guest(user)?;
    let booking = booking_repo::find_by_id(pool, booking_id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking"))?;
    permissions::check_booking_owner(user, &booking)
}

async fn payment_of_booking(pool: &PgPool, booking_id: Uuid) -> Result<Payment> {
    payment_repo::find_by_booking(pool, booking_id)
        .await?
        .ok_or_else(|| AppError::not_found("Payment"))
}

async fn remove_unpaid(pool: &PgPool, payment: &Payment) -> Result<()> {
    if payment.payment_status {
        return Err(AppError::Conflict("A completed payment cannot be deleted".into()));
    }
    payment_repo::soft_delete(pool, payment.id).await?;
    Ok(())
}

/// GET /api/v1/payments/{id}
pub async fn get_payment(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let payment = payment_repo::find_by_id(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Payment"))?;
    check_payer(pool.get_ref(), &user, payment.booking_id).await?;
    Ok(ok("Payment", payment))
}

/// GET /api/v1/bookings/{id}/payment
pub async fn payment_of(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let booking_id = path.into_inner();
    check_payer(pool.get_ref(), &user, booking_id).await?;
    let payment = payment_of_booking(pool.get_ref(), booking_id).await?;
    Ok(ok("Payment", payment))
}

/// PUT /api/v1/payments
pub async fn confirm_payment(
    service: web::Data<BookingService>,
    user: AuthUser,
    req: web::Json<ConfirmPaymentRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    permissions::require_guest(&user)?;
    req.validate()?;
    if let Some(phone) = &req.phone {
        if !validators::validate_phone(phone) {
            return Err(AppError::Validation("Invalid phone number".into()));
        }
    }

    let payer = Payer {
        first_name: req.first_name.as_deref(),
        last_name: req.last_name.as_deref(),
        email: req.email.as_deref(),
        phone: req.phone.as_deref(),
    };
    let payment = service
        .confirm_payment(&user, req.booking_id, req.payment_status, &payer)
        .await?;
    let message = if payment.payment_status {
        "Payment confirmed, waiting for the hotel to approve"
    } else {
        "Payment updated"
    };
    Ok(ok(message, payment))
}

/// DELETE /api/v1/payments/{id}
pub async fn delete_payment(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let payment = payment_repo::find_by_id(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Payment"))?;
    check_payer(pool.get_ref(), &user, payment.booking_id).await?;
    remove_unpaid(pool.get_ref(), &payment).await?;
    Ok(done("Payment deleted"))
}

/// DELETE /api/v1/bookings/{id}/payment
pub async fn delete_payment_of(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let booking_id = path.into_inner();
    check_payer(pool.get_ref(), &user, booking_id).await?;
    let payment = payment_of_booking(pool.get_ref(), booking_id).await?;
    remove_unpaid(pool.get_ref(), &payment).await?;
    Ok(done("Payment deleted"))
}
