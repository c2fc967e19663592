/// Booking service - reservation, payment confirmation and host decisions
use crate::config::BookingConfig;
use crate::db::image_repo::{self, ImageKind};
use crate::db::payment_repo::{self, Payer};
use crate::db::{booking_repo, category_repo, hotel_repo};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::middleware::permissions;
use crate::middleware::AuthUser;
use crate::models::{
    BookedCategory, Booking, BookingDetail, BookingReceipt, BookingStatus, NewBooking, Payment,
    ReservedRange,
};
use crate::services::availability::{quote, stay_nights};
use crate::services::cascade;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// Host decision on a pending booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    fn status(self) -> BookingStatus {
        match self {
            Decision::Accept => BookingStatus::Accepted,
            Decision::Reject => BookingStatus::Rejected,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Decision::Accept => "accepted",
            Decision::Reject => "rejected",
        }
    }
}

/// Rooms reserved more than once in `ranges`, sorted.
pub fn conflicting_rooms(ranges: &[ReservedRange]) -> Vec<Uuid> {
    ranges
        .iter()
        .map(|r| r.room_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn conflict_error(rooms: &[Uuid]) -> AppError {
    let ids: Vec<String> = rooms.iter().map(Uuid::to_string).collect();
    AppError::Conflict(format!(
        "Rooms already booked for these dates: {}",
        ids.join(", ")
    ))
}

pub struct BookingService {
    pool: PgPool,
    settings: BookingConfig,
}

impl BookingService {
    pub fn new(pool: PgPool, settings: BookingConfig) -> Self {
        Self { pool, settings }
    }

    /// Reserve rooms for the caller. Rooms are locked for the duration of
    /// the transaction so concurrent reservations serialize on them.
    pub async fn create(&self, user: &AuthUser, input: &NewBooking) -> Result<BookingReceipt> {
        permissions::require_guest(user)?;
        if input.room_count < 1 || input.room_count as usize > input.room_ids.len() {
            return Err(AppError::BadRequest(
                "room_count must be between 1 and the number of room_ids".to_string(),
            ));
        }
        let nights = stay_nights(input.date_in, input.date_out, self.settings.max_stay_nights)?;
        hotel_repo::find_by_id(&self.pool, input.hotel_id)
            .await?
            .ok_or_else(|| AppError::not_found("Hotel"))?;

        let chosen = input.chosen_rooms();
        let unique: BTreeSet<Uuid> = chosen.iter().copied().collect();
        if unique.len() != chosen.len() {
            return Err(AppError::BadRequest(
                "room_ids must not repeat a room".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let locked = booking_repo::lock_rooms(&mut *tx, input.hotel_id, chosen).await?;
        if let Some(missing) = chosen
            .iter()
            .find(|id| !locked.iter().any(|room| room.room_id == **id))
        {
            return Err(AppError::BadRequest(format!(
                "Room {} does not belong to this hotel",
                missing
            )));
        }

        let blocking =
            booking_repo::blocking_details(&mut *tx, chosen, input.date_in, input.date_out, None)
                .await?;
        if !blocking.is_empty() {
            metrics::record_conflict("create");
            return Err(conflict_error(&conflicting_rooms(&blocking)));
        }

        let total = quote(locked.iter().map(|room| room.price), nights);
        let booking = booking_repo::insert_booking(
            &mut *tx,
            user.id,
            input.hotel_id,
            input.date_in,
            input.date_out,
            input.room_count,
            total,
        )
        .await?;

        let mut details = Vec::with_capacity(chosen.len());
        for room_id in chosen {
            details.push(booking_repo::insert_detail(&mut *tx, &booking, *room_id).await?);
        }

        let payment =
            payment_repo::insert(&mut *tx, booking.id, total, &self.settings.payment_qr_url)
                .await?;

        tx.commit().await?;

        metrics::record_booking_created();
        tracing::info!(
            booking_id = %booking.id,
            user_id = %user.id,
            hotel_id = %booking.hotel_id,
            rooms = details.len(),
            total,
            "booking created"
        );

        let category_ids: Vec<Uuid> = locked
            .iter()
            .map(|room| room.category_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let categories = self.booked_categories(&category_ids).await?;

        Ok(BookingReceipt {
            booking,
            details,
            payment,
            categories,
        })
    }

    async fn booked_categories(&self, category_ids: &[Uuid]) -> Result<Vec<BookedCategory>> {
        let categories = category_repo::find_by_ids(&self.pool, category_ids).await?;
        let images = image_repo::for_owners(&self.pool, ImageKind::Category, category_ids).await?;
        let mut by_category: HashMap<Uuid, Vec<_>> = HashMap::new();
        for image in images {
            by_category.entry(image.owner_id).or_default().push(image);
        }
        Ok(categories
            .into_iter()
            .map(|category| BookedCategory {
                images: by_category.remove(&category.id).unwrap_or_default(),
                category,
            })
            .collect())
    }

    /// Full receipt for an existing booking.
    pub async fn receipt(&self, booking: Booking) -> Result<BookingReceipt> {
        let details = booking_repo::details_for_booking(&self.pool, booking.id).await?;
        let payment = payment_repo::find_by_booking(&self.pool, booking.id)
            .await?
            .ok_or_else(|| AppError::not_found("Payment"))?;
        let category_ids: Vec<Uuid> = category_repo::for_booking(&self.pool, booking.id)
            .await?
            .into_iter()
            .map(|category| category.id)
            .collect();
        let categories = self.booked_categories(&category_ids).await?;
        Ok(BookingReceipt {
            booking,
            details,
            payment,
            categories,
        })
    }

    /// Record the guest's payment. The first guest to pay for a room wins:
    /// the booking's rooms are locked, the check for blocking details is
    /// repeated, and other unpaid reservations of the same rooms are dropped.
    pub async fn confirm_payment(
        &self,
        user: &AuthUser,
        booking_id: Uuid,
        paid: bool,
        payer: &Payer<'_>,
    ) -> Result<Payment> {
        let booking = booking_repo::find_by_id(&self.pool, booking_id)
            .await?
            .ok_or_else(|| AppError::not_found("Booking"))?;
        permissions::check_booking_owner(user, &booking)?;

        let mut tx = self.pool.begin().await?;

        let booking = booking_repo::lock_booking(&mut *tx, booking_id)
            .await?
            .ok_or_else(|| AppError::not_found("Booking"))?;
        let payment = payment_repo::lock_by_booking(&mut *tx, booking_id)
            .await?
            .ok_or_else(|| AppError::not_found("Payment"))?;
        if payment.payment_status {
            return Err(AppError::Conflict("Booking is already paid".to_string()));
        }

        if !paid {
            let payment = payment_repo::record(&mut *tx, payment.id, false, payer).await?;
            tx.commit().await?;
            return Ok(payment);
        }

        let details = booking_repo::details_for_booking(&mut *tx, booking_id).await?;
        let rooms: Vec<Uuid> = details.iter().map(|detail| detail.room_id).collect();
        booking_repo::lock_room_ids(&mut *tx, &rooms).await?;

        // A payment that committed while we waited for the locks may have
        // dropped some of our details.
        let details = booking_repo::details_for_booking(&mut *tx, booking_id).await?;
        if details.is_empty() || details.len() < booking.room_count.max(1) as usize {
            metrics::record_conflict("payment");
            return Err(AppError::Conflict(
                "The rooms of this booking were paid for by another guest".to_string(),
            ));
        }
        let rooms: Vec<Uuid> = details.iter().map(|detail| detail.room_id).collect();
        let blocking = booking_repo::blocking_details(
            &mut *tx,
            &rooms,
            booking.date_in,
            booking.date_out,
            Some(booking_id),
        )
        .await?;
        if !blocking.is_empty() {
            metrics::record_conflict("payment");
            return Err(conflict_error(&conflicting_rooms(&blocking)));
        }

        let payment = payment_repo::record(&mut *tx, payment.id, true, payer).await?;
        let booking =
            booking_repo::set_status(&mut *tx, booking_id, BookingStatus::Pending, Some(true))
                .await?;
        let dropped = booking_repo::purge_unpaid_overlaps(
            &mut *tx,
            &rooms,
            booking.date_in,
            booking.date_out,
            booking_id,
        )
        .await?;

        tx.commit().await?;

        metrics::record_payment_confirmed();
        tracing::info!(
            booking_id = %booking_id,
            dropped_unpaid_details = dropped,
            "payment confirmed"
        );
        if let Some(hotel) = hotel_repo::find_by_id(&self.pool, booking.hotel_id).await? {
            tracing::info!(
                target: "notifications",
                recipient = %hotel.created_by,
                booking_id = %booking_id,
                hotel_id = %hotel.id,
                "booking awaiting approval"
            );
        }

        Ok(payment)
    }

    /// Bring back a soft-deleted detail. The booking must be live and not
    /// rejected, and a pending or accepted booking must still find the room
    /// free for its dates.
    pub async fn restore_detail(&self, detail: &BookingDetail) -> Result<BookingDetail> {
        if detail.deleted_at.is_none() {
            return Err(AppError::Conflict("Booking detail is not deleted".to_string()));
        }

        let mut tx = self.pool.begin().await?;
        let booking = booking_repo::lock_booking(&mut *tx, detail.booking_id)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("The booking of this detail is deleted".to_string())
            })?;
        if booking.status == BookingStatus::Rejected {
            return Err(AppError::Conflict(
                "Details of a rejected booking cannot be restored".to_string(),
            ));
        }

        booking_repo::lock_room_ids(&mut *tx, &[detail.room_id]).await?;
        if booking.status.blocks_room() {
            let blocking = booking_repo::blocking_details(
                &mut *tx,
                &[detail.room_id],
                detail.date_in,
                detail.date_out,
                Some(booking.id),
            )
            .await?;
            if !blocking.is_empty() {
                metrics::record_conflict("restore");
                return Err(conflict_error(&conflicting_rooms(&blocking)));
            }
        }

        let restored = booking_repo::restore_detail(&mut *tx, detail.id)
            .await?
            .ok_or_else(|| AppError::Conflict("Booking detail is not deleted".to_string()))?;
        tx.commit().await?;

        tracing::info!(
            detail_id = %restored.id,
            booking_id = %booking.id,
            "booking detail restored"
        );
        Ok(restored)
    }

    /// Accept or reject a pending booking on behalf of the hotel owner.
    pub async fn decide(
        &self,
        user: &AuthUser,
        booking_id: Uuid,
        decision: Decision,
    ) -> Result<Booking> {
        permissions::require_hotel_manager(user)?;
        let booking = booking_repo::find_by_id(&self.pool, booking_id)
            .await?
            .ok_or_else(|| AppError::not_found("Booking"))?;
        let hotel = hotel_repo::find_including_deleted(&self.pool, booking.hotel_id)
            .await?
            .ok_or_else(|| AppError::not_found("Hotel"))?;
        permissions::check_hotel_owner(user, &hotel)?;

        let mut tx = self.pool.begin().await?;
        let current = booking_repo::lock_booking(&mut *tx, booking_id)
            .await?
            .ok_or_else(|| AppError::not_found("Booking"))?;
        if !current.status.awaits_decision() {
            return Err(AppError::Conflict(format!(
                "Booking is {}, only pending bookings can be {}",
                current.status,
                decision.as_str()
            )));
        }

        let updated =
            booking_repo::set_status(&mut *tx, booking_id, decision.status(), None).await?;
        if decision == Decision::Reject {
            cascade::delete_details_of_booking(&mut *tx, booking_id, Utc::now()).await?;
        }
        tx.commit().await?;

        metrics::record_decision(decision.as_str());
        tracing::info!(booking_id = %booking_id, status = %updated.status, "booking decided");
        tracing::info!(
            target: "notifications",
            recipient = %updated.user_id,
            booking_id = %booking_id,
            status = %updated.status,
            "booking {}",
            decision.as_str()
        );

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn range(room_id: Uuid) -> ReservedRange {
        ReservedRange {
            room_id,
            booking_id: Uuid::new_v4(),
            date_in: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            date_out: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            status: BookingStatus::Pending,
        }
    }

    #[test]
    fn test_conflicting_rooms_are_unique() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let rooms = conflicting_rooms(&[range(a), range(b), range(a)]);
        assert_eq!(rooms.len(), 2);
        assert!(rooms.contains(&a) && rooms.contains(&b));
    }

    #[test]
    fn test_conflict_error_lists_rooms() {
        let a = Uuid::new_v4();
        match conflict_error(&[a]) {
            AppError::Conflict(msg) => assert!(msg.contains(&a.to_string())),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_decision_targets() {
        assert_eq!(Decision::Accept.status(), BookingStatus::Accepted);
        assert_eq!(Decision::Reject.status(), BookingStatus::Rejected);
        assert_eq!(Decision::Reject.as_str(), "rejected");
    }
}
