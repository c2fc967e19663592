use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use super::{Category, Image};

/// Lifecycle of a booking and of each of its details.
///
/// `Unpaid` holds rooms only softly: any other guest may still book the
/// same rooms until payment is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Unpaid,
    Pending,
    Accepted,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Unpaid => "unpaid",
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
        }
    }

    /// Whether a detail in this state keeps its room from being booked again.
    /// Rejected details are soft-deleted and never block.
    pub fn blocks_room(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Accepted)
    }

    /// Statuses that hold a room, as stored in the `status` column.
    pub fn blocking() -> [BookingStatus; 2] {
        [BookingStatus::Pending, BookingStatus::Accepted]
    }

    /// Awaiting a decision from the hotel owner.
    pub fn awaits_decision(&self) -> bool {
        matches!(self, BookingStatus::Pending)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub hotel_id: Uuid,
    pub date_in: NaiveDate,
    pub date_out: NaiveDate,
    pub room_count: i32,
    pub total_amount: f64,
    pub status: BookingStatus,
    pub is_payment: bool,
    pub date_booking: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// One reserved room inside a booking.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BookingDetail {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub room_id: Uuid,
    pub date_in: NaiveDate,
    pub date_out: NaiveDate,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub qr_code_url: Option<String>,
    pub payment_status: bool,
    pub total_amount: f64,
    pub discount: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Category of a booked room with its pictures.
#[derive(Debug, Clone, Serialize)]
pub struct BookedCategory {
    #[serde(flatten)]
    pub category: Category,
    pub images: Vec<Image>,
}

/// Everything created by a successful reservation.
#[derive(Debug, Clone, Serialize)]
pub struct BookingReceipt {
    pub booking: Booking,
    pub details: Vec<BookingDetail>,
    pub payment: Payment,
    pub categories: Vec<BookedCategory>,
}

/// Row used when checking rooms for conflicts.
#[derive(Debug, Clone, FromRow)]
pub struct ReservedRange {
    pub room_id: Uuid,
    pub booking_id: Uuid,
    pub date_in: NaiveDate,
    pub date_out: NaiveDate,
    pub status: BookingStatus,
}

/// Body of `POST /bookings`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBooking {
    pub hotel_id: Uuid,
    pub date_in: NaiveDate,
    pub date_out: NaiveDate,
    #[validate(range(min = 1))]
    pub room_count: i32,
    #[validate(length(min = 1))]
    pub room_ids: Vec<Uuid>,
}

impl NewBooking {
    /// The rooms actually reserved: the first `room_count` ids.
    pub fn chosen_rooms(&self) -> &[Uuid] {
        let n = (self.room_count.max(0) as usize).min(self.room_ids.len());
        &self.room_ids[..n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_and_accepted_block() {
        assert!(!BookingStatus::Unpaid.blocks_room());
        assert!(BookingStatus::Pending.blocks_room());
        assert!(BookingStatus::Accepted.blocks_room());
        assert!(!BookingStatus::Rejected.blocks_room());
        assert!(BookingStatus::blocking().iter().all(BookingStatus::blocks_room));
    }

    #[test]
    fn test_chosen_rooms_takes_first_room_count() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let body = NewBooking {
            hotel_id: Uuid::new_v4(),
            date_in: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            date_out: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            room_count: 2,
            room_ids: ids.clone(),
        };
        assert_eq!(body.chosen_rooms(), &ids[..2]);
        assert!(body.validate().is_ok());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&BookingStatus::Accepted).unwrap();
        assert_eq!(json, "\"accepted\"");
        let parsed: BookingStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(parsed, BookingStatus::Pending);
    }
}
