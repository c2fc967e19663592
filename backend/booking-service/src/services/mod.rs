/// Business logic that spans several repositories or needs a transaction
pub mod availability;
pub mod bookings;
pub mod cascade;

pub use bookings::{BookingService, Decision};
