//! Background jobs
pub mod unpaid_booking_cleaner;

pub use unpaid_booking_cleaner::start_unpaid_booking_cleaner;
