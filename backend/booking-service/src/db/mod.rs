/// Database access layer: one repository module per table group, plus
/// embedded migrations.

/// SQL list of the booking statuses that hold a room. Mirrors
/// `BookingStatus::blocking`.
macro_rules! blocking_statuses {
    () => {
        "('pending', 'accepted')"
    };
}

pub mod booking_repo;
pub mod category_repo;
pub mod hotel_repo;
pub mod image_repo;
pub mod payment_repo;
pub mod reply_repo;
pub mod review_repo;
pub mod room_repo;
pub mod user_repo;

use sqlx::migrate::Migrator;
use sqlx::PgPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

#[cfg(test)]
mod tests {
    use crate::models::BookingStatus;

    #[test]
    fn test_blocking_statuses_match_model() {
        let listed: Vec<String> = BookingStatus::blocking()
            .iter()
            .map(|status| format!("'{}'", status.as_str()))
            .collect();
        assert_eq!(blocking_statuses!(), format!("({})", listed.join(", ")));
    }
}
