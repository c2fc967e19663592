//! Unpaid Booking Cleaner
//!
//! Releases bookings that were never paid. A booking created more than
//! `unpaid_ttl_secs` ago that is still `unpaid` is soft-deleted together with
//! its details and payment row, freeing the rooms it named.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use sqlx::PgPool;
use std::time::{Duration, Instant};
use tokio::time::{interval, MissedTickBehavior};

use crate::config::BookingConfig;
use crate::db::booking_repo;
use crate::error::Result;
use crate::metrics;
use crate::services::cascade;

pub async fn start_unpaid_booking_cleaner(db: PgPool, settings: BookingConfig) {
    tracing::info!(
        "Starting unpaid booking cleaner (check_interval={}s, ttl={}s)",
        settings.cleanup_interval_secs,
        settings.unpaid_ttl_secs
    );

    let mut ticker = interval(Duration::from_secs(settings.cleanup_interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let cycle_start = Instant::now();

        match release_expired(&db, cutoff(Utc::now(), settings.unpaid_ttl_secs)).await {
            Ok(released) => {
                metrics::record_cleanup_run("success", cycle_start.elapsed());
                if released > 0 {
                    metrics::record_expired_bookings(released);
                    tracing::info!(
                        released,
                        duration_ms = cycle_start.elapsed().as_millis(),
                        "Released unpaid bookings"
                    );
                }
            }
            Err(e) => {
                metrics::record_cleanup_run("error", cycle_start.elapsed());
                tracing::error!(
                    error = %e,
                    duration_ms = cycle_start.elapsed().as_millis(),
                    "Unpaid booking cleanup failed"
                );
            }
        }
    }
}

/// Bookings placed before this instant have used up their payment window.
/// A window too large to represent reaches back to the earliest instant.
fn cutoff(now: DateTime<Utc>, ttl_secs: u64) -> DateTime<Utc> {
    i64::try_from(ttl_secs)
        .ok()
        .and_then(ChronoDuration::try_seconds)
        .and_then(|ttl| now.checked_sub_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// One cleanup pass. A booking that fails to expire is logged and skipped so
/// the rest of the batch still goes through.
async fn release_expired(db: &PgPool, cutoff: DateTime<Utc>) -> Result<u64> {
    let expired = booking_repo::expired_unpaid(db, cutoff).await?;
    if expired.is_empty() {
        tracing::debug!("No unpaid bookings past their window");
        return Ok(0);
    }

    let mut released = 0;
    for booking_id in expired {
        match cascade::expire_unpaid_booking(db, booking_id).await {
            Ok(true) => {
                released += 1;
                tracing::info!(
                    target: "notifications",
                    booking_id = %booking_id,
                    "booking released because it was not paid in time"
                );
            }
            // paid or removed since the scan
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(booking_id = %booking_id, error = %e, "Failed to release booking");
            }
        }
    }
    Ok(released)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cutoff_subtracts_ttl() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(
            cutoff(now, 3600),
            Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap()
        );
        assert_eq!(cutoff(now, 0), now);
    }

    #[test]
    fn test_cutoff_with_oversized_ttl() {
        let now = Utc::now();
        assert_eq!(cutoff(now, u64::MAX), DateTime::<Utc>::MIN_UTC);
        assert_eq!(cutoff(now, (i64::MAX / 1000) as u64), DateTime::<Utc>::MIN_UTC);
    }
}
