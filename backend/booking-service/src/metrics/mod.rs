//! Prometheus metrics for the booking service.
//!
//! Everything registers with the default registry so the pool gauges from
//! `db-pool` come out of the same `/metrics` scrape.

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::time::Duration;

pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "booking_http_requests_total",
        "HTTP requests by method, route and status",
        &["method", "route", "status"]
    )
    .expect("failed to register booking_http_requests_total")
});

pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "booking_http_request_duration_seconds",
        "HTTP request latency",
        &["method", "route"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("failed to register booking_http_request_duration_seconds")
});

static BOOKINGS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "bookings_created_total",
        "Bookings created (still unpaid)"
    )
    .expect("failed to register bookings_created_total")
});

/// Rejected reservations, by the step that found the clash
static BOOKING_CONFLICTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "booking_conflicts_total",
        "Reservations refused because a room was already taken",
        &["stage"]
    )
    .expect("failed to register booking_conflicts_total")
});

static PAYMENTS_CONFIRMED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "booking_payments_confirmed_total",
        "Payments confirmed by guests"
    )
    .expect("failed to register booking_payments_confirmed_total")
});

static BOOKING_DECISIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "booking_decisions_total",
        "Owner decisions on pending bookings",
        &["decision"]
    )
    .expect("failed to register booking_decisions_total")
});

static CLEANUP_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "unpaid_cleaner_runs_total",
        "Unpaid booking cleanup cycles (success/error)",
        &["status"]
    )
    .expect("failed to register unpaid_cleaner_runs_total")
});

static CLEANUP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "unpaid_cleaner_duration_seconds",
        "Duration of unpaid booking cleanup cycles",
        &["status"],
        vec![0.001, 0.01, 0.1, 0.5, 1.0, 5.0]
    )
    .expect("failed to register unpaid_cleaner_duration_seconds")
});

static EXPIRED_BOOKINGS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "unpaid_bookings_expired_total",
        "Unpaid bookings released after their payment window"
    )
    .expect("failed to register unpaid_bookings_expired_total")
});

pub fn record_booking_created() {
    BOOKINGS_CREATED_TOTAL.inc();
}

pub fn record_conflict(stage: &str) {
    BOOKING_CONFLICTS_TOTAL.with_label_values(&[stage]).inc();
}

pub fn record_payment_confirmed() {
    PAYMENTS_CONFIRMED_TOTAL.inc();
}

pub fn record_decision(decision: &str) {
    BOOKING_DECISIONS_TOTAL.with_label_values(&[decision]).inc();
}

pub fn record_cleanup_run(status: &str, duration: Duration) {
    CLEANUP_RUNS_TOTAL.with_label_values(&[status]).inc();
    CLEANUP_DURATION
        .with_label_values(&[status])
        .observe(duration.as_secs_f64());
}

pub fn record_expired_bookings(count: u64) {
    EXPIRED_BOOKINGS_TOTAL.inc_by(count);
}

/// Render the default registry in the text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub async fn serve_metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(gather_metrics())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_show_up_in_scrape() {
        record_booking_created();
        record_conflict("create");
        record_decision("accepted");

        let text = gather_metrics();
        assert!(text.contains("bookings_created_total"));
        assert!(text.contains("booking_conflicts_total{stage=\"create\"}"));
        assert!(text.contains("booking_decisions_total{decision=\"accepted\"}"));
    }
}
