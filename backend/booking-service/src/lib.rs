/// Booking Service Library
///
/// Hotel marketplace backend: hotels publish room categories and rooms,
/// guests reserve and pay for stays, hotels approve them, and guests review
/// the hotels they stayed at.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `routes`: `/api/v1` route table
/// - `services`: booking workflow, availability and soft-delete cascades
/// - `db`: repositories over PostgreSQL
/// - `jobs`: background release of unpaid bookings
/// - `middleware`: JWT authentication, permission checks and request metrics
/// - `security`: password hashing and token issuing
/// - `error`: error types and HTTP mapping
/// - `config`: configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;
pub mod validators;

pub use config::Config;
pub use error::{AppError, Result};
