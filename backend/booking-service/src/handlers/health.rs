use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Instant;

pub const SERVICE_NAME: &str = "booking-service";

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Liveness probe; never touches the database.
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness probe: 503 until a pooled connection answers `SELECT 1`.
pub async fn readiness_check(pool: web::Data<PgPool>) -> impl Responder {
    let start = Instant::now();
    let outcome = match db_pool::acquire_with_metrics(pool.get_ref(), SERVICE_NAME).await {
        Ok(mut conn) => sqlx::query("SELECT 1").execute(&mut *conn).await.map(|_| ()),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => HttpResponse::Ok().json(ReadinessResponse {
            ready: true,
            database: "healthy",
            latency_ms: Some(start.elapsed().as_millis() as u64),
            error: None,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            HttpResponse::ServiceUnavailable().json(ReadinessResponse {
                ready: false,
                database: "unhealthy",
                latency_ms: None,
                error: Some(e.to_string()),
            })
        }
    }
}
