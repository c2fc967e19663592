use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use booking_service::services::BookingService;
use booking_service::{db, jobs, middleware, routes, security::jwt, Config};
use db_pool::{create_pool, DbConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE_NAME: &str = "booking-service";

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting {} v{}", SERVICE_NAME, env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    jwt::initialize_secret(&config.jwt.secret, config.jwt.expiry_secs)
        .context("Failed to initialize JWT secret")?;

    let db_config = DbConfig::new(
        SERVICE_NAME,
        &config.database.url,
        config.database.max_connections,
    );
    db_config.log_config();
    let pool = create_pool(db_config)
        .await
        .context("Failed to create database pool")?;

    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations completed");

    tokio::spawn(jobs::start_unpaid_booking_cleaner(
        pool.clone(),
        config.booking.clone(),
    ));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server on {}", bind_address);

    let pool_data = web::Data::new(pool.clone());
    let config_data = web::Data::new(config.clone());
    let booking_data = web::Data::new(BookingService::new(pool, config.booking.clone()));

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(pool_data.clone())
            .app_data(config_data.clone())
            .app_data(booking_data.clone())
            .wrap(middleware::JwtAuthMiddleware)
            .wrap(middleware::MetricsMiddleware)
            .wrap(tracing_actix_web::TracingLogger::default())
            .wrap(cors)
            .configure(routes::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await?;

    Ok(())
}
