//! PostgreSQL connection pool construction shared by the backend services.
//!
//! A pool is built from a [`DbConfig`], verified with a round trip before it
//! is handed out, and reported to Prometheus every [`METRICS_INTERVAL`].

mod metrics;

pub use metrics::acquire_with_metrics;
use metrics::update_pool_metrics;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info};

/// How often pool gauges are refreshed.
pub const METRICS_INTERVAL: Duration = Duration::from_secs(30);

/// Connection pool settings.
#[derive(Clone)]
pub struct DbConfig {
    /// Label attached to every pool metric
    pub service_name: String,
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Budget for the verification query issued right after connecting
    pub connect_timeout_secs: u64,
    /// Budget for checking a connection out of the pool
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("service_name", &self.service_name)
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("max_lifetime_secs", &self.max_lifetime_secs)
            .finish()
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            service_name: String::from("unknown"),
            database_url: String::new(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_secs: 5,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

fn env_or<T: FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

impl DbConfig {
    /// Build a config for `service_name` pointing at `database_url`.
    ///
    /// Timeouts still honour the `DB_*_SECS` overrides so operators can tune
    /// them without touching the service's own configuration.
    pub fn new(service_name: &str, database_url: &str, max_connections: u32) -> Self {
        let defaults = Self::default();
        Self {
            service_name: service_name.to_string(),
            database_url: database_url.to_string(),
            max_connections,
            min_connections: env_or("DB_MIN_CONNECTIONS", defaults.min_connections)
                .min(max_connections),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", defaults.connect_timeout_secs),
            acquire_timeout_secs: env_or("DB_ACQUIRE_TIMEOUT_SECS", defaults.acquire_timeout_secs),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs),
        }
    }

    /// Read `DATABASE_URL` and the `DB_*` overrides from the environment.
    pub fn from_env(service_name: &str) -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL environment variable not set".to_string())?;
        let max = env_or("DB_MAX_CONNECTIONS", Self::default().max_connections);
        Ok(Self::new(service_name, &database_url, max))
    }

    pub fn log_config(&self) {
        info!(
            service = %self.service_name,
            max_connections = self.max_connections,
            min_connections = self.min_connections,
            connect_timeout_secs = self.connect_timeout_secs,
            acquire_timeout_secs = self.acquire_timeout_secs,
            idle_timeout_secs = self.idle_timeout_secs,
            max_lifetime_secs = self.max_lifetime_secs,
            "Database pool configuration"
        );
    }
}

/// Connect, verify with `SELECT 1`, and start the background metrics task.
pub async fn create_pool(config: DbConfig) -> Result<PgPool, sqlx::Error> {
    debug!(service = %config.service_name, "Creating database pool");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
        .connect(&config.database_url)
        .await?;

    let verify = tokio::time::timeout(
        Duration::from_secs(config.connect_timeout_secs),
        sqlx::query("SELECT 1").execute(&pool),
    )
    .await;

    match verify {
        Ok(Ok(_)) => {
            info!(service = %config.service_name, "Database pool created and verified");
            update_pool_metrics(&pool, &config.service_name);
            spawn_metrics_updater(pool.clone(), config.service_name.clone());
            Ok(pool)
        }
        Ok(Err(e)) => {
            error!(service = %config.service_name, error = %e, "Database verification failed");
            Err(e)
        }
        Err(_) => {
            error!(
                service = %config.service_name,
                timeout_secs = config.connect_timeout_secs,
                "Database verification timed out"
            );
            Err(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Database verification timeout",
            )))
        }
    }
}

fn spawn_metrics_updater(pool: PgPool, service: String) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(METRICS_INTERVAL);
        loop {
            interval.tick().await;
            if pool.is_closed() {
                debug!(service = %service, "Pool closed, stopping metrics updater");
                break;
            }
            update_pool_metrics(&pool, &service);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear_overrides() {
        for key in [
            "DATABASE_URL",
            "DB_MAX_CONNECTIONS",
            "DB_MIN_CONNECTIONS",
            "DB_CONNECT_TIMEOUT_SECS",
            "DB_ACQUIRE_TIMEOUT_SECS",
            "DB_IDLE_TIMEOUT_SECS",
            "DB_MAX_LIFETIME_SECS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_default_config() {
        let config = DbConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.connect_timeout_secs, 5);
        assert_eq!(config.acquire_timeout_secs, 10);
    }

    #[test]
    #[serial_test::serial]
    fn test_from_env_requires_database_url() {
        clear_overrides();
        let err = DbConfig::from_env("booking-service").unwrap_err();
        assert!(err.contains("DATABASE_URL"));
    }

    #[test]
    #[serial_test::serial]
    fn test_from_env_reads_overrides() {
        clear_overrides();
        std::env::set_var("DATABASE_URL", "postgres://localhost/stayhub_test");
        std::env::set_var("DB_MAX_CONNECTIONS", "32");
        std::env::set_var("DB_ACQUIRE_TIMEOUT_SECS", "3");

        let config = DbConfig::from_env("booking-service").unwrap();
        assert_eq!(config.service_name, "booking-service");
        assert_eq!(config.max_connections, 32);
        assert_eq!(config.acquire_timeout_secs, 3);
        assert_eq!(config.idle_timeout_secs, 600);

        clear_overrides();
    }

    #[test]
    #[serial_test::serial]
    fn test_min_connections_capped_by_max() {
        clear_overrides();
        std::env::set_var("DB_MIN_CONNECTIONS", "8");
        let config = DbConfig::new("booking-service", "postgres://localhost/x", 4);
        assert_eq!(config.min_connections, 4);
        clear_overrides();
    }

    #[test]
    #[serial_test::serial]
    fn test_invalid_override_falls_back() {
        clear_overrides();
        std::env::set_var("DB_CONNECT_TIMEOUT_SECS", "soon");
        let config = DbConfig::new("booking-service", "postgres://localhost/x", 5);
        assert_eq!(config.connect_timeout_secs, 5);
        clear_overrides();
    }

    #[test]
    fn test_debug_redacts_url() {
        let config = DbConfig::new("booking-service", "postgres://user:secret@db/app", 5);
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
