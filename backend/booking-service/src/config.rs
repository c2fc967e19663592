use serde::{Deserialize, Serialize};

/// Secret used when nothing is configured. Rejected in production.
pub const DEV_JWT_SECRET: &str = "development-secret-change-in-production";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub booking: BookingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_secs: i64,
}

/// Reservation rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Longest stay accepted by search and booking, in nights
    pub max_stay_nights: i64,
    /// Age after which an unpaid booking is released
    pub unpaid_ttl_secs: u64,
    pub cleanup_interval_secs: u64,
    /// Checkout link handed out with every new payment row
    pub payment_qr_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig {
                env: "development".to_string(),
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/stayhub".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: DEV_JWT_SECRET.to_string(),
                expiry_secs: 24 * 60 * 60,
            },
            booking: BookingConfig::default(),
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            max_stay_nights: 7,
            unpaid_ttl_secs: 3600,
            cleanup_interval_secs: 60,
            payment_qr_url: "https://buy.stripe.com/test_dR6g1ucrc6zWf7ybIL".to_string(),
        }
    }
}

impl Config {
    /// Load `.env`, then layer `BOOKING__SECTION__KEY` variables over the
    /// defaults. `DATABASE_URL`, `JWT_SECRET` and `APP_ENV` win over both.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(
                config::Environment::with_prefix("BOOKING")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("app.env", std::env::var("APP_ENV").ok())?
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.is_production() && self.jwt.secret == DEV_JWT_SECRET {
            anyhow::bail!("JWT_SECRET must be set in production");
        }
        if self.booking.max_stay_nights < 1 {
            anyhow::bail!("booking.max_stay_nights must be at least 1");
        }
        if self.jwt.expiry_secs <= 0 {
            anyhow::bail!("jwt.expiry_secs must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "DATABASE_URL",
        "JWT_SECRET",
        "APP_ENV",
        "BOOKING__BOOKING__MAX_STAY_NIGHTS",
        "BOOKING__APP__PORT",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();
        assert_eq!(config.booking.max_stay_nights, 7);
        assert_eq!(config.booking.unpaid_ttl_secs, 3600);
        assert_eq!(config.booking.cleanup_interval_secs, 60);
        assert!(!config.is_production());
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://db/override");
        std::env::set_var("BOOKING__BOOKING__MAX_STAY_NIGHTS", "14");
        std::env::set_var("BOOKING__APP__PORT", "9090");

        let config = Config::from_env().unwrap();
        assert_eq!(config.database.url, "postgres://db/override");
        assert_eq!(config.booking.max_stay_nights, 14);
        assert_eq!(config.app.port, 9090);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_production_requires_secret() {
        clear_env();
        std::env::set_var("APP_ENV", "production");
        assert!(Config::from_env().is_err());

        std::env::set_var("JWT_SECRET", "a-real-secret");
        let config = Config::from_env().unwrap();
        assert!(config.is_production());

        clear_env();
    }
}
