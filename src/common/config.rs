use std::{str::FromStr, time::Duration};

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Knobs of the order-time allocator and charge assembly.
#[derive(Debug, Clone)]
pub struct OrderingConfig {
    /// `max_orders` given to capacity rows created on first booking.
    pub default_max_orders: i32,
    /// Floor of an order's required lead time.
    pub min_lead_time_hours: i32,
    pub cod_fee: f64,
    /// Base delivery charge used when the pincode maps to no zone.
    pub default_delivery_charge: f64,
    pub post_order_task_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ServicesConfig {
    pub file_service_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub ordering: OrderingConfig,
    pub services: ServicesConfig,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            default_max_orders: 10,
            min_lead_time_hours: 2,
            cod_fee: 0.0,
            default_delivery_charge: 0.0,
            post_order_task_timeout: Duration::from_secs(5),
        }
    }
}

impl OrderingConfig {
    /// Rejects knobs the capacity stores cannot honour. A lazily created
    /// capacity row must be able to hold the booking that creates it.
    pub fn validate(self) -> Result<Self> {
        anyhow::ensure!(
            self.default_max_orders >= 1,
            "DEFAULT_MAX_ORDERS must be at least 1, got {}",
            self.default_max_orders
        );
        anyhow::ensure!(
            self.min_lead_time_hours >= 0,
            "MIN_LEAD_TIME_HOURS must not be negative, got {}",
            self.min_lead_time_hours
        );
        Ok(self)
    }
}

/// Reads the configuration from the process environment. Call after
/// `bootstrap::init_env` so `.env` values are visible.
pub fn load() -> Result<AppConfig> {
    let defaults = OrderingConfig::default();

    Ok(AppConfig {
        database: DatabaseConfig {
            url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10)?,
        },
        server: ServerConfig {
            host: env_or("SERVER_HOST", "0.0.0.0".to_string())?,
            port: env_or("SERVER_PORT", 3000)?,
        },
        ordering: OrderingConfig {
            default_max_orders: env_or("DEFAULT_MAX_ORDERS", defaults.default_max_orders)?,
            min_lead_time_hours: env_or("MIN_LEAD_TIME_HOURS", defaults.min_lead_time_hours)?,
            cod_fee: env_or("COD_FEE", defaults.cod_fee)?,
            default_delivery_charge: env_or(
                "DEFAULT_DELIVERY_CHARGE",
                defaults.default_delivery_charge,
            )?,
            post_order_task_timeout: Duration::from_secs(env_or(
                "POST_ORDER_TASK_TIMEOUT_SECS",
                defaults.post_order_task_timeout.as_secs(),
            )?),
        }
        .validate()?,
        services: ServicesConfig {
            file_service_url: env_or(
                "FILE_SERVICE_URL",
                "http://localhost:3000/file-service".to_string(),
            )?,
        },
    })
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}
