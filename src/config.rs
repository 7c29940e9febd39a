use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::domain::geo::DEFAULT_MAX_DELIVERY_KM;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub pool_size: u32,
    pub max_delivery_km: f64,
    pub dispatch_interval: Duration,
    pub dispatch_batch_size: i64,
    pub notification_webhook_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let max_delivery_km: f64 =
            parse_or(&lookup, "MAX_DELIVERY_DISTANCE_KM", DEFAULT_MAX_DELIVERY_KM)?;
        if !(max_delivery_km.is_finite() && max_delivery_km > 0.0) {
            return Err(ConfigError::Invalid {
                name: "MAX_DELIVERY_DISTANCE_KM",
                value: max_delivery_km.to_string(),
            });
        }

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            pool_size: parse_or(&lookup, "DATABASE_POOL_SIZE", 10)?,
            max_delivery_km,
            dispatch_interval: Duration::from_millis(parse_or(&lookup, "DISPATCH_INTERVAL_MS", 2000)?),
            dispatch_batch_size: parse_or(&lookup, "DISPATCH_BATCH_SIZE", 50)?,
            notification_webhook_url: lookup("NOTIFICATION_WEBHOOK_URL").filter(|v| !v.is_empty()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
