//! Runtime settings read from the environment.
//!
//! `.env` is loaded by `main` before [`Settings::from_env`] runs, so every value can
//! come from either place. Unset values fall back to the defaults below.

use super::database::DEFAULT_DATABASE_URL;
use crate::core::record::normalize_currency;
use crate::errors::{Error, Result};
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_BASE_CURRENCY: &str = "USD";
const DEFAULT_RATE_API_URL: &str = "https://api.currencylayer.com/live";
const DEFAULT_RATE_SOURCE: &str = "USD";
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3600;
const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Service settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// SeaORM connection string
    pub database_url: String,
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,
    /// Currency reports are converted into
    pub base_currency: String,
    /// Endpoint of the external rate API
    pub rate_api_url: String,
    /// Access key for the rate API; `None` disables outbound fetches
    pub rate_api_key: Option<String>,
    /// Currency the rate API quotes from
    pub rate_source_currency: String,
    /// How often the scheduler checks whether a monthly refresh is due
    pub rate_refresh_interval: Duration,
    /// Path of config.toml
    pub config_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            rate_api_url: DEFAULT_RATE_API_URL.to_string(),
            rate_api_key: None,
            rate_source_currency: DEFAULT_RATE_SOURCE.to_string(),
            rate_refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            config_path: DEFAULT_CONFIG_PATH.to_string(),
        }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bind_addr = get("BIND_ADDR", DEFAULT_BIND_ADDR)
            .parse()
            .map_err(|e| Error::Config {
                message: format!("Invalid BIND_ADDR: {e}"),
            })?;

        let interval_secs: u64 = get(
            "RATE_REFRESH_INTERVAL_SECS",
            &DEFAULT_REFRESH_INTERVAL_SECS.to_string(),
        )
        .parse()
        .map_err(|e| Error::Config {
            message: format!("Invalid RATE_REFRESH_INTERVAL_SECS: {e}"),
        })?;
        if interval_secs == 0 {
            return Err(Error::Config {
                message: "RATE_REFRESH_INTERVAL_SECS must be greater than zero".to_string(),
            });
        }

        let base_currency =
            currency_setting("BASE_CURRENCY", &get("BASE_CURRENCY", DEFAULT_BASE_CURRENCY))?;
        let rate_source_currency = currency_setting(
            "RATE_SOURCE_CURRENCY",
            &get("RATE_SOURCE_CURRENCY", DEFAULT_RATE_SOURCE),
        )?;

        Ok(Self {
            database_url: get("DATABASE_URL", DEFAULT_DATABASE_URL),
            bind_addr,
            base_currency,
            rate_api_url: get("RATE_API_URL", DEFAULT_RATE_API_URL),
            rate_api_key: lookup("RATE_API_KEY").filter(|v| !v.trim().is_empty()),
            rate_source_currency,
            rate_refresh_interval: Duration::from_secs(interval_secs),
            config_path: get("CONFIG_PATH", DEFAULT_CONFIG_PATH),
        })
    }
}

/// Upper-cases a currency setting, rejecting anything but a three-letter code.
fn currency_setting(name: &str, value: &str) -> Result<String> {
    normalize_currency(value).map_err(|_| Error::Config {
        message: format!("Invalid {name}: expected a three-letter currency code, got {value:?}"),
    })
}
