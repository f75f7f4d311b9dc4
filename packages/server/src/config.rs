use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use scout::ScoutConfig;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub scout: ScoutConfig,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{key} must be a valid number")),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = ScoutConfig::default();
        let scout = ScoutConfig {
            min_score: env_parse("FILTER_MIN_SCORE", defaults.min_score)?,
            pace_delay_ms: env_parse("PACE_DELAY_MS", defaults.pace_delay_ms)?,
            nav_timeout_ms: env_parse("NAV_TIMEOUT_MS", defaults.nav_timeout_ms)?,
            settle_delay_ms: env_parse("SETTLE_DELAY_MS", defaults.settle_delay_ms)?,
            outbound_endpoint: env::var("OUTBOUND_ENDPOINT").ok(),
            outbound_timeout_secs: env_parse("OUTBOUND_TIMEOUT_SECS", defaults.outbound_timeout_secs)?,
            outbound_max_retries: env_parse("OUTBOUND_MAX_RETRIES", defaults.outbound_max_retries)?,
            heartbeat_secs: env_parse("HEARTBEAT_SECS", defaults.heartbeat_secs)?,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env_parse("PORT", 8000)?,
            scout,
        })
    }
}
