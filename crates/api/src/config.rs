//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory store when unset
/// - `ORDER_CODE_PREFIX`: ticket code letter (default: `'A'`)
/// - `ORDER_CODE_ATTEMPTS`: tries before giving up on a free code (default: `8`)
/// - `TRACKING_POLL_SECS`: poll interval advertised to tracking pages (default: `15`)
/// - `QUEUE_RESYNC_SECS`: full re-projection interval (default: `30`)
/// - `CATALOG_TTL_SECS`: menu cache lifetime (default: `300`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub code_prefix: char,
    pub code_attempts: u32,
    pub tracking_poll_secs: u64,
    pub queue_resync_secs: u64,
    pub catalog_ttl_secs: u64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from any key lookup; unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            code_prefix: lookup("ORDER_CODE_PREFIX")
                .and_then(|p| p.trim().chars().next())
                .filter(char::is_ascii_alphabetic)
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or(defaults.code_prefix),
            code_attempts: parse_var(&lookup, "ORDER_CODE_ATTEMPTS")
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.code_attempts),
            tracking_poll_secs: parse_var(&lookup, "TRACKING_POLL_SECS")
                .unwrap_or(defaults.tracking_poll_secs),
            queue_resync_secs: parse_var(&lookup, "QUEUE_RESYNC_SECS")
                .filter(|n: &u64| *n > 0)
                .unwrap_or(defaults.queue_resync_secs),
            catalog_ttl_secs: parse_var(&lookup, "CATALOG_TTL_SECS")
                .unwrap_or(defaults.catalog_ttl_secs),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tracking_poll(&self) -> Duration {
        Duration::from_secs(self.tracking_poll_secs)
    }

    pub fn queue_resync(&self) -> Duration {
        Duration::from_secs(self.queue_resync_secs)
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_secs)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            code_prefix: 'A',
            code_attempts: engine::DEFAULT_CODE_ATTEMPTS,
            tracking_poll_secs: 15,
            queue_resync_secs: 30,
            catalog_ttl_secs: 300,
        }
    }
}
