use std::time::Duration;

use crate::error::{AppError, Result};

pub const LIVE_API_URL: &str = "https://openapi.chzzk.naver.com/open/v1/lives";

/// Poll interval (seconds) between the end of one cycle and the start of the next.
pub const POLL_INTERVAL_SECS: u64 = 300;

/// PostgreSQL refuses statements with more bind parameters than this.
pub const PG_BIND_LIMIT: usize = 65_535;

/// Columns written per `live_data` row. Must match `db::writer::LIVE_DATA_COLUMN_LIST`.
pub const LIVE_DATA_COLUMNS: usize = 12;

/// Row cap per INSERT statement, applied on top of the bind ceiling.
/// Keeps statement text and planning cost bounded.
pub const DEFAULT_MAX_BATCH_ROWS: usize = 1000;

/// Request timeout for the listing API (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Connection pool defaults.
pub mod pool_defaults {
    pub const MAX_CONNECTIONS: u32 = 25;
    pub const MIN_CONNECTIONS: u32 = 5;
    pub const MAX_LIFETIME_SECS: u64 = 60 * 60;
    pub const IDLE_TIMEOUT_SECS: u64 = 10 * 60;
}

const REQUIRED_VARS: &[&str] = &[
    "POSTGRES_HOST",
    "POSTGRES_PORT",
    "POSTGRES_USER",
    "POSTGRES_PASSWORD",
    "POSTGRES_DB",
    "CHZZK_CLIENT_ID",
    "CHZZK_SECRET_ID",
];

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// libpq-style sslmode (POSTGRES_SSLMODE), e.g. "disable", "prefer", "require".
    pub ssl_mode: String,
    /// Session `timezone` (POSTGRES_TIMEZONE). Server default when unset.
    pub timezone: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub live_api_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub log_level: String,
    pub db: DbConfig,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    /// Row cap per INSERT (MAX_BATCH_ROWS).
    pub max_batch_rows: usize,
    /// Abort a traversal after this many pages (MAX_PAGES, 0 = unlimited).
    pub max_pages: Option<usize>,
    /// Health API port (API_PORT). The server is not started when unset.
    pub api_port: Option<u16>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|&name| get(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }
        let required = |name: &str| get(name).unwrap_or_default();

        let port = required("POSTGRES_PORT")
            .parse::<u16>()
            .map_err(|_| AppError::Config("POSTGRES_PORT must be a valid port number".to_string()))?;

        let api_port = match get("API_PORT") {
            Some(v) => Some(
                v.parse::<u16>()
                    .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            ),
            None => None,
        };

        let max_batch_rows = parse_or(&get, "MAX_BATCH_ROWS", DEFAULT_MAX_BATCH_ROWS)?;
        if max_batch_rows == 0 {
            return Err(AppError::Config("MAX_BATCH_ROWS must be at least 1".to_string()));
        }

        let max_pages = match parse_or(&get, "MAX_PAGES", 0usize)? {
            0 => None,
            n => Some(n),
        };

        Ok(Self {
            live_api_url: get("LIVE_API_URL").unwrap_or_else(|| LIVE_API_URL.to_string()),
            client_id: required("CHZZK_CLIENT_ID"),
            client_secret: required("CHZZK_SECRET_ID"),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            db: DbConfig {
                host: required("POSTGRES_HOST"),
                port,
                user: required("POSTGRES_USER"),
                password: required("POSTGRES_PASSWORD"),
                database: required("POSTGRES_DB"),
                ssl_mode: get("POSTGRES_SSLMODE").unwrap_or_else(|| "prefer".to_string()),
                timezone: get("POSTGRES_TIMEZONE"),
                max_connections: parse_or(
                    &get,
                    "POSTGRES_MAX_CONNECTIONS",
                    pool_defaults::MAX_CONNECTIONS,
                )?,
                min_connections: parse_or(
                    &get,
                    "POSTGRES_MIN_CONNECTIONS",
                    pool_defaults::MIN_CONNECTIONS,
                )?,
                max_lifetime: Duration::from_secs(parse_or(
                    &get,
                    "POSTGRES_CONN_MAX_LIFETIME_SECS",
                    pool_defaults::MAX_LIFETIME_SECS,
                )?),
                idle_timeout: Duration::from_secs(parse_or(
                    &get,
                    "POSTGRES_CONN_MAX_IDLE_SECS",
                    pool_defaults::IDLE_TIMEOUT_SECS,
                )?),
            },
            poll_interval: Duration::from_secs(parse_or(
                &get,
                "POLL_INTERVAL_SECS",
                POLL_INTERVAL_SECS,
            )?),
            http_timeout: Duration::from_secs(parse_or(&get, "HTTP_TIMEOUT_SECS", HTTP_TIMEOUT_SECS)?),
            max_batch_rows,
            max_pages,
            api_port,
        })
    }
}

fn parse_or<T, G>(get: &G, name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{name} has an invalid value: {v:?}"))),
        None => Ok(default),
    }
}
