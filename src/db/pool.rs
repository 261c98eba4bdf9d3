use std::str::FromStr;

use serde::Serialize;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use tracing::info;

use crate::config::DbConfig;
use crate::error::{AppError, Result};

pub fn connect_options(cfg: &DbConfig) -> Result<PgConnectOptions> {
    let ssl_mode = PgSslMode::from_str(&cfg.ssl_mode)
        .map_err(|_| AppError::Config(format!("POSTGRES_SSLMODE {:?} is not a valid sslmode", cfg.ssl_mode)))?;

    let opts = PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.user)
        .password(&cfg.password)
        .database(&cfg.database)
        .ssl_mode(ssl_mode);

    Ok(match &cfg.timezone {
        Some(tz) => opts.options([("timezone", tz.as_str())]),
        None => opts,
    })
}

/// Open the pool and bring the schema up to date. The returned handle is the
/// only way the rest of the process reaches the database.
pub async fn connect(cfg: &DbConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections.min(cfg.max_connections))
        .max_lifetime(cfg.max_lifetime)
        .idle_timeout(cfg.idle_timeout)
        .test_before_acquire(true)
        .connect_with(connect_options(cfg)?)
        .await?;

    info!(
        host = %cfg.host,
        port = cfg.port,
        database = %cfg.database,
        max_connections = cfg.max_connections,
        min_connections = cfg.min_connections,
        max_lifetime_secs = cfg.max_lifetime.as_secs(),
        idle_timeout_secs = cfg.idle_timeout.as_secs(),
        "PostgreSQL pool ready"
    );

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        pool.close().await;
        return Err(e.into());
    }
    info!("migrations applied");

    Ok(pool)
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolStats {
    pub size: u32,
    pub idle: usize,
    pub in_use: usize,
    pub max_connections: u32,
}

pub fn pool_stats(pool: &PgPool) -> PoolStats {
    let size = pool.size();
    let idle = pool.num_idle();
    PoolStats {
        size,
        idle,
        in_use: (size as usize).saturating_sub(idle),
        max_connections: pool.options().get_max_connections(),
    }
}

pub async fn ping(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
