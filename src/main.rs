mod api;
mod catcher;
mod config;
mod convert;
mod db;
mod error;
mod fetcher;
mod paginator;
mod types;

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::catcher::Catcher;
use crate::config::Config;
use crate::db::{BatchedWriter, PgLiveStore};
use crate::error::Result;
use crate::fetcher::LiveApiClient;
use crate::paginator::PaginationLimits;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!(stage = e.stage(), "Fatal error in {} stage: {e}", e.stage());
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let health = Arc::new(HealthState::new());
    let latency = Arc::new(LatencyStats::new());
    let source = LiveApiClient::from_config(&cfg, Arc::clone(&latency))?;

    // --- Database setup ---
    let pool = db::pool::connect(&cfg.db).await?;

    // --- Health API (optional) ---
    if let Some(port) = cfg.api_port {
        let api_state = ApiState {
            pool: pool.clone(),
            health: Arc::clone(&health),
            latency: Arc::clone(&latency),
        };
        let bind_addr = format!("0.0.0.0:{port}");
        let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
            Ok(l) => l,
            Err(e) => {
                pool.close().await;
                return Err(e.into());
            }
        };
        info!("health API listening on {bind_addr}");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router(api_state)).await {
                error!("health API stopped: {e}");
            }
        });
    }

    // --- Pipeline ---
    let writer = BatchedWriter::new(PgLiveStore::new(pool.clone()), cfg.max_batch_rows);
    let catcher = Catcher::new(
        source,
        writer,
        PaginationLimits {
            max_pages: cfg.max_pages,
        },
        cfg.poll_interval,
        health,
    );
    info!(url = %cfg.live_api_url, "polling live listing");

    let result = catcher.run().await;

    pool.close().await;
    info!("database pool closed");
    result
}
