use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::health::HealthState;
use crate::api::latency::{LatencySnapshot, LatencyStats};
use crate::db::pool::{ping, pool_stats, PoolStats};
use crate::error::AppError;

#[derive(Clone)]
pub struct ApiState {
    pub pool: sqlx::PgPool,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/stats/pool", get(get_pool_stats))
        .route("/stats/latency", get(get_latency))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub cycles_completed: u64,
    pub last_cycle: Option<LastCycleResponse>,
}

#[derive(Serialize)]
pub struct LastCycleResponse {
    pub finished_at: u64,
    pub pages: u64,
    pub items: u64,
    pub rows_written: u64,
    pub elapsed_ms: u64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Result<Json<HealthResponse>, AppError> {
    ping(&state.pool).await?;

    let health = &state.health;
    let last_cycle = (health.cycles_completed() > 0).then(|| LastCycleResponse {
        finished_at: health.last_cycle_at_secs(),
        pages: health.last_cycle_pages(),
        items: health.last_cycle_items(),
        rows_written: health.last_cycle_rows_written(),
        elapsed_ms: health.last_cycle_elapsed_ms(),
    });

    Ok(Json(HealthResponse {
        status: "ok",
        database: "ok",
        cycles_completed: health.cycles_completed(),
        last_cycle,
    }))
}

async fn get_pool_stats(State(state): State<ApiState>) -> Json<PoolStats> {
    Json(pool_stats(&state.pool))
}

async fn get_latency(State(state): State<ApiState>) -> Json<LatencySnapshot> {
    Json(state.latency.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

    use crate::catcher::CycleSummary;

    /// Router over a pool whose database is not reachable.
    async fn serve(health: Arc<HealthState>, latency: Arc<LatencyStats>) -> String {
        let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let db_port = closed.local_addr().unwrap().port();
        drop(closed);

        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(500))
            .connect_lazy_with(
                PgConnectOptions::new()
                    .host("127.0.0.1")
                    .port(db_port)
                    .username("nobody"),
            );
        let app = router(ApiState { pool, health, latency });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn latency_endpoint_reports_snapshot() {
        let latency = Arc::new(LatencyStats::new());
        latency.record(Duration::from_millis(42));
        let base = serve(Arc::new(HealthState::new()), latency).await;

        let body: serde_json::Value = reqwest::get(format!("{base}/stats/latency"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["samples"], 1);
        let p50 = body["p50_ms"].as_f64().expect("p50");
        assert!((p50 - 42.0).abs() < 0.1, "p50 was {p50}");
    }

    #[tokio::test]
    async fn pool_endpoint_reports_stats() {
        let base = serve(Arc::new(HealthState::new()), Arc::new(LatencyStats::new())).await;

        let resp = reqwest::get(format!("{base}/stats/pool")).await.unwrap();
        assert!(resp.status().is_success());
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["size"], 0);
    }

    #[tokio::test]
    async fn health_is_unavailable_when_database_is_down() {
        let health = Arc::new(HealthState::new());
        health.record_cycle(
            &CycleSummary {
                pages: 2,
                items: 40,
                batches: 1,
                rows_written: 40,
                elapsed: Duration::from_millis(900),
            },
            1_700_000_000,
        );
        assert_eq!(health.cycles_completed(), 1);
        assert_eq!(health.last_cycle_items(), 40);

        let base = serve(health, Arc::new(LatencyStats::new())).await;
        let resp = reqwest::get(format!("{base}/health")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    }
}
