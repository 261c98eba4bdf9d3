use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, error, info};

use crate::config::{LIVE_DATA_COLUMNS, PG_BIND_LIMIT};
use crate::db::models::LiveRecord;
use crate::error::{AppError, Result};

/// Written columns, in bind order. `id`, `created_at`, `updated_at` are
/// filled in by the database.
pub const LIVE_DATA_COLUMN_LIST: [&str; LIVE_DATA_COLUMNS] = [
    "live_id",
    "live_title",
    "concurrent_user_count",
    "open_date",
    "adult",
    "tags",
    "category_type",
    "live_category",
    "live_category_value",
    "channel_id",
    "channel_name",
    "channel_image_url",
];

/// Rows per INSERT: as many as fit under the bind ceiling, then clamped to `cap`.
pub fn batch_size(cap: usize) -> usize {
    (PG_BIND_LIMIT / LIVE_DATA_COLUMNS).min(cap).max(1)
}

/// One multi-row `INSERT INTO live_data ... VALUES ($1, ..), ($13, ..), ..`.
pub fn build_insert(records: &[LiveRecord]) -> QueryBuilder<'_, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "INSERT INTO live_data ({}) ",
        LIVE_DATA_COLUMN_LIST.join(", ")
    ));
    qb.push_values(records, |mut row, r| {
        row.push_bind(r.live_id)
            .push_bind(&r.live_title)
            .push_bind(r.concurrent_user_count)
            .push_bind(r.open_date)
            .push_bind(r.adult)
            .push_bind(&r.tags)
            .push_bind(&r.category_type)
            .push_bind(&r.live_category)
            .push_bind(&r.live_category_value)
            .push_bind(&r.channel_id)
            .push_bind(&r.channel_name)
            .push_bind(&r.channel_image_url);
    });
    qb
}

/// Executes one INSERT statement for a batch and reports rows affected.
#[async_trait]
pub trait BatchExecutor: Send + Sync {
    async fn insert_batch(&self, batch: &[LiveRecord]) -> std::result::Result<u64, sqlx::Error>;
}

/// `live_data` on a PostgreSQL pool. Each batch runs as its own statement,
/// outside any enclosing transaction.
#[derive(Clone)]
pub struct PgLiveStore {
    pool: PgPool,
}

impl PgLiveStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BatchExecutor for PgLiveStore {
    async fn insert_batch(&self, batch: &[LiveRecord]) -> std::result::Result<u64, sqlx::Error> {
        let mut qb = build_insert(batch);
        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub batches: usize,
    pub rows_written: u64,
}

/// Splits a converted listing into bounded batches and writes them in order.
pub struct BatchedWriter<E> {
    executor: E,
    batch_rows: usize,
}

impl<E: BatchExecutor> BatchedWriter<E> {
    pub fn new(executor: E, max_batch_rows: usize) -> Self {
        Self {
            executor,
            batch_rows: batch_size(max_batch_rows),
        }
    }

    pub fn batch_rows(&self) -> usize {
        self.batch_rows
    }

    /// Write every record. The first failing batch stops the write; batches
    /// before it stay committed, batches after it are never sent.
    pub async fn write_all(&self, records: &[LiveRecord]) -> Result<WriteSummary> {
        let mut summary = WriteSummary::default();
        if records.is_empty() {
            debug!("no records to write");
            return Ok(summary);
        }

        for (n, chunk) in records.chunks(self.batch_rows).enumerate() {
            let start = n * self.batch_rows;
            let end = start + chunk.len();

            match self.executor.insert_batch(chunk).await {
                Ok(rows) => {
                    summary.batches += 1;
                    summary.rows_written += rows;
                    debug!(batch = n + 1, start, end, rows, "batch written");
                }
                Err(source) => {
                    error!(batch = n + 1, start, end, "batch insert failed: {source}");
                    let unique = source
                        .as_database_error()
                        .is_some_and(|e| e.is_unique_violation());
                    return Err(if unique {
                        AppError::UniqueViolation { start, end, source }
                    } else {
                        AppError::Persistence { start, end, source }
                    });
                }
            }
        }

        info!(
            batches = summary.batches,
            rows = summary.rows_written,
            "live data written"
        );
        Ok(summary)
    }
}
