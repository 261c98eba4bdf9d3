use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::info;

use crate::api::health::HealthState;
use crate::convert::convert_listing;
use crate::db::{BatchExecutor, BatchedWriter};
use crate::error::Result;
use crate::fetcher::PageSource;
use crate::paginator::{fetch_all_lives, PaginationLimits};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub pages: usize,
    pub items: usize,
    pub batches: usize,
    pub rows_written: u64,
    pub elapsed: Duration,
}

/// Runs fetch → paginate → convert → write, then sleeps, forever.
/// The first error from any stage ends the loop; there is no next cycle.
pub struct Catcher<S, E> {
    source: S,
    writer: BatchedWriter<E>,
    limits: PaginationLimits,
    interval: Duration,
    health: Arc<HealthState>,
}

impl<S: PageSource, E: BatchExecutor> Catcher<S, E> {
    pub fn new(
        source: S,
        writer: BatchedWriter<E>,
        limits: PaginationLimits,
        interval: Duration,
        health: Arc<HealthState>,
    ) -> Self {
        Self {
            source,
            writer,
            limits,
            interval,
            health,
        }
    }

    pub async fn run(self) -> Result<()> {
        info!(
            interval_secs = self.interval.as_secs(),
            batch_rows = self.writer.batch_rows(),
            max_pages = ?self.limits.max_pages,
            "catcher started"
        );

        loop {
            self.run_cycle().await?;
            tokio::time::sleep(self.interval).await;
        }
    }

    pub async fn run_cycle(&self) -> Result<CycleSummary> {
        let started = Instant::now();

        let listing = fetch_all_lives(&self.source, self.limits).await?;
        let pages = listing.pages;
        let records = convert_listing(&listing.items)?;
        drop(listing);
        let written = self.writer.write_all(&records).await?;

        let summary = CycleSummary {
            pages,
            items: records.len(),
            batches: written.batches,
            rows_written: written.rows_written,
            elapsed: started.elapsed(),
        };
        self.health.record_cycle(&summary, now_secs());

        info!(
            pages = summary.pages,
            items = summary.items,
            batches = summary.batches,
            rows = summary.rows_written,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "cycle complete: {} lives over {} pages",
            summary.items,
            summary.pages,
        );
        Ok(summary)
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::db::writer::tests::{unique_violation, RecordingExecutor};
    use crate::error::AppError;
    use crate::paginator::tests::ScriptedSource;
    use crate::types::fixtures::{envelope, live_item};

    fn catcher(
        source: ScriptedSource,
        exec: RecordingExecutor,
        cap: usize,
    ) -> Catcher<ScriptedSource, RecordingExecutor> {
        Catcher::new(
            source,
            BatchedWriter::new(exec, cap),
            PaginationLimits::default(),
            Duration::from_secs(300),
            Arc::new(HealthState::new()),
        )
    }

    #[tokio::test]
    async fn cycle_fetches_converts_and_writes_in_order() {
        let exec = RecordingExecutor::default();
        let c = catcher(ScriptedSource::with_page_sizes(&[4, 3]), exec.clone(), 5);

        let summary = c.run_cycle().await.expect("cycle");

        assert_eq!(summary.pages, 2);
        assert_eq!(summary.items, 7);
        assert_eq!(summary.batches, 2);
        assert_eq!(summary.rows_written, 7);
        assert_eq!(exec.batch_sizes(), vec![5, 2]);
        assert_eq!(exec.all_ids(), (1..=7).collect::<Vec<i64>>());
        assert_eq!(c.health.cycles_completed(), 1);
        assert_eq!(c.health.last_cycle_rows_written(), 7);
    }

    #[tokio::test]
    async fn bad_open_date_persists_nothing() {
        let mut bad = live_item(2);
        bad.open_date = "not-a-date".to_string();
        let source = ScriptedSource::new(vec![
            Ok(envelope(vec![live_item(1)], "c1")),
            Ok(envelope(vec![bad, live_item(3)], "")),
        ]);
        let exec = RecordingExecutor::default();
        let c = catcher(source, exec.clone(), 1000);

        let err = c.run_cycle().await.unwrap_err();

        assert!(matches!(err, AppError::Conversion { index: 1, live_id: 2, .. }), "{err}");
        assert!(exec.batch_sizes().is_empty());
        assert_eq!(c.health.cycles_completed(), 0);
    }

    #[tokio::test]
    async fn fetch_failure_ends_run_without_sleeping() {
        let source = ScriptedSource::new(vec![Err(AppError::Status {
            status: 503,
            url: "http://x".to_string(),
        })]);
        let exec = RecordingExecutor::default();
        let c = catcher(source, exec.clone(), 1000);

        // No paused clock: if run() slept for 300s this would hang.
        let err = tokio::time::timeout(Duration::from_secs(5), c.run())
            .await
            .expect("run must return instead of sleeping")
            .unwrap_err();

        assert_eq!(err.stage(), "fetch");
        assert!(exec.batch_sizes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_in_a_later_cycle_stops_the_loop() {
        // cycle 1: one page, written; cycle 2: duplicate key on write
        let source = ScriptedSource::new(vec![
            Ok(envelope(vec![live_item(1), live_item(2)], "")),
            Ok(envelope(vec![live_item(1)], "")),
            Ok(envelope(vec![live_item(9)], "")),
        ]);
        let exec = RecordingExecutor::failing_on(2, unique_violation);
        let c = catcher(source, exec.clone(), 1000);
        let started = tokio::time::Instant::now();

        let err = c.run().await.unwrap_err();

        assert!(matches!(err, AppError::UniqueViolation { start: 0, end: 1, .. }), "{err}");
        assert_eq!(exec.batch_sizes(), vec![2, 1]);
        // exactly one sleep between the two cycles
        assert!(started.elapsed() >= Duration::from_secs(300));
        assert!(started.elapsed() < Duration::from_secs(600));
    }
}
