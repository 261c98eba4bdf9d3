//! Shared health state for the /health endpoint.
//! Updated by the cycle driver after each completed cycle.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::catcher::CycleSummary;

/// Outcome of the most recent successful cycle. Read by the API.
#[derive(Default)]
pub struct HealthState {
    cycles_completed: AtomicU64,
    /// Unix seconds of the last completed cycle (0 = none yet).
    last_cycle_at_secs: AtomicU64,
    last_cycle_pages: AtomicU64,
    last_cycle_items: AtomicU64,
    last_cycle_rows_written: AtomicU64,
    last_cycle_elapsed_ms: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self, summary: &CycleSummary, finished_at_secs: u64) {
        self.last_cycle_pages.store(summary.pages as u64, Ordering::Relaxed);
        self.last_cycle_items.store(summary.items as u64, Ordering::Relaxed);
        self.last_cycle_rows_written
            .store(summary.rows_written, Ordering::Relaxed);
        self.last_cycle_elapsed_ms
            .store(summary.elapsed.as_millis() as u64, Ordering::Relaxed);
        self.last_cycle_at_secs.store(finished_at_secs, Ordering::Relaxed);
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::Relaxed)
    }

    pub fn last_cycle_at_secs(&self) -> u64 {
        self.last_cycle_at_secs.load(Ordering::Relaxed)
    }

    pub fn last_cycle_pages(&self) -> u64 {
        self.last_cycle_pages.load(Ordering::Relaxed)
    }

    pub fn last_cycle_items(&self) -> u64 {
        self.last_cycle_items.load(Ordering::Relaxed)
    }

    pub fn last_cycle_rows_written(&self) -> u64 {
        self.last_cycle_rows_written.load(Ordering::Relaxed)
    }

    pub fn last_cycle_elapsed_ms(&self) -> u64 {
        self.last_cycle_elapsed_ms.load(Ordering::Relaxed)
    }
}
