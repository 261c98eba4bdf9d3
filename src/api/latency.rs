//! In-memory latency histogram for listing API round trips.
//! The fetcher records one sample per page request; the health API reads.

use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

/// Shared page-fetch latency. Values stored in microseconds.
pub struct LatencyStats {
    inner: Mutex<hdrhistogram::Histogram<u64>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencySnapshot {
    pub samples: u64,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
    pub max_ms: Option<f64>,
}

impl LatencyStats {
    /// Tracks 1us to 10 minutes, 3 significant figures. Larger samples are clamped.
    pub fn new() -> Self {
        let histogram = hdrhistogram::Histogram::new_with_bounds(1, 600_000_000, 3)
            .expect("valid histogram bounds");
        Self {
            inner: Mutex::new(histogram),
        }
    }

    pub fn record(&self, d: Duration) {
        let us = d.as_micros().min(u128::from(u64::MAX)) as u64;
        if let Ok(mut h) = self.inner.lock() {
            h.saturating_record(us.max(1));
        }
    }

    pub fn snapshot(&self) -> LatencySnapshot {
        let Ok(h) = self.inner.lock() else {
            return LatencySnapshot::default();
        };
        if h.len() == 0 {
            return LatencySnapshot::default();
        }
        let ms = |us: u64| us as f64 / 1000.0;
        LatencySnapshot {
            samples: h.len(),
            p50_ms: Some(ms(h.value_at_quantile(0.5))),
            p95_ms: Some(ms(h.value_at_quantile(0.95))),
            p99_ms: Some(ms(h.value_at_quantile(0.99))),
            max_ms: Some(ms(h.max())),
        }
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_histogram_has_no_percentiles() {
        let stats = LatencyStats::new();
        let snap = stats.snapshot();
        assert_eq!(snap.samples, 0);
        assert!(snap.p50_ms.is_none());
        assert!(snap.max_ms.is_none());
    }

    #[test]
    fn records_round_trips_in_milliseconds() {
        let stats = LatencyStats::new();
        for ms in [10, 20, 30, 40, 500] {
            stats.record(Duration::from_millis(ms));
        }
        let snap = stats.snapshot();
        assert_eq!(snap.samples, 5);
        let p50 = snap.p50_ms.expect("p50");
        assert!((p50 - 30.0).abs() < 0.1, "p50 was {p50}");
        let max = snap.max_ms.expect("max");
        assert!((max - 500.0).abs() < 1.0, "max was {max}");
    }
}
