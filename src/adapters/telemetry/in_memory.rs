//! In-memory cleanup metrics.
//!
//! Lock-free counters that accumulate the cycle duration distribution and
//! the error rate. Suitable for tests (snapshot + reset) and for exposing
//! a text export to whatever collector scrapes the process.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::ports::{CleanupTelemetry, DURATION_METRIC, ERROR_RATE_METRIC};

/// Upper bounds (milliseconds) of the duration buckets; the last bucket is unbounded.
pub const DEFAULT_DURATION_BUCKETS_MS: [u64; 12] =
    [1, 5, 10, 25, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000];

/// Distribution of cycle durations.
#[derive(Debug)]
struct TimingDistribution {
    bounds_ms: Vec<u64>,
    counts: Vec<AtomicU64>,
    sum_nanos: AtomicU64,
    count: AtomicU64,
}

impl TimingDistribution {
    fn new(mut bounds_ms: Vec<u64>) -> Self {
        bounds_ms.sort_unstable();
        bounds_ms.dedup();
        let counts = (0..=bounds_ms.len()).map(|_| AtomicU64::new(0)).collect();
        Self {
            bounds_ms,
            counts,
            sum_nanos: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    fn observe(&self, duration: Duration) {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        let idx = self
            .bounds_ms
            .iter()
            .position(|&bound| millis <= bound)
            .unwrap_or(self.bounds_ms.len());

        self.counts[idx].fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.sum_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> DurationSnapshot {
        let buckets = self
            .counts
            .iter()
            .enumerate()
            .map(|(i, count)| DurationBucket {
                upper_bound_ms: self.bounds_ms.get(i).copied(),
                count: count.load(Ordering::Relaxed),
            })
            .collect();

        DurationSnapshot {
            count: self.count.load(Ordering::Relaxed),
            sum: Duration::from_nanos(self.sum_nanos.load(Ordering::Relaxed)),
            buckets,
        }
    }

    fn reset(&self) {
        for count in &self.counts {
            count.store(0, Ordering::Relaxed);
        }
        self.sum_nanos.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }
}

/// One bucket of the duration distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationBucket {
    /// Inclusive upper bound; `None` for the overflow bucket.
    pub upper_bound_ms: Option<u64>,
    pub count: u64,
}

/// Point-in-time view of the duration distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationSnapshot {
    pub count: u64,
    pub sum: Duration,
    pub buckets: Vec<DurationBucket>,
}

/// Point-in-time view of the error rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateSnapshot {
    pub numerator: u64,
    pub denominator: u64,
}

impl RateSnapshot {
    /// Fraction of failed cycles, or `None` before the first cycle.
    pub fn ratio(&self) -> Option<f64> {
        if self.denominator == 0 {
            None
        } else {
            Some(self.numerator as f64 / self.denominator as f64)
        }
    }
}

/// Both cleanup metrics at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupMetricsSnapshot {
    pub duration: DurationSnapshot,
    pub error_rate: RateSnapshot,
}

/// Atomic, in-process implementation of [`CleanupTelemetry`].
#[derive(Debug)]
pub struct InMemoryCleanupMetrics {
    duration: TimingDistribution,
    numerator: AtomicU64,
    denominator: AtomicU64,
}

impl InMemoryCleanupMetrics {
    /// Creates metrics with the default duration buckets.
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_DURATION_BUCKETS_MS.to_vec())
    }

    /// Creates metrics with custom duration bucket bounds (milliseconds).
    pub fn with_buckets(bounds_ms: Vec<u64>) -> Self {
        Self {
            duration: TimingDistribution::new(bounds_ms),
            numerator: AtomicU64::new(0),
            denominator: AtomicU64::new(0),
        }
    }

    /// Returns the current values of both metrics.
    pub fn snapshot(&self) -> CleanupMetricsSnapshot {
        CleanupMetricsSnapshot {
            duration: self.duration.snapshot(),
            error_rate: RateSnapshot {
                numerator: self.numerator.load(Ordering::Relaxed),
                denominator: self.denominator.load(Ordering::Relaxed),
            },
        }
    }

    /// Clears all recorded values (for test isolation).
    pub fn reset(&self) {
        self.duration.reset();
        self.numerator.store(0, Ordering::Relaxed);
        self.denominator.store(0, Ordering::Relaxed);
    }

    /// Exports both metrics in a Prometheus-like text format.
    pub fn export_text(&self) -> String {
        let snapshot = self.snapshot();
        let mut output = String::new();

        let _ = writeln!(output, "# TYPE {DURATION_METRIC} histogram");
        let mut cumulative = 0;
        for bucket in &snapshot.duration.buckets {
            cumulative += bucket.count;
            let le = bucket
                .upper_bound_ms
                .map_or_else(|| "+Inf".to_string(), |b| b.to_string());
            let _ = writeln!(output, "{DURATION_METRIC}_bucket{{le=\"{le}\"}} {cumulative}");
        }
        let _ = writeln!(
            output,
            "{DURATION_METRIC}_sum_ms {}",
            snapshot.duration.sum.as_secs_f64() * 1_000.0
        );
        let _ = writeln!(output, "{DURATION_METRIC}_count {}", snapshot.duration.count);

        let _ = writeln!(output, "# TYPE {ERROR_RATE_METRIC} rate");
        let _ = writeln!(
            output,
            "{ERROR_RATE_METRIC}_numerator {}",
            snapshot.error_rate.numerator
        );
        let _ = writeln!(
            output,
            "{ERROR_RATE_METRIC}_denominator {}",
            snapshot.error_rate.denominator
        );

        output
    }
}

impl Default for InMemoryCleanupMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanupTelemetry for InMemoryCleanupMetrics {
    fn record_duration(&self, duration: Duration) {
        self.duration.observe(duration);
    }

    fn record_outcome(&self, failed: bool) {
        if failed {
            self.numerator.fetch_add(1, Ordering::Relaxed);
        }
        self.denominator.fetch_add(1, Ordering::Relaxed);
    }
}
