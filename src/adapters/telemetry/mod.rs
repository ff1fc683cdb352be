//! Telemetry adapters.
//!
//! - `InMemoryCleanupMetrics` - Atomic duration distribution and error rate

mod in_memory;

pub use in_memory::{
    CleanupMetricsSnapshot, DurationBucket, DurationSnapshot, InMemoryCleanupMetrics,
    RateSnapshot, DEFAULT_DURATION_BUCKETS_MS,
};
