//! CleanupTelemetry port - Metric sink for cleanup cycles.
//!
//! Two metrics are recorded for every completed cycle, whether it
//! succeeded, failed, or had no pending work at all:
//!
//! | Metric | Kind | Meaning |
//! |--------|------|---------|
//! | `private_browsing_cleanup.duration` | timing distribution | cycle start to completion |
//! | `private_browsing_cleanup.error_rate` | rate | numerator = failed cycles, denominator = all cycles |

use std::time::Duration;

use crate::domain::cleanup::CycleReport;

/// Name of the duration metric.
pub const DURATION_METRIC: &str = "private_browsing_cleanup.duration";

/// Name of the error-rate metric.
pub const ERROR_RATE_METRIC: &str = "private_browsing_cleanup.error_rate";

/// Port for recording cleanup telemetry.
///
/// Storage and export are up to the implementation.
pub trait CleanupTelemetry: Send + Sync {
    /// Add one sample to the duration distribution.
    fn record_duration(&self, duration: Duration);

    /// Add one cycle to the error rate.
    ///
    /// The denominator always grows by one; the numerator only if `failed`.
    fn record_outcome(&self, failed: bool);

    /// Record both metrics for a completed cycle.
    fn record_cycle(&self, report: &CycleReport) {
        self.record_duration(report.duration);
        self.record_outcome(!report.is_success());
    }
}
