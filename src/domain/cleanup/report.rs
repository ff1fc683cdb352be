//! Aggregated outcome of a finished cleanup cycle.

use std::time::Duration;

use crate::domain::foundation::{CycleId, Timestamp};

use super::FailureMask;

/// Summary of a completed cycle, handed to telemetry and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle_id: CycleId,
    /// Union of every failing unit's categories.
    pub failure_mask: FailureMask,
    /// Monotonic time from cycle creation to completion.
    pub duration: Duration,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub registered_units: usize,
    pub failed_units: usize,
}

impl CycleReport {
    /// Returns true if no unit failed.
    pub fn is_success(&self) -> bool {
        self.failure_mask.is_success()
    }
}
