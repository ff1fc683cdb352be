//! Capability objects handed to observers during a cleanup broadcast.
//!
//! The collector is the broadcast payload: an observer that has
//! asynchronous teardown work calls [`CleanupCollector::add_pending_cleanup`]
//! while it is being notified, keeps the returned [`PendingCleanup`], and
//! completes it when the work is done. The cycle closes only after every
//! handle has completed.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Weak;

use crate::domain::foundation::{CleanupError, CycleId, PendingUnitId};

use super::{FailureMask, ResultCode};

/// Serialized store of pending-unit state for the active cycle.
///
/// Implemented by the coordinator. Both calls must be safe to make from
/// any thread, including from inside an observer's notification.
pub trait CycleLedger: Send + Sync {
    /// Registers a pending unit with the given cycle.
    fn register_unit(&self, cycle_id: CycleId) -> Result<PendingUnitId, CleanupError>;

    /// Records the terminal result of a unit.
    fn resolve_unit(&self, cycle_id: CycleId, unit: PendingUnitId, code: ResultCode);
}

/// Broadcast payload that lets observers register pending cleanup work.
#[derive(Clone)]
pub struct CleanupCollector {
    cycle_id: CycleId,
    ledger: Weak<dyn CycleLedger>,
}

impl CleanupCollector {
    /// Creates a collector bound to one cycle.
    pub fn new(cycle_id: CycleId, ledger: Weak<dyn CycleLedger>) -> Self {
        Self { cycle_id, ledger }
    }

    /// The cycle this collector belongs to.
    pub fn cycle_id(&self) -> CycleId {
        self.cycle_id
    }

    /// Registers one unit of pending work with the cycle.
    ///
    /// The cycle will not complete until the returned handle is completed.
    /// If the cycle has already closed (or its coordinator is gone) the
    /// handle is detached and completing it has no effect.
    pub fn add_pending_cleanup(&self) -> PendingCleanup {
        let unit = match self.ledger.upgrade() {
            Some(ledger) => match ledger.register_unit(self.cycle_id) {
                Ok(unit) => Some(unit),
                Err(e) => {
                    tracing::warn!(cycle_id = %self.cycle_id, error = %e, "Pending cleanup registered too late");
                    None
                }
            },
            None => {
                tracing::warn!(cycle_id = %self.cycle_id, "Pending cleanup registered after coordinator shutdown");
                None
            }
        };

        PendingCleanup {
            cycle_id: self.cycle_id,
            unit,
            ledger: self.ledger.clone(),
            completed: AtomicBool::new(false),
        }
    }
}

impl fmt::Debug for CleanupCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupCollector")
            .field("cycle_id", &self.cycle_id)
            .finish_non_exhaustive()
    }
}

/// Handle for one unit of pending cleanup work.
///
/// Completing the handle more than once is allowed; only the first
/// result counts.
pub struct PendingCleanup {
    cycle_id: CycleId,
    unit: Option<PendingUnitId>,
    ledger: Weak<dyn CycleLedger>,
    completed: AtomicBool,
}

impl PendingCleanup {
    /// Reports the terminal result of this unit.
    pub fn complete(&self, code: ResultCode) {
        if self.completed.swap(true, Ordering::AcqRel) {
            tracing::debug!(cycle_id = %self.cycle_id, unit = ?self.unit, "Ignoring repeated completion");
            return;
        }

        let Some(unit) = self.unit else {
            return;
        };
        if let Some(ledger) = self.ledger.upgrade() {
            ledger.resolve_unit(self.cycle_id, unit, code);
        }
    }

    /// Reports success.
    pub fn succeed(&self) {
        self.complete(ResultCode::Success);
    }

    /// Reports failure in the given categories.
    pub fn fail(&self, categories: FailureMask) {
        self.complete(ResultCode::failure(categories));
    }

    /// True once `complete` has been called.
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// True if the handle was issued after its cycle closed.
    pub fn is_detached(&self) -> bool {
        self.unit.is_none()
    }

    pub fn cycle_id(&self) -> CycleId {
        self.cycle_id
    }

    pub fn unit_id(&self) -> Option<PendingUnitId> {
        self.unit
    }
}

impl fmt::Debug for PendingCleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCleanup")
            .field("cycle_id", &self.cycle_id)
            .field("unit", &self.unit)
            .field("completed", &self.is_completed())
            .finish()
    }
}
