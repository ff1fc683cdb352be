//! CleanupCycle aggregate - bookkeeping for one cleanup invocation.
//!
//! The aggregate is plain data: it counts pending units, folds their
//! results into a failure mask and tracks the lifecycle status. It has no
//! locking of its own; the coordinator serializes every mutation.

use std::collections::HashMap;
use std::time::Instant;

use crate::domain::foundation::{
    CleanupError, CycleId, CycleStatus, PendingUnitId, StateMachine, Timestamp,
};

use super::{CycleReport, FailureMask, ResultCode};

/// Result of applying a unit resolution to the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The result was folded into the mask.
    Recorded { remaining: usize },
    /// The unit had already resolved; nothing changed.
    AlreadyResolved,
    /// The unit was never registered with this cycle.
    UnknownUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitState {
    Pending,
    Resolved,
}

/// The CleanupCycle aggregate.
#[derive(Debug)]
pub struct CleanupCycle {
    id: CycleId,
    status: CycleStatus,
    started_at: Timestamp,
    started: Instant,
    units: HashMap<PendingUnitId, UnitState>,
    next_unit: PendingUnitId,
    outstanding: usize,
    failure_mask: FailureMask,
    failed_units: usize,
}

impl CleanupCycle {
    /// Begins a new cycle in the `Broadcasting` state.
    pub fn begin() -> Self {
        Self {
            id: CycleId::new(),
            status: CycleStatus::Broadcasting,
            started_at: Timestamp::now(),
            started: Instant::now(),
            units: HashMap::new(),
            next_unit: PendingUnitId::from_sequence(0),
            outstanding: 0,
            failure_mask: FailureMask::empty(),
            failed_units: 0,
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────

    pub fn id(&self) -> CycleId {
        self.id
    }

    pub fn status(&self) -> CycleStatus {
        self.status
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Number of registered units that have not resolved yet.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Number of units registered so far.
    pub fn registered_units(&self) -> usize {
        self.units.len()
    }

    /// Running union of failure categories.
    pub fn failure_mask(&self) -> FailureMask {
        self.failure_mask
    }

    /// True once the broadcast pass is over and nothing is outstanding.
    pub fn is_drained(&self) -> bool {
        self.status == CycleStatus::Draining && self.outstanding == 0
    }

    // ───────────────────────────────────────────────────────────────
    // Commands
    // ───────────────────────────────────────────────────────────────

    /// Registers a new pending unit and returns its id.
    pub fn register_unit(&mut self) -> Result<PendingUnitId, CleanupError> {
        if !self.status.is_open() {
            return Err(CleanupError::CycleClosed { cycle_id: self.id });
        }

        let unit = self.next_unit;
        self.next_unit = unit.next();
        self.units.insert(unit, UnitState::Pending);
        self.outstanding += 1;
        Ok(unit)
    }

    /// Records a unit's terminal result.
    ///
    /// Resolving the same unit twice is ignored. Failures are folded into
    /// the mask without affecting other units.
    pub fn resolve(&mut self, unit: PendingUnitId, code: ResultCode) -> Resolution {
        let Some(state) = self.units.get_mut(&unit) else {
            return Resolution::UnknownUnit;
        };
        if *state == UnitState::Resolved {
            return Resolution::AlreadyResolved;
        }

        *state = UnitState::Resolved;
        self.outstanding -= 1;
        if code.is_failure() {
            self.failed_units += 1;
            self.failure_mask |= code.contribution();
        }

        Resolution::Recorded {
            remaining: self.outstanding,
        }
    }

    /// Ends the broadcast pass (`Broadcasting -> Draining`).
    pub fn seal(&mut self) -> Result<(), CleanupError> {
        self.status = self.status.transition_to(CycleStatus::Draining)?;
        Ok(())
    }

    /// Closes the cycle (`Draining -> Completed`) and produces its report.
    ///
    /// Once completed the cycle rejects further registrations.
    pub fn complete(&mut self) -> Result<CycleReport, CleanupError> {
        self.status = self.status.transition_to(CycleStatus::Completed)?;
        Ok(CycleReport {
            cycle_id: self.id,
            failure_mask: self.failure_mask,
            duration: self.started.elapsed(),
            started_at: self.started_at,
            finished_at: Timestamp::now(),
            registered_units: self.units.len(),
            failed_units: self.failed_units,
        })
    }
}
