//! CycleStatus enum for tracking the lifecycle of cleanup cycles.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StateMachine;

/// Lifecycle status of a cleanup cycle.
///
/// ```text
/// Broadcasting --[broadcast pass ends]--> Draining --[last unit resolves]--> Completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    /// Observers are being notified and may register pending units.
    #[default]
    Broadcasting,
    /// Broadcast is over; waiting for outstanding units to resolve.
    Draining,
    /// Every unit resolved and the completion callback has been handed the mask.
    Completed,
}

impl CycleStatus {
    /// Returns true while the cycle still accepts unit registrations and resolutions.
    pub fn is_open(&self) -> bool {
        !matches!(self, CycleStatus::Completed)
    }
}

impl StateMachine for CycleStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use CycleStatus::*;
        matches!((self, target), (Broadcasting, Draining) | (Draining, Completed))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use CycleStatus::*;
        match self {
            Broadcasting => vec![Draining],
            Draining => vec![Completed],
            Completed => vec![],
        }
    }
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CycleStatus::Broadcasting => "Broadcasting",
            CycleStatus::Draining => "Draining",
            CycleStatus::Completed => "Completed",
        };
        write!(f, "{}", s)
    }
}
