//! Cleanup domain - cycles, pending units and their aggregated outcome.
//!
//! # Module Organization
//!
//! - `failure_mask` - Failure categories as a bitmask
//! - `result_code` - Terminal result of one pending unit
//! - `topic` - Notification topic naming
//! - `cycle` - The CleanupCycle aggregate (counter, mask, lifecycle)
//! - `collector` - Broadcast payload and pending-unit handles
//! - `report` - Summary of a completed cycle

mod collector;
mod cycle;
mod failure_mask;
mod report;
mod result_code;
mod topic;

pub use collector::{CleanupCollector, CycleLedger, PendingCleanup};
pub use cycle::{CleanupCycle, Resolution};
pub use failure_mask::FailureMask;
pub use report::CycleReport;
pub use result_code::ResultCode;
pub use topic::{Topic, LAST_PRIVATE_CONTEXT_EXITED};
