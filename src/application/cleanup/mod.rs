//! Cleanup cycle orchestration.
//!
//! - `CleanupCoordinator` - Guard, fan-out barrier and result delivery
//! - `CoordinatorConfig` - Topic and completion deadline

mod coordinator;
mod coordinator_config;

pub use coordinator::{CleanupCoordinator, CompletionCallback};
pub use coordinator_config::CoordinatorConfig;
