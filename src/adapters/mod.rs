//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the coordinator to its surroundings:
//! - `notification` - Broadcast bus implementations (in-memory)
//! - `telemetry` - Metric sinks (in-memory)

pub mod notification;
pub mod telemetry;

pub use notification::InMemoryNotificationBus;
pub use telemetry::{CleanupMetricsSnapshot, InMemoryCleanupMetrics, RateSnapshot};
