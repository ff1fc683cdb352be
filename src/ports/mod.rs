//! Ports - Interfaces for external collaborators.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the cleanup coordinator and the outside world. Adapters implement these ports.
//!
//! - `CleanupObserver` - A subscriber that tears down private data
//! - `NotificationBus` - The broadcast primitive announcing a cleanup cycle
//! - `CleanupTelemetry` - Sink for per-cycle duration and error-rate metrics

mod cleanup_observer;
mod cleanup_telemetry;
mod notification_bus;

pub use cleanup_observer::CleanupObserver;
pub use cleanup_telemetry::{CleanupTelemetry, DURATION_METRIC, ERROR_RATE_METRIC};
pub use notification_bus::NotificationBus;
