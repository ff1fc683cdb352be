//! Application layer - Orchestrates domain operations across ports.
//!
//! The coordinator owns the in-flight cycle, broadcasts through the
//! `NotificationBus` port and reports through the `CleanupTelemetry` port.

pub mod cleanup;

pub use cleanup::{CleanupCoordinator, CompletionCallback, CoordinatorConfig};
