//! PBM Cleanup - Private browsing data cleanup coordination
//!
//! When the last private browsing context closes, every subsystem that
//! holds session data must wipe it. This crate broadcasts that moment to
//! dynamically registered observers, waits for all of their (possibly
//! asynchronous) teardown work, and reports one aggregated failure mask.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
