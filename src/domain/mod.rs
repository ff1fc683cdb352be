//! Domain layer containing the cleanup cycle model.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, statuses, errors)
//! - `cleanup` - Cleanup cycle aggregate, failure masks and pending-unit handles

pub mod cleanup;
pub mod foundation;
