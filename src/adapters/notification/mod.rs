//! Notification bus adapters.
//!
//! - `InMemoryNotificationBus` - Synchronous, in-process topic broadcast

mod in_memory;

pub use in_memory::InMemoryNotificationBus;
