//! NotificationBus port - The broadcast primitive that announces cleanup.
//!
//! The coordinator treats the bus as opaque: it hands over a topic and a
//! collector and expects every current subscriber of that topic to see it.

use std::sync::Arc;

use crate::domain::cleanup::{CleanupCollector, Topic};
use crate::domain::foundation::SubscriptionId;

use super::CleanupObserver;

/// Port for topic-based, synchronous broadcast of cleanup notifications.
///
/// Implementations must ensure:
/// - `notify` delivers to subscribers in registration order
/// - The subscriber set is captured once per `notify` call; observers
///   added during delivery are not notified until the next call
/// - `notify` returns only after every observer's `observe` has returned
pub trait NotificationBus: Send + Sync {
    /// Subscribe an observer to a topic.
    fn subscribe(&self, topic: &Topic, observer: Arc<dyn CleanupObserver>) -> SubscriptionId;

    /// Remove a subscription. Returns false if it was not registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Deliver the collector to every subscriber of `topic`.
    ///
    /// Returns the number of observers notified.
    fn notify(&self, topic: &Topic, collector: &CleanupCollector) -> usize;

    /// Number of current subscribers for `topic`.
    fn subscriber_count(&self, topic: &Topic) -> usize;
}
