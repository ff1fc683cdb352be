//! In-memory notification bus.
//!
//! Provides synchronous, deterministic, in-process delivery of cleanup
//! notifications. Subscribers are notified in the order they subscribed.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::cleanup::{CleanupCollector, Topic};
use crate::domain::foundation::SubscriptionId;
use crate::ports::{CleanupObserver, NotificationBus};

struct Subscription {
    id: SubscriptionId,
    topic: Topic,
    observer: Arc<dyn CleanupObserver>,
}

/// In-process notification bus.
///
/// Features:
/// - Registration-ordered, synchronous delivery
/// - Subscriber set snapshotted per broadcast
/// - Observer panics are contained and logged
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InMemoryNotificationBus::new());
/// let id = bus.subscribe(&Topic::default(), Arc::new(CacheEvictor::new()));
///
/// // ... later
/// bus.unsubscribe(id);
/// ```
pub struct InMemoryNotificationBus {
    subscriptions: RwLock<Vec<Subscription>>,
    next_id: AtomicU64,
}

impl InMemoryNotificationBus {
    /// Creates a new empty bus.
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn observers_for(&self, topic: &Topic) -> Vec<Arc<dyn CleanupObserver>> {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| &s.topic == topic)
            .map(|s| Arc::clone(&s.observer))
            .collect()
    }
}

impl Default for InMemoryNotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationBus for InMemoryNotificationBus {
    fn subscribe(&self, topic: &Topic, observer: Arc<dyn CleanupObserver>) -> SubscriptionId {
        let id = SubscriptionId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%topic, subscription = %id, observer = observer.name(), "Observer subscribed");

        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscription {
                id,
                topic: topic.clone(),
                observer,
            });
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        before != subscriptions.len()
    }

    fn notify(&self, topic: &Topic, collector: &CleanupCollector) -> usize {
        // Snapshot so the lock is released before observer code runs
        let observers = self.observers_for(topic);

        for observer in &observers {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| observer.observe(collector)));
            if delivered.is_err() {
                tracing::error!(
                    %topic,
                    cycle_id = %collector.cycle_id(),
                    observer = observer.name(),
                    "Observer panicked during cleanup notification"
                );
            }
        }

        observers.len()
    }

    fn subscriber_count(&self, topic: &Topic) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| &s.topic == topic)
            .count()
    }
}
