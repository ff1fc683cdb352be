//! CleanupObserver port - Contract for cleanup subscribers.
//!
//! Observers are notified synchronously when a cleanup cycle starts.
//! What they delete is their own business; the coordinator only cares
//! whether they register pending work and how that work ends.

use crate::domain::cleanup::CleanupCollector;

/// Subscriber notified at the start of every cleanup cycle.
///
/// Implementations should be:
/// - **Quick** - Long work belongs behind a pending cleanup handle
/// - **Self-contained** - Failures are reported through the handle, never by panicking
///
/// # Example
///
/// ```ignore
/// struct CookieJarPurger { store: Arc<CookieStore> }
///
/// impl CleanupObserver for CookieJarPurger {
///     fn observe(&self, collector: &CleanupCollector) {
///         let pending = collector.add_pending_cleanup();
///         let store = self.store.clone();
///         tokio::spawn(async move {
///             match store.purge_private().await {
///                 Ok(()) => pending.succeed(),
///                 Err(_) => pending.fail(FailureMask::COOKIES),
///             }
///         });
///     }
///
///     fn name(&self) -> &'static str {
///         "CookieJarPurger"
///     }
/// }
/// ```
pub trait CleanupObserver: Send + Sync {
    /// Handle the cycle-start notification.
    ///
    /// Call `collector.add_pending_cleanup()` zero or more times from
    /// inside this method to make the cycle wait for asynchronous work.
    fn observe(&self, collector: &CleanupCollector);

    /// Observer name for logging.
    fn name(&self) -> &'static str;
}
