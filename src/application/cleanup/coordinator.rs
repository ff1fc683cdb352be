//! CleanupCoordinator - runs private-session cleanup cycles.
//!
//! A cycle goes through three steps:
//! 1. **Guard** - refuse to start while another cycle is in flight
//! 2. **Fan-out** - broadcast a [`CleanupCollector`] so observers can register
//!    pending work, then wait until every registered unit has completed
//! 3. **Report** - hand the failure mask to the caller once, release the
//!    guard, and record duration and error-rate telemetry
//!
//! ## Concurrency
//!
//! Units may complete on any thread. All cycle state lives behind one
//! mutex; observer code, the completion callback and telemetry always run
//! with that mutex released, so they may call back into the coordinator.
//! The guard stays closed until the completion callback has returned.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::channel::oneshot;

use crate::domain::cleanup::{
    CleanupCollector, CleanupCycle, CycleLedger, CycleReport, FailureMask, Resolution, ResultCode,
};
use crate::domain::foundation::{CleanupError, CycleId, PendingUnitId};
use crate::ports::{CleanupTelemetry, NotificationBus};

use super::CoordinatorConfig;

/// Invoked exactly once with the cycle's failure mask.
pub type CompletionCallback = Box<dyn FnOnce(FailureMask) + Send + 'static>;

struct ActiveCycle {
    cycle: CleanupCycle,
    on_complete: Option<CompletionCallback>,
    /// Signalled after the guard is released; backs `run_cycle`.
    waiter: Option<oneshot::Sender<FailureMask>>,
}

impl ActiveCycle {
    /// Moves a drained cycle to `Completed` and takes what is needed to report it.
    fn close_if_drained(&mut self) -> Option<ClosingCycle> {
        if !self.cycle.is_drained() {
            return None;
        }
        match self.cycle.complete() {
            Ok(report) => Some(ClosingCycle {
                report,
                on_complete: self.on_complete.take(),
                waiter: self.waiter.take(),
            }),
            Err(e) => {
                tracing::error!(cycle_id = %self.cycle.id(), error = %e, "Failed to complete cleanup cycle");
                None
            }
        }
    }
}

/// A completed cycle whose result has not been delivered yet.
struct ClosingCycle {
    report: CycleReport,
    on_complete: Option<CompletionCallback>,
    waiter: Option<oneshot::Sender<FailureMask>>,
}

/// The single in-flight slot plus everything needed to close a cycle.
struct CycleGuard {
    active: Mutex<Option<ActiveCycle>>,
    telemetry: Arc<dyn CleanupTelemetry>,
}

impl CycleGuard {
    fn lock(&self) -> MutexGuard<'_, Option<ActiveCycle>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check-and-set of the in-flight slot.
    fn try_begin(
        &self,
        on_complete: Option<CompletionCallback>,
        waiter: Option<oneshot::Sender<FailureMask>>,
    ) -> Result<CycleId, CleanupError> {
        let mut slot = self.lock();
        if let Some(active) = slot.as_ref() {
            let cycle_id = active.cycle.id();
            tracing::warn!(%cycle_id, "Rejected cleanup request: cycle already running");
            return Err(CleanupError::AlreadyActive { cycle_id });
        }

        let cycle = CleanupCycle::begin();
        let cycle_id = cycle.id();
        *slot = Some(ActiveCycle {
            cycle,
            on_complete,
            waiter,
        });
        Ok(cycle_id)
    }

    /// Marks the broadcast pass as over and closes the cycle if nothing is pending.
    fn end_broadcast(&self, cycle_id: CycleId) {
        let closing = match self.lock().as_mut() {
            Some(active) if active.cycle.id() == cycle_id => {
                if let Err(e) = active.cycle.seal() {
                    tracing::error!(%cycle_id, error = %e, "Failed to seal cleanup cycle");
                }
                let outstanding = active.cycle.outstanding();
                if outstanding > 0 {
                    tracing::debug!(%cycle_id, outstanding, "Waiting for pending cleanups");
                }
                active.close_if_drained()
            }
            _ => None,
        };

        if let Some(closing) = closing {
            self.finish(closing);
        }
    }

    /// Delivers the result of a completed cycle.
    ///
    /// Order: callback, guard release, telemetry, log, awaiting caller.
    fn finish(&self, closing: ClosingCycle) {
        let ClosingCycle {
            report,
            on_complete,
            waiter,
        } = closing;
        let mask = report.failure_mask;

        if let Some(callback) = on_complete {
            if panic::catch_unwind(AssertUnwindSafe(move || callback(mask))).is_err() {
                tracing::error!(cycle_id = %report.cycle_id, "Cleanup completion callback panicked");
            }
        }

        {
            let mut slot = self.lock();
            if matches!(slot.as_ref(), Some(active) if active.cycle.id() == report.cycle_id) {
                *slot = None;
            }
        }

        self.telemetry.record_cycle(&report);

        if report.is_success() {
            tracing::info!(
                cycle_id = %report.cycle_id,
                started_at = %report.started_at.as_datetime(),
                duration_ms = report.duration.as_millis() as u64,
                registered_units = report.registered_units,
                "Private session cleanup finished"
            );
        } else {
            tracing::warn!(
                cycle_id = %report.cycle_id,
                started_at = %report.started_at.as_datetime(),
                failure_mask = %report.failure_mask,
                categories = ?report.failure_mask.category_names(),
                failed_units = report.failed_units,
                registered_units = report.registered_units,
                duration_ms = report.duration.as_millis() as u64,
                "Private session cleanup finished with failures"
            );
        }

        if let Some(waiter) = waiter {
            let _ = waiter.send(mask);
        }
    }

    fn outstanding_for(&self, cycle_id: CycleId) -> Option<usize> {
        self.lock()
            .as_ref()
            .filter(|active| active.cycle.id() == cycle_id)
            .map(|active| active.cycle.outstanding())
    }
}

impl CycleLedger for CycleGuard {
    fn register_unit(&self, cycle_id: CycleId) -> Result<PendingUnitId, CleanupError> {
        let mut slot = self.lock();
        match slot.as_mut() {
            Some(active) if active.cycle.id() == cycle_id => {
                let unit = active.cycle.register_unit()?;
                tracing::debug!(%cycle_id, %unit, "Pending cleanup registered");
                Ok(unit)
            }
            _ => Err(CleanupError::CycleClosed { cycle_id }),
        }
    }

    fn resolve_unit(&self, cycle_id: CycleId, unit: PendingUnitId, code: ResultCode) {
        let closing = match self.lock().as_mut() {
            Some(active) if active.cycle.id() == cycle_id => {
                match active.cycle.resolve(unit, code) {
                    Resolution::Recorded { remaining } => {
                        tracing::debug!(%cycle_id, %unit, failed = code.is_failure(), remaining, "Pending cleanup completed");
                    }
                    Resolution::AlreadyResolved => {
                        tracing::debug!(%cycle_id, %unit, "Ignoring repeated completion");
                    }
                    Resolution::UnknownUnit => {
                        tracing::warn!(%cycle_id, %unit, "Completion for unknown unit ignored");
                    }
                }
                active.close_if_drained()
            }
            _ => {
                tracing::debug!(%cycle_id, %unit, "Completion for closed cycle ignored");
                None
            }
        };

        if let Some(closing) = closing {
            self.finish(closing);
        }
    }
}

/// Ends the broadcast pass when dropped, including while unwinding out of
/// a bus whose observer panicked.
struct BroadcastPass<'a> {
    guard: &'a CycleGuard,
    cycle_id: CycleId,
}

impl Drop for BroadcastPass<'_> {
    fn drop(&mut self) {
        self.guard.end_broadcast(self.cycle_id);
    }
}

/// Coordinates private-session cleanup cycles.
///
/// Intended to be created once per process and shared; the in-flight
/// guard covers every caller of the same instance.
///
/// # Example
///
/// ```ignore
/// let coordinator = CleanupCoordinator::new(bus, metrics);
///
/// coordinator.start_cycle(Some(Box::new(|mask| {
///     if !mask.is_empty() {
///         tracing::warn!(%mask, "Private data cleanup partially failed");
///     }
/// })))?;
///
/// // or, from async code:
/// let mask = coordinator.run_cycle().await?;
/// ```
pub struct CleanupCoordinator {
    guard: Arc<CycleGuard>,
    bus: Arc<dyn NotificationBus>,
    config: CoordinatorConfig,
}

impl CleanupCoordinator {
    /// Create a coordinator with default configuration.
    pub fn new(bus: Arc<dyn NotificationBus>, telemetry: Arc<dyn CleanupTelemetry>) -> Self {
        Self::with_config(bus, telemetry, CoordinatorConfig::default())
    }

    /// Create a coordinator with custom configuration.
    pub fn with_config(
        bus: Arc<dyn NotificationBus>,
        telemetry: Arc<dyn CleanupTelemetry>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            guard: Arc::new(CycleGuard {
                active: Mutex::new(None),
                telemetry,
            }),
            bus,
            config,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Start a cleanup cycle.
    ///
    /// Broadcasts to every current subscriber before returning. If no
    /// observer registered pending work the cycle is already complete
    /// (and `on_complete` has run) when this returns; otherwise it
    /// completes on whichever thread resolves the last unit.
    ///
    /// The cycle counts as active until `on_complete` returns, so a new
    /// cycle requested from inside the callback is rejected.
    ///
    /// # Errors
    ///
    /// Returns `CleanupError::AlreadyActive` if a cycle is in flight.
    pub fn start_cycle(
        &self,
        on_complete: Option<CompletionCallback>,
    ) -> Result<CycleId, CleanupError> {
        self.begin(on_complete, None)
    }

    fn begin(
        &self,
        on_complete: Option<CompletionCallback>,
        waiter: Option<oneshot::Sender<FailureMask>>,
    ) -> Result<CycleId, CleanupError> {
        let cycle_id = self.guard.try_begin(on_complete, waiter)?;
        tracing::info!(%cycle_id, topic = %self.config.topic, "Starting private session cleanup");

        let ledger: Weak<dyn CycleLedger> = Arc::downgrade(&self.guard) as Weak<dyn CycleLedger>;
        let collector = CleanupCollector::new(cycle_id, ledger);

        let pass = BroadcastPass {
            guard: &self.guard,
            cycle_id,
        };
        let notified = self.bus.notify(&self.config.topic, &collector);
        tracing::debug!(%cycle_id, notified, "Cleanup broadcast delivered");
        drop(pass);

        Ok(cycle_id)
    }

    /// True while a cycle is in flight, including while its callback runs.
    pub fn is_active(&self) -> bool {
        self.guard.lock().is_some()
    }

    /// Id of the in-flight cycle, if any.
    pub fn active_cycle_id(&self) -> Option<CycleId> {
        self.guard.lock().as_ref().map(|active| active.cycle.id())
    }

    /// Unresolved units of the in-flight cycle, if any.
    pub fn outstanding_units(&self) -> Option<usize> {
        self.guard
            .lock()
            .as_ref()
            .map(|active| active.cycle.outstanding())
    }

    /// Run a cycle and wait for its failure mask.
    ///
    /// Applies `completion_timeout` from the configuration when set.
    pub async fn run_cycle(&self) -> Result<FailureMask, CleanupError> {
        match self.config.completion_timeout {
            Some(deadline) => self.run_cycle_with_deadline(deadline).await,
            None => {
                let (cycle_id, completion) = self.start_awaitable()?;
                completion
                    .await
                    .map_err(|_| CleanupError::CycleAbandoned { cycle_id })
            }
        }
    }

    /// Run a cycle and wait at most `deadline` for its failure mask.
    ///
    /// On expiry the cycle is left running; it completes normally if its
    /// outstanding units resolve later, and the guard stays closed until then.
    ///
    /// # Errors
    ///
    /// - `AlreadyActive` if a cycle is in flight
    /// - `DeadlineExceeded` if the deadline elapsed first
    pub async fn run_cycle_with_deadline(
        &self,
        deadline: Duration,
    ) -> Result<FailureMask, CleanupError> {
        let (cycle_id, mut completion) = self.start_awaitable()?;

        match tokio::time::timeout(deadline, &mut completion).await {
            Ok(Ok(mask)) => Ok(mask),
            Ok(Err(_)) => Err(CleanupError::CycleAbandoned { cycle_id }),
            Err(_) => {
                // The last unit may have resolved right at the deadline
                if let Ok(Some(mask)) = completion.try_recv() {
                    return Ok(mask);
                }
                let outstanding = self.guard.outstanding_for(cycle_id).unwrap_or(0);
                tracing::warn!(
                    %cycle_id,
                    outstanding,
                    deadline_ms = deadline.as_millis() as u64,
                    "Cleanup cycle exceeded its deadline"
                );
                Err(CleanupError::DeadlineExceeded {
                    cycle_id,
                    deadline,
                    outstanding,
                })
            }
        }
    }

    fn start_awaitable(&self) -> Result<(CycleId, oneshot::Receiver<FailureMask>), CleanupError> {
        let (tx, rx) = oneshot::channel();
        let cycle_id = self.begin(None, Some(tx))?;
        Ok((cycle_id, rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryCleanupMetrics, InMemoryNotificationBus};
    use crate::domain::cleanup::{PendingCleanup, Topic};
    use crate::domain::foundation::SubscriptionId;
    use crate::ports::CleanupObserver;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ─────────────────────────────────────────────────────────────────────
    // Test fixtures
    // ─────────────────────────────────────────────────────────────────────

    struct FnObserver<F>(F);

    impl<F> CleanupObserver for FnObserver<F>
    where
        F: Fn(&CleanupCollector) + Send + Sync,
    {
        fn observe(&self, collector: &CleanupCollector) {
            (self.0)(collector)
        }

        fn name(&self) -> &'static str {
            "FnObserver"
        }
    }

    /// Observer that registers one unit and parks the handle for the test.
    fn parking_observer(parked: Arc<Mutex<Vec<PendingCleanup>>>) -> Arc<dyn CleanupObserver> {
        Arc::new(FnObserver(move |collector: &CleanupCollector| {
            parked.lock().unwrap().push(collector.add_pending_cleanup());
        }))
    }

    struct Harness {
        bus: Arc<InMemoryNotificationBus>,
        metrics: Arc<InMemoryCleanupMetrics>,
        coordinator: CleanupCoordinator,
    }

    fn harness() -> Harness {
        let bus = Arc::new(InMemoryNotificationBus::new());
        let metrics = Arc::new(InMemoryCleanupMetrics::new());
        let coordinator = CleanupCoordinator::new(bus.clone(), metrics.clone());
        Harness {
            bus,
            metrics,
            coordinator,
        }
    }

    fn capture() -> (Arc<Mutex<Vec<FailureMask>>>, CompletionCallback) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        (
            calls,
            Box::new(move |mask| sink.lock().unwrap().push(mask)),
        )
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cycle guard
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn cycle_without_observers_completes_before_start_returns() {
        let h = harness();
        let (calls, callback) = capture();

        h.coordinator.start_cycle(Some(callback)).unwrap();

        assert_eq!(*calls.lock().unwrap(), vec![FailureMask::empty()]);
        assert!(!h.coordinator.is_active());
    }

    #[test]
    fn overlapping_start_is_rejected_synchronously() {
        let h = harness();
        let parked = Arc::new(Mutex::new(Vec::new()));
        h.bus.subscribe(&Topic::default(), parking_observer(parked.clone()));

        let (calls, callback) = capture();
        let first = h.coordinator.start_cycle(Some(callback)).unwrap();
        assert!(h.coordinator.is_active());
        assert_eq!(h.coordinator.active_cycle_id(), Some(first));

        let err = h.coordinator.start_cycle(None).unwrap_err();
        assert_eq!(err, CleanupError::AlreadyActive { cycle_id: first });

        parked.lock().unwrap()[0].succeed();
        assert_eq!(*calls.lock().unwrap(), vec![FailureMask::empty()]);
        assert!(!h.coordinator.is_active());

        parked.lock().unwrap().clear();
        assert!(h.coordinator.start_cycle(None).is_ok());
    }

    #[test]
    fn observer_starting_a_cycle_during_broadcast_gets_overlap_error() {
        let h = harness();
        let nested = Arc::new(Mutex::new(None));
        let coordinator = Arc::new(h.coordinator);

        let weak = Arc::downgrade(&coordinator);
        let seen = nested.clone();
        h.bus.subscribe(
            &Topic::default(),
            Arc::new(FnObserver(move |_: &CleanupCollector| {
                if let Some(c) = weak.upgrade() {
                    *seen.lock().unwrap() = Some(c.start_cycle(None));
                }
            })),
        );

        coordinator.start_cycle(None).unwrap();

        let nested = nested.lock().unwrap().take().unwrap();
        assert!(nested.unwrap_err().is_already_active());
        assert!(!coordinator.is_active());
    }

    #[test]
    fn guard_stays_closed_until_callback_returns() {
        let h = harness();
        let coordinator = Arc::new(h.coordinator);
        let seen = Arc::new(Mutex::new(None));

        let c = coordinator.clone();
        let metrics = h.metrics.clone();
        let slot = seen.clone();
        coordinator
            .start_cycle(Some(Box::new(move |_| {
                let nested = c.start_cycle(None);
                *slot.lock().unwrap() = Some((
                    c.is_active(),
                    nested.map_err(|e| e.is_already_active()),
                    metrics.snapshot().error_rate.denominator,
                ));
            })))
            .unwrap();

        let (active, nested, recorded) = seen.lock().unwrap().take().unwrap();
        assert!(active);
        assert_eq!(nested, Err(true));
        assert_eq!(recorded, 0);

        assert!(!coordinator.is_active());
        assert_eq!(h.metrics.snapshot().error_rate.denominator, 1);
        assert!(coordinator.start_cycle(None).is_ok());
    }

    #[test]
    fn registration_during_callback_is_rejected() {
        let h = harness();
        let kept = Arc::new(Mutex::new(None));
        let slot = kept.clone();
        h.bus.subscribe(
            &Topic::default(),
            Arc::new(FnObserver(move |collector: &CleanupCollector| {
                *slot.lock().unwrap() = Some(collector.clone());
            })),
        );

        let detached = Arc::new(Mutex::new(None));
        let sink = detached.clone();
        let collector_slot = kept.clone();
        h.coordinator
            .start_cycle(Some(Box::new(move |_| {
                let collector = collector_slot.lock().unwrap().take().unwrap();
                *sink.lock().unwrap() = Some(collector.add_pending_cleanup().is_detached());
            })))
            .unwrap();

        assert_eq!(*detached.lock().unwrap(), Some(true));
        assert!(!h.coordinator.is_active());
    }

    /// Bus that lets a panic escape from `notify`.
    struct PanickingBus;

    impl NotificationBus for PanickingBus {
        fn subscribe(&self, _: &Topic, _: Arc<dyn CleanupObserver>) -> SubscriptionId {
            SubscriptionId::from_raw(1)
        }

        fn unsubscribe(&self, _: SubscriptionId) -> bool {
            false
        }

        fn notify(&self, _: &Topic, _: &CleanupCollector) -> usize {
            panic!("observer failure escaped the bus");
        }

        fn subscriber_count(&self, _: &Topic) -> usize {
            0
        }
    }

    #[test]
    fn panic_escaping_the_bus_still_ends_the_broadcast() {
        let metrics = Arc::new(InMemoryCleanupMetrics::new());
        let coordinator = CleanupCoordinator::new(Arc::new(PanickingBus), metrics.clone());
        let (calls, callback) = capture();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| coordinator.start_cycle(Some(callback))));

        assert!(outcome.is_err());
        assert!(!coordinator.is_active());
        assert_eq!(*calls.lock().unwrap(), vec![FailureMask::empty()]);
        assert_eq!(metrics.snapshot().error_rate.denominator, 1);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Fan-out barrier
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn waits_for_every_pending_unit() {
        let h = harness();
        let parked = Arc::new(Mutex::new(Vec::new()));
        h.bus.subscribe(&Topic::default(), parking_observer(parked.clone()));
        h.bus.subscribe(&Topic::default(), parking_observer(parked.clone()));
        h.bus.subscribe(
            &Topic::default(),
            Arc::new(FnObserver(|_: &CleanupCollector| {})),
        );

        let (calls, callback) = capture();
        h.coordinator.start_cycle(Some(callback)).unwrap();
        assert_eq!(h.coordinator.outstanding_units(), Some(2));

        let handles = std::mem::take(&mut *parked.lock().unwrap());
        handles[1].succeed();
        assert!(calls.lock().unwrap().is_empty());
        handles[0].succeed();

        assert_eq!(*calls.lock().unwrap(), vec![FailureMask::empty()]);
        assert_eq!(h.coordinator.outstanding_units(), None);
    }

    #[test]
    fn unit_finished_during_broadcast_does_not_close_cycle_early() {
        let h = harness();
        let parked = Arc::new(Mutex::new(Vec::new()));
        h.bus.subscribe(
            &Topic::default(),
            Arc::new(FnObserver(|collector: &CleanupCollector| {
                collector.add_pending_cleanup().succeed();
            })),
        );
        h.bus.subscribe(&Topic::default(), parking_observer(parked.clone()));

        let (calls, callback) = capture();
        h.coordinator.start_cycle(Some(callback)).unwrap();

        assert!(calls.lock().unwrap().is_empty());
        assert!(h.coordinator.is_active());

        parked.lock().unwrap()[0].succeed();
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn units_resolved_synchronously_complete_within_start() {
        let h = harness();
        h.bus.subscribe(
            &Topic::default(),
            Arc::new(FnObserver(|collector: &CleanupCollector| {
                collector.add_pending_cleanup().fail(FailureMask::IMAGE_CACHE);
                collector.add_pending_cleanup().succeed();
            })),
        );

        let (calls, callback) = capture();
        h.coordinator.start_cycle(Some(callback)).unwrap();

        assert_eq!(*calls.lock().unwrap(), vec![FailureMask::IMAGE_CACHE]);
        assert!(!h.coordinator.is_active());
    }

    #[test]
    fn finished_handle_from_previous_cycle_does_not_touch_the_next() {
        let h = harness();
        let parked = Arc::new(Mutex::new(Vec::new()));
        let id = h
            .bus
            .subscribe(&Topic::default(), parking_observer(parked.clone()));

        h.coordinator.start_cycle(None).unwrap();
        let stale = parked.lock().unwrap().remove(0);
        stale.succeed();
        h.bus.unsubscribe(id);

        h.bus.subscribe(&Topic::default(), parking_observer(parked.clone()));
        let (calls, callback) = capture();
        h.coordinator.start_cycle(Some(callback)).unwrap();

        stale.fail(FailureMask::COOKIES);
        assert!(calls.lock().unwrap().is_empty());

        parked.lock().unwrap()[0].succeed();
        assert_eq!(*calls.lock().unwrap(), vec![FailureMask::empty()]);
    }

    #[test]
    fn late_registration_after_close_is_detached() {
        let h = harness();
        let kept = Arc::new(Mutex::new(None));
        let slot = kept.clone();
        h.bus.subscribe(
            &Topic::default(),
            Arc::new(FnObserver(move |collector: &CleanupCollector| {
                *slot.lock().unwrap() = Some(collector.clone());
            })),
        );

        h.coordinator.start_cycle(None).unwrap();
        assert!(!h.coordinator.is_active());

        let collector = kept.lock().unwrap().take().unwrap();
        assert!(collector.add_pending_cleanup().is_detached());
    }

    #[test]
    fn resolutions_from_many_threads_fire_callback_once() {
        let h = harness();
        let parked = Arc::new(Mutex::new(Vec::new()));
        let sink = parked.clone();
        h.bus.subscribe(
            &Topic::default(),
            Arc::new(FnObserver(move |collector: &CleanupCollector| {
                let mut handles = sink.lock().unwrap();
                for _ in 0..32 {
                    handles.push(collector.add_pending_cleanup());
                }
            })),
        );

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        h.coordinator
            .start_cycle(Some(Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })))
            .unwrap();

        let handles = std::mem::take(&mut *parked.lock().unwrap());
        let threads: Vec<_> = handles
            .into_iter()
            .enumerate()
            .map(|(i, handle)| {
                std::thread::spawn(move || {
                    if i % 8 == 0 {
                        handle.fail(FailureMask::from_raw(1 << (i / 8)));
                    } else {
                        handle.succeed();
                    }
                    handle.succeed();
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!h.coordinator.is_active());
        assert_eq!(h.metrics.snapshot().error_rate.numerator, 1);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Aggregation and telemetry
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn partial_failure_reports_exactly_the_failing_category() {
        let h = harness();
        let parked = Arc::new(Mutex::new(Vec::new()));
        h.bus.subscribe(&Topic::default(), parking_observer(parked.clone()));
        h.bus.subscribe(&Topic::default(), parking_observer(parked.clone()));

        let (calls, callback) = capture();
        h.coordinator.start_cycle(Some(callback)).unwrap();

        let handles = std::mem::take(&mut *parked.lock().unwrap());
        handles[0].fail(FailureMask::DOM_QUOTA);
        handles[1].succeed();

        assert_eq!(*calls.lock().unwrap(), vec![FailureMask::DOM_QUOTA]);
    }

    #[test]
    fn telemetry_is_recorded_without_a_callback() {
        let h = harness();
        h.bus.subscribe(
            &Topic::default(),
            Arc::new(FnObserver(|collector: &CleanupCollector| {
                collector.add_pending_cleanup().fail(FailureMask::empty());
            })),
        );

        h.coordinator.start_cycle(None).unwrap();

        let snapshot = h.metrics.snapshot();
        assert_eq!(snapshot.duration.count, 1);
        assert_eq!(snapshot.error_rate.numerator, 1);
        assert_eq!(snapshot.error_rate.denominator, 1);
    }

    #[test]
    fn panicking_callback_still_releases_guard_and_records_telemetry() {
        let h = harness();

        h.coordinator
            .start_cycle(Some(Box::new(|_| panic!("callback failure"))))
            .unwrap();

        assert!(!h.coordinator.is_active());
        assert_eq!(h.metrics.snapshot().duration.count, 1);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Async completion
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn run_cycle_waits_for_spawned_work() {
        let h = harness();
        h.bus.subscribe(
            &Topic::default(),
            Arc::new(FnObserver(|collector: &CleanupCollector| {
                let pending = collector.add_pending_cleanup();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    pending.fail(FailureMask::NETWORK_CACHE);
                });
            })),
        );

        let mask = h.coordinator.run_cycle().await.unwrap();

        assert_eq!(mask, FailureMask::NETWORK_CACHE);
        assert!(!h.coordinator.is_active());
    }

    #[tokio::test]
    async fn deadline_expiry_leaves_the_cycle_running() {
        let h = harness();
        let parked = Arc::new(Mutex::new(Vec::new()));
        h.bus.subscribe(&Topic::default(), parking_observer(parked.clone()));

        let err = h
            .coordinator
            .run_cycle_with_deadline(Duration::from_millis(20))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CleanupError::DeadlineExceeded { outstanding: 1, .. }
        ));
        assert!(h.coordinator.is_active());
        assert_eq!(h.metrics.snapshot().duration.count, 0);

        parked.lock().unwrap()[0].succeed();
        assert!(!h.coordinator.is_active());
        assert_eq!(h.metrics.snapshot().duration.count, 1);
    }

    #[tokio::test]
    async fn configured_timeout_applies_to_run_cycle() {
        let bus = Arc::new(InMemoryNotificationBus::new());
        let metrics = Arc::new(InMemoryCleanupMetrics::new());
        let coordinator = CleanupCoordinator::with_config(
            bus.clone(),
            metrics,
            CoordinatorConfig::default().with_completion_timeout(Duration::from_millis(10)),
        );
        let parked = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(&Topic::default(), parking_observer(parked.clone()));

        let err = coordinator.run_cycle().await.unwrap_err();
        assert!(matches!(err, CleanupError::DeadlineExceeded { .. }));
    }
}
