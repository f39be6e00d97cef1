//! Polling coordinator
//!
//! Owns the refresh cycle for one stop: fetches arrivals on a fixed
//! interval, publishes an immutable [`CoordinatorState`] and notifies the
//! subscribed views after every completed cycle.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use domain::{BusStopQuery, FetchSnapshot};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument};

use crate::error::ApplicationError;
use crate::ports::BusArrivalPort;

/// Counter of refresh cycles, labelled by `outcome`
pub const POLL_CYCLES_METRIC: &str = "korea_bus_poll_cycles_total";

/// Gauge with the number of records in the latest snapshot
pub const SNAPSHOT_RECORDS_METRIC: &str = "korea_bus_snapshot_records";

/// What the coordinator published after its latest completed cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorState {
    snapshot: Option<Arc<FetchSnapshot>>,
    last_update_success: bool,
    last_error: Option<String>,
    completed_at: DateTime<Utc>,
}

impl CoordinatorState {
    /// Latest successful snapshot; survives failed cycles
    pub fn snapshot(&self) -> Option<&Arc<FetchSnapshot>> {
        self.snapshot.as_ref()
    }

    /// Whether the latest cycle succeeded
    pub const fn last_update_success(&self) -> bool {
        self.last_update_success
    }

    /// Error message of the latest cycle, if it failed
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// When the latest cycle finished
    pub const fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

/// Result of a single [`PollingCoordinator::refresh`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot was published
    Updated {
        /// Number of records in the snapshot
        records: usize,
    },
    /// The fetch failed; the previous snapshot was kept
    Failed {
        /// Error message
        error: String,
    },
    /// Another refresh was in flight, nothing happened
    Skipped,
}

/// Receives the published state after every completed cycle
pub trait CoordinatorListener: Send + Sync {
    /// Called synchronously once per cycle, with the same state for every listener
    fn on_update(&self, state: &Arc<CoordinatorState>);
}

impl<F> CoordinatorListener for F
where
    F: Fn(&Arc<CoordinatorState>) + Send + Sync,
{
    fn on_update(&self, state: &Arc<CoordinatorState>) {
        self(state);
    }
}

#[derive(Default)]
struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Arc<dyn CoordinatorListener>)>>,
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.lock().len())
            .finish_non_exhaustive()
    }
}

/// Subscription to a coordinator; unsubscribes when dropped
#[derive(Debug)]
#[must_use = "dropping the handle unsubscribes the listener"]
pub struct ListenerHandle {
    id: u64,
    registry: Weak<ListenerRegistry>,
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

/// Resets the in-flight flag even if the refresh future is dropped
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Periodic arrival fetcher for one configured stop
///
/// One writer (the refresh cycle) swaps the published state atomically;
/// any number of readers load the latest state without locking.
pub struct PollingCoordinator {
    port: Arc<dyn BusArrivalPort>,
    query: BusStopQuery,
    interval: Duration,
    state: ArcSwapOption<CoordinatorState>,
    fetching: AtomicBool,
    listeners: Arc<ListenerRegistry>,
}

impl fmt::Debug for PollingCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingCoordinator")
            .field("query", &self.query)
            .field("interval", &self.interval)
            .field("fetching", &self.fetching.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl PollingCoordinator {
    /// Create a coordinator; nothing is fetched until the first refresh
    pub fn new(port: Arc<dyn BusArrivalPort>, query: BusStopQuery, interval: Duration) -> Self {
        Self {
            port,
            query,
            interval,
            state: ArcSwapOption::empty(),
            fetching: AtomicBool::new(false),
            listeners: Arc::new(ListenerRegistry::default()),
        }
    }

    /// The stop and lines this coordinator polls
    pub const fn query(&self) -> &BusStopQuery {
        &self.query
    }

    /// Poll interval
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Latest published state, `None` before the first cycle completes
    pub fn state(&self) -> Option<Arc<CoordinatorState>> {
        self.state.load_full()
    }

    /// Latest snapshot, if any cycle has succeeded
    pub fn snapshot(&self) -> Option<Arc<FetchSnapshot>> {
        self.state().and_then(|s| s.snapshot.clone())
    }

    /// Whether the latest completed cycle succeeded
    pub fn last_update_success(&self) -> bool {
        self.state
            .load()
            .as_ref()
            .is_some_and(|s| s.last_update_success)
    }

    /// Subscribe to state updates
    pub fn subscribe(&self, listener: impl CoordinatorListener + 'static) -> ListenerHandle {
        let id = self.listeners.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .listeners
            .lock()
            .push((id, Arc::new(listener)));
        ListenerHandle {
            id,
            registry: Arc::downgrade(&self.listeners),
        }
    }

    /// Number of active subscriptions
    pub fn listener_count(&self) -> usize {
        self.listeners.listeners.lock().len()
    }

    /// Run one fetch cycle unless another one is in flight
    #[instrument(skip(self), fields(stop_id = %self.query.stop_id()))]
    pub async fn refresh(&self) -> RefreshOutcome {
        if self
            .fetching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Refresh already in flight, dropping tick");
            metrics::counter!(POLL_CYCLES_METRIC, "outcome" => "skipped").increment(1);
            return RefreshOutcome::Skipped;
        }
        let _in_flight = InFlight(&self.fetching);

        let result = self.port.fetch_arrivals(self.query.stop_id()).await;
        let completed_at = Utc::now();

        let (state, outcome) = match result {
            Ok(records) => {
                let snapshot = FetchSnapshot::from_records(records, completed_at);
                let count = snapshot.len();
                debug!(records = count, "Arrivals refreshed");
                metrics::counter!(POLL_CYCLES_METRIC, "outcome" => "success").increment(1);
                #[allow(clippy::cast_precision_loss)]
                let gauge_value = count as f64;
                metrics::gauge!(SNAPSHOT_RECORDS_METRIC, "stop_id" => self.query.stop_id().to_string())
                    .set(gauge_value);

                let state = CoordinatorState {
                    snapshot: Some(Arc::new(snapshot)),
                    last_update_success: true,
                    last_error: None,
                    completed_at,
                };
                (state, RefreshOutcome::Updated { records: count })
            },
            Err(e) => {
                error!(error = %e, "Arrival refresh failed, keeping previous snapshot");
                metrics::counter!(POLL_CYCLES_METRIC, "outcome" => "failure").increment(1);

                let state = CoordinatorState {
                    snapshot: self.snapshot(),
                    last_update_success: false,
                    last_error: Some(e.to_string()),
                    completed_at,
                };
                (state, RefreshOutcome::Failed {
                    error: e.to_string(),
                })
            },
        };

        let state = Arc::new(state);
        self.state.store(Some(Arc::clone(&state)));
        self.notify(&state);
        outcome
    }

    /// Eager first refresh; fails if the stop cannot be fetched at all
    pub async fn first_refresh(&self) -> Result<(), ApplicationError> {
        match self.refresh().await {
            RefreshOutcome::Updated { .. } => Ok(()),
            RefreshOutcome::Failed { error } => Err(ApplicationError::NotReady(error)),
            RefreshOutcome::Skipped => Err(ApplicationError::NotReady(
                "refresh already in progress".to_string(),
            )),
        }
    }

    /// Spawn the periodic refresh loop
    ///
    /// The first tick is skipped since callers run [`Self::first_refresh`]
    /// before spawning. Abort the returned handle to stop polling.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        info!(
            stop_id = %self.query.stop_id(),
            interval_secs = self.interval.as_secs(),
            "Starting arrival polling task"
        );

        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(coordinator.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                coordinator.refresh().await;
            }
        })
    }

    fn notify(&self, state: &Arc<CoordinatorState>) {
        let listeners: Vec<_> = self
            .listeners
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        for listener in listeners {
            listener.on_update(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use domain::{ArrivalTime, BusArrivalRecord, LineId, StopId, VehicleSlot};
    use tokio::sync::Notify;

    use super::*;
    use crate::ports::MockBusArrivalPort;

    fn query() -> BusStopQuery {
        BusStopQuery::new(
            StopId::new("BS219257").unwrap(),
            [LineId::new("720").unwrap()],
            None,
        )
        .unwrap()
    }

    fn record(line: &str, slot: VehicleSlot, secs: i64) -> BusArrivalRecord {
        BusArrivalRecord::new(LineId::new(line).unwrap(), slot, ArrivalTime::Seconds(secs))
    }

    fn coordinator(port: MockBusArrivalPort) -> PollingCoordinator {
        PollingCoordinator::new(Arc::new(port), query(), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn nothing_published_before_first_refresh() {
        let coordinator = coordinator(MockBusArrivalPort::new());
        assert!(coordinator.state().is_none());
        assert!(coordinator.snapshot().is_none());
        assert!(!coordinator.last_update_success());
    }

    #[tokio::test]
    async fn successful_refresh_publishes_snapshot() {
        let mut port = MockBusArrivalPort::new();
        port.expect_fetch_arrivals().times(1).returning(|_| {
            Ok(vec![
                record("720", VehicleSlot::Current, 125),
                record("720", VehicleSlot::Next, 600),
            ])
        });

        let coordinator = coordinator(port);
        assert_eq!(
            coordinator.refresh().await,
            RefreshOutcome::Updated { records: 2 }
        );

        let snapshot = coordinator.snapshot().unwrap();
        let line = LineId::new("720").unwrap();
        assert!(snapshot.get(&line, VehicleSlot::Current).is_some());
        assert!(snapshot.get(&line, VehicleSlot::Next).is_some());
        assert!(coordinator.last_update_success());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let calls = AtomicUsize::new(0);
        let mut port = MockBusArrivalPort::new();
        port.expect_fetch_arrivals().times(3).returning(move |_| {
            match calls.fetch_add(1, Ordering::SeqCst) {
                0 => Ok(vec![record("720", VehicleSlot::Current, 125)]),
                1 => Err(ApplicationError::UpstreamTimeout),
                _ => Ok(vec![]),
            }
        });
        let coordinator = coordinator(port);

        coordinator.refresh().await;
        let first = coordinator.snapshot().unwrap();

        let outcome = coordinator.refresh().await;
        assert!(matches!(outcome, RefreshOutcome::Failed { .. }));
        let state = coordinator.state().unwrap();
        assert!(!state.last_update_success());
        assert!(state.last_error().is_some());
        assert!(Arc::ptr_eq(state.snapshot().unwrap(), &first));

        // Empty but successful replaces it
        assert_eq!(
            coordinator.refresh().await,
            RefreshOutcome::Updated { records: 0 }
        );
        let state = coordinator.state().unwrap();
        assert!(state.last_update_success());
        assert!(state.snapshot().unwrap().is_empty());
    }

    #[tokio::test]
    async fn first_refresh_failure_is_not_ready() {
        let mut port = MockBusArrivalPort::new();
        port.expect_fetch_arrivals()
            .returning(|_| Err(ApplicationError::UpstreamHttp { status: 503 }));

        let coordinator = coordinator(port);
        let err = coordinator.first_refresh().await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotReady(_)));

        // Failure still completes a cycle
        let state = coordinator.state().unwrap();
        assert!(state.snapshot().is_none());
        assert!(!state.last_update_success());
    }

    #[tokio::test]
    async fn listeners_share_the_same_state() {
        let mut port = MockBusArrivalPort::new();
        port.expect_fetch_arrivals()
            .returning(|_| Ok(vec![record("720", VehicleSlot::Current, 60)]));
        let coordinator = coordinator(port);

        let seen: Arc<Mutex<Vec<Arc<CoordinatorState>>>> = Arc::default();
        let first = {
            let seen = Arc::clone(&seen);
            coordinator.subscribe(move |s: &Arc<CoordinatorState>| seen.lock().push(Arc::clone(s)))
        };
        let second = {
            let seen = Arc::clone(&seen);
            coordinator.subscribe(move |s: &Arc<CoordinatorState>| seen.lock().push(Arc::clone(s)))
        };
        assert_eq!(coordinator.listener_count(), 2);

        coordinator.refresh().await;
        {
            let seen = seen.lock();
            assert_eq!(seen.len(), 2);
            assert!(Arc::ptr_eq(&seen[0], &seen[1]));
        }

        drop(first);
        assert_eq!(coordinator.listener_count(), 1);
        coordinator.refresh().await;
        assert_eq!(seen.lock().len(), 3);

        drop(second);
        assert_eq!(coordinator.listener_count(), 0);
    }

    #[tokio::test]
    async fn handle_outliving_coordinator_is_harmless() {
        let coordinator = coordinator(MockBusArrivalPort::new());
        let handle = coordinator.subscribe(|_: &Arc<CoordinatorState>| {});
        drop(coordinator);
        drop(handle);
    }

    #[derive(Default)]
    struct GatedPort {
        started: Notify,
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BusArrivalPort for GatedPort {
        async fn fetch_arrivals(
            &self,
            _stop_id: &StopId,
        ) -> Result<Vec<BusArrivalRecord>, ApplicationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            self.release.notified().await;
            Ok(vec![])
        }

        async fn validate_lines(
            &self,
            _stop_id: &StopId,
            _lines: &[LineId],
        ) -> Result<(), ApplicationError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn overlapping_refresh_is_skipped() {
        let port = Arc::new(GatedPort::default());
        let coordinator = Arc::new(PollingCoordinator::new(
            port.clone(),
            query(),
            Duration::from_secs(60),
        ));

        let in_flight = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.refresh().await })
        };
        port.started.notified().await;

        assert_eq!(coordinator.refresh().await, RefreshOutcome::Skipped);

        port.release.notify_one();
        assert_eq!(
            in_flight.await.unwrap(),
            RefreshOutcome::Updated { records: 0 }
        );
        assert_eq!(port.calls.load(Ordering::SeqCst), 1);

        // Flag is cleared once the cycle finishes
        port.release.notify_one();
        assert_eq!(
            coordinator.refresh().await,
            RefreshOutcome::Updated { records: 0 }
        );
    }

    #[tokio::test]
    async fn spawned_loop_keeps_refreshing() {
        let mut port = MockBusArrivalPort::new();
        port.expect_fetch_arrivals().returning(|_| Ok(vec![]));
        let coordinator = Arc::new(PollingCoordinator::new(
            Arc::new(port),
            query(),
            Duration::from_millis(20),
        ));

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _handle = coordinator.subscribe(move |s: &Arc<CoordinatorState>| {
            let _ = tx.send(s.last_update_success());
        });

        let task = coordinator.spawn();
        for _ in 0..2 {
            let success = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert!(success);
        }
        task.abort();
    }
}
