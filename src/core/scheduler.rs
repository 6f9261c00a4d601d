//! Recurring per-destination admission passes.
//!
//! Each destination gets its own interval loop on the worker pool. A tick
//! probes the destination once, then hands every fetched candidate to the
//! connector on a separate task. Connect outcomes re-enter the queue store
//! under its locks and tolerate the client having left in the meantime.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::core::collaborators::{CapacityProber, Connector};
use crate::core::lifecycle::LifecycleController;
use crate::core::notify::{Notification, NotificationEvent, NotificationSink};
use crate::core::queue_store::QueueStore;
use crate::util::serde::{ClientId, DestinationId};

/// Abstraction for spawning work on the worker pool.
pub trait Spawn {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Where a destination's admission pass currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickState {
    /// Between ticks.
    Idle,
    /// Waiting on the capacity probe.
    Probing,
    /// Dispatching connect attempts for this many candidates.
    Admitting(usize),
}

/// Why a tick did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Queueing is disabled.
    Disabled,
    /// Draining is paused.
    Paused,
    /// Destination has no queue.
    UnknownDestination,
    /// No waiting client is free to attempt.
    NoCandidates,
}

/// Result of one admission pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOutcome {
    /// Nothing was probed.
    Skipped(SkipReason),
    /// Probe failed; the head client was told.
    Unavailable,
    /// No free slot; the head client was told.
    Full,
    /// Connect attempts dispatched.
    Admitting(usize),
}

/// Per-tick tunables.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Tick period.
    pub period: Duration,
    /// Candidates attempted per tick.
    pub candidates_per_tick: usize,
    /// Broadcast positions after each admission.
    pub announce_positions: bool,
}

struct SchedulerInner {
    store: Arc<QueueStore>,
    lifecycle: Arc<LifecycleController>,
    prober: Arc<dyn CapacityProber>,
    connector: Arc<dyn Connector>,
    sink: Arc<dyn NotificationSink>,
    settings: SchedulerSettings,
    states: Mutex<HashMap<DestinationId, TickState>>,
}

impl SchedulerInner {
    fn set_state(&self, destination: &DestinationId, state: TickState) {
        self.states.lock().insert(destination.clone(), state);
    }

    fn notify(&self, client: &ClientId, event: NotificationEvent) {
        self.sink.notify(Notification::new(client.clone(), event));
    }

    fn announce(&self, destination: &DestinationId) -> usize {
        let snapshot = self.store.snapshot(destination);
        let queue_size = snapshot.len();
        for (index, waiting) in snapshot.iter().enumerate() {
            self.notify(
                &waiting.client,
                NotificationEvent::PositionUpdate {
                    destination: waiting.destination.clone(),
                    position: index + 1,
                    queue_size,
                },
            );
        }
        queue_size
    }
}

/// Loops spawned since the last start, and the signal that stops them.
struct LoopSet {
    running: HashSet<DestinationId>,
    stop: watch::Sender<bool>,
}

/// Drives admission ticks for every queued destination.
pub struct AdmissionScheduler<S> {
    inner: Arc<SchedulerInner>,
    spawner: S,
    loops: Mutex<LoopSet>,
}

impl<S> AdmissionScheduler<S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Create a scheduler. No loop runs until [`AdmissionScheduler::start`].
    pub fn new(
        store: Arc<QueueStore>,
        lifecycle: Arc<LifecycleController>,
        prober: Arc<dyn CapacityProber>,
        connector: Arc<dyn Connector>,
        sink: Arc<dyn NotificationSink>,
        settings: SchedulerSettings,
        spawner: S,
    ) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            inner: Arc::new(SchedulerInner {
                store,
                lifecycle,
                prober,
                connector,
                sink,
                settings,
                states: Mutex::new(HashMap::new()),
            }),
            spawner,
            loops: Mutex::new(LoopSet {
                running: HashSet::new(),
                stop,
            }),
        }
    }

    /// Spawn admission loops for all queued destinations. Returns the
    /// destinations whose loop was started by this call.
    pub fn start(&self) -> Vec<DestinationId> {
        {
            let mut loops = self.loops.lock();
            if *loops.stop.borrow() {
                // Loops from before the shutdown keep the old, stopped channel.
                loops.stop = watch::channel(false).0;
            }
        }
        self.ensure_running()
    }

    /// Spawn loops for queued destinations that do not have one yet.
    pub fn ensure_running(&self) -> Vec<DestinationId> {
        let mut loops = self.loops.lock();
        let mut started = Vec::new();
        for destination in self.inner.store.destinations() {
            if !loops.running.insert(destination.clone()) {
                continue;
            }
            tracing::debug!(%destination, period = ?self.inner.settings.period, "starting admission loop");
            self.spawner.spawn(tick_loop(
                Arc::clone(&self.inner),
                self.spawner.clone(),
                destination.clone(),
                loops.stop.subscribe(),
            ));
            started.push(destination);
        }
        started
    }

    /// Stop every admission loop after its current tick.
    pub fn shutdown(&self) {
        let mut loops = self.loops.lock();
        loops.stop.send_replace(true);
        loops.running.clear();
        drop(loops);
        tracing::info!("admission loops stopping");
    }

    /// Run one admission pass for `destination` right now.
    pub async fn tick(&self, destination: &DestinationId) -> TickOutcome {
        run_tick(&self.inner, &self.spawner, destination).await
    }

    /// Current pass state of `destination`.
    pub fn state_of(&self, destination: &DestinationId) -> TickState {
        self.inner
            .states
            .lock()
            .get(destination)
            .copied()
            .unwrap_or(TickState::Idle)
    }

    /// Send every client in `destination`'s sequence its position. Returns the queue length.
    pub fn announce_positions(&self, destination: &DestinationId) -> usize {
        self.inner.announce(destination)
    }

    /// Connect `client` without queueing it.
    pub fn admit_directly(&self, client: ClientId, destination: DestinationId) {
        let connector = Arc::clone(&self.inner.connector);
        self.spawner.spawn(async move {
            match connector.connect(&client, &destination).await {
                Ok(()) => tracing::info!(%client, %destination, "client connected without queueing"),
                Err(err) => tracing::warn!(%client, %destination, error = %err, "direct connect failed"),
            }
        });
    }
}

async fn tick_loop<S>(
    inner: Arc<SchedulerInner>,
    spawner: S,
    destination: DestinationId,
    mut shutdown: watch::Receiver<bool>,
) where
    S: Spawn + Clone + Send + Sync + 'static,
{
    let period = inner.settings.period;
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        if *shutdown.borrow_and_update() {
            break;
        }
        tokio::select! {
            _ = ticks.tick() => {
                let outcome = run_tick(&inner, &spawner, &destination).await;
                tracing::trace!(%destination, ?outcome, "admission tick");
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!(%destination, "admission loop stopped");
}

async fn run_tick<S>(inner: &Arc<SchedulerInner>, spawner: &S, destination: &DestinationId) -> TickOutcome
where
    S: Spawn,
{
    if !inner.lifecycle.is_enabled() {
        return TickOutcome::Skipped(SkipReason::Disabled);
    }
    if inner.lifecycle.is_paused() {
        return TickOutcome::Skipped(SkipReason::Paused);
    }
    if !inner.store.contains(destination) {
        return TickOutcome::Skipped(SkipReason::UnknownDestination);
    }
    let candidates = inner
        .store
        .dequeue_candidates(destination, inner.settings.candidates_per_tick);
    let Some(head) = candidates.first() else {
        return TickOutcome::Skipped(SkipReason::NoCandidates);
    };

    // One probe per tick; the answer applies to the whole batch.
    inner.set_state(destination, TickState::Probing);
    let outcome = match inner.prober.probe(destination).await {
        Err(err) => {
            tracing::warn!(%destination, error = %err, "capacity probe failed");
            inner.notify(
                &head.client,
                NotificationEvent::Unavailable {
                    destination: destination.clone(),
                    reason: err.to_string(),
                },
            );
            TickOutcome::Unavailable
        }
        Ok(capacity) if capacity.free_slots() <= 0 => {
            tracing::debug!(%destination, online = capacity.online, max = capacity.max, "destination full");
            for candidate in &candidates {
                if inner.store.is_head(destination, &candidate.client) {
                    inner.notify(
                        &candidate.client,
                        NotificationEvent::Full {
                            destination: destination.clone(),
                        },
                    );
                }
            }
            TickOutcome::Full
        }
        Ok(capacity) => {
            // Every fetched candidate is attempted even when fewer slots are
            // free; the destination rejects overflow at connect time.
            inner.set_state(destination, TickState::Admitting(candidates.len()));
            tracing::debug!(
                %destination,
                free = capacity.free_slots(),
                candidates = candidates.len(),
                "admitting candidates"
            );
            let mut dispatched = 0;
            for candidate in candidates {
                if !inner.store.mark_connecting(destination, &candidate.client) {
                    continue;
                }
                dispatched += 1;
                spawner.spawn(connect_candidate(
                    Arc::clone(inner),
                    destination.clone(),
                    candidate.client,
                ));
            }
            TickOutcome::Admitting(dispatched)
        }
    };
    inner.set_state(destination, TickState::Idle);
    outcome
}

async fn connect_candidate(inner: Arc<SchedulerInner>, destination: DestinationId, client: ClientId) {
    match inner.connector.connect(&client, &destination).await {
        Ok(()) => {
            let was_queued = inner.store.remove(&destination, &client);
            let remaining = inner.store.waiting_for(&destination);
            tracing::info!(%client, %destination, remaining, was_queued, "client admitted");
            inner.notify(
                &client,
                NotificationEvent::Admitted {
                    destination: destination.clone(),
                    remaining,
                },
            );
            if inner.settings.announce_positions {
                inner.announce(&destination);
            }
        }
        Err(err) => {
            let still_queued = inner.store.clear_connecting(&destination, &client);
            tracing::warn!(%client, %destination, error = %err, still_queued, "connect attempt failed");
            if still_queued {
                inner.notify(
                    &client,
                    NotificationEvent::ConnectFailed {
                        destination,
                        reason: err.to_string(),
                    },
                );
            }
        }
    }
}
