//! Arrival handling and the management surface.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::QueueConfig;
use crate::core::collaborators::{CapacityProber, Connector, DestinationDirectory};
use crate::core::lifecycle::LifecycleController;
use crate::core::notify::{Notification, NotificationEvent, NotificationSink};
use crate::core::priority::{Authorizer, Priority, PriorityClassifier};
use crate::core::queue_store::{QueueStore, WaitingClient};
use crate::core::scheduler::{AdmissionScheduler, SchedulerSettings, Spawn, TickOutcome, TickState};
use crate::util::serde::{ClientId, DestinationId};

/// External collaborators the queue is wired to.
#[derive(Clone)]
pub struct Collaborators {
    /// Resolves configured destinations.
    pub directory: Arc<dyn DestinationDirectory>,
    /// Permission lookups for tiers and bypass.
    pub authorizer: Arc<dyn Authorizer>,
    /// Destination capacity probe.
    pub prober: Arc<dyn CapacityProber>,
    /// Moves clients into destinations.
    pub connector: Arc<dyn Connector>,
    /// Receives client notifications.
    pub sink: Arc<dyn NotificationSink>,
}

/// A client asking to join a destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrivalEvent {
    /// Client asking.
    pub client: ClientId,
    /// Destination requested.
    pub destination: DestinationId,
    /// Where the client currently is, if anywhere.
    #[serde(default)]
    pub origin: Option<String>,
}

impl ArrivalEvent {
    /// Arrival with no known origin.
    pub fn new(client: impl Into<ClientId>, destination: impl Into<DestinationId>) -> Self {
        Self {
            client: client.into(),
            destination: destination.into(),
            origin: None,
        }
    }

    /// Set the client's current origin.
    #[must_use]
    pub fn from_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// What the queue decided for an arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalOutcome {
    /// Client now waits in line.
    Queued {
        /// 1-based position.
        position: usize,
        /// Queue length after joining.
        queue_size: usize,
        /// Assigned tier.
        priority: Priority,
    },
    /// Client was sent straight to the destination.
    Bypassed,
    /// Client already holds a wait slot; nothing changed.
    AlreadyQueued,
    /// Destination has no queue; nothing changed.
    NotQueued,
    /// Client is not somewhere it may queue from.
    Rejected,
}

/// Priority join queue: arrival gate, wait sequences, and admission loops.
pub struct JoinQueue<S> {
    store: Arc<QueueStore>,
    lifecycle: Arc<LifecycleController>,
    classifier: PriorityClassifier,
    authorizer: Arc<dyn Authorizer>,
    sink: Arc<dyn NotificationSink>,
    scheduler: AdmissionScheduler<S>,
    bypass_permission: String,
    allowed_origins: Vec<String>,
    started: AtomicBool,
}

impl<S> JoinQueue<S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Wire a queue from already validated configuration.
    pub fn new(cfg: &QueueConfig, collaborators: Collaborators, spawner: S) -> Self {
        let store = Arc::new(QueueStore::new(cfg.shared_queue));
        let lifecycle = Arc::new(LifecycleController::new(
            cfg.destinations.clone(),
            collaborators.directory,
            Arc::clone(&store),
        ));
        let scheduler = AdmissionScheduler::new(
            Arc::clone(&store),
            Arc::clone(&lifecycle),
            collaborators.prober,
            collaborators.connector,
            Arc::clone(&collaborators.sink),
            SchedulerSettings {
                period: cfg.tick_period(),
                candidates_per_tick: cfg.candidates_per_tick,
                announce_positions: cfg.announce_positions,
            },
            spawner,
        );
        Self {
            store,
            lifecycle,
            classifier: PriorityClassifier::new(cfg.tiers.clone(), cfg.priority_permission_prefix.clone()),
            authorizer: collaborators.authorizer,
            sink: collaborators.sink,
            scheduler,
            bypass_permission: cfg.bypass_permission.clone(),
            allowed_origins: cfg.allowed_origins.clone(),
            started: AtomicBool::new(false),
        }
    }

    /// Handle a client asking to join a destination.
    pub fn on_arrival(&self, arrival: ArrivalEvent) -> ArrivalOutcome {
        let ArrivalEvent {
            client,
            destination,
            origin,
        } = arrival;

        if !self.origin_allowed(origin.as_deref()) {
            tracing::debug!(%client, %destination, ?origin, "arrival from origin outside the queue lobby");
            self.notify(&client, NotificationEvent::CannotJoin { destination });
            return ArrivalOutcome::Rejected;
        }

        if !self.lifecycle.is_enabled()
            || self.authorizer.is_authorized(&client, &self.bypass_permission)
        {
            self.scheduler.admit_directly(client, destination);
            return ArrivalOutcome::Bypassed;
        }

        if !self.store.contains(&destination) {
            return ArrivalOutcome::NotQueued;
        }
        if self.store.registry().contains(&client) {
            return ArrivalOutcome::AlreadyQueued;
        }

        let priority = self.classifier.classify(&client, self.authorizer.as_ref());
        // A lifecycle change may land between the checks above and the insert.
        let receipt = loop {
            if let Some(receipt) = self.store.enqueue(&destination, &client, priority.clone()) {
                break receipt;
            }
            if self.store.registry().contains(&client) {
                return ArrivalOutcome::AlreadyQueued;
            }
            if !self.lifecycle.is_enabled() {
                tracing::debug!(%client, %destination, "queue disabled during arrival");
                self.scheduler.admit_directly(client, destination);
                return ArrivalOutcome::Bypassed;
            }
            if !self.store.contains(&destination) {
                return ArrivalOutcome::NotQueued;
            }
        };
        tracing::info!(
            %client,
            %destination,
            position = receipt.position,
            queue_size = receipt.queue_size,
            priority = %priority.name,
            "client queued"
        );
        self.notify(
            &client,
            NotificationEvent::Joined {
                destination,
                position: receipt.position,
                queue_size: receipt.queue_size,
                priority: priority.name.clone(),
            },
        );
        ArrivalOutcome::Queued {
            position: receipt.position,
            queue_size: receipt.queue_size,
            priority,
        }
    }

    /// Forget a client that left, wherever it is queued. Safe while a connect is in flight.
    pub fn on_disconnect(&self, client: &ClientId) -> bool {
        let removed = self.store.remove_client(client);
        if removed {
            tracing::debug!(%client, "queued client left");
        }
        removed
    }

    /// Spawn the admission loops.
    pub fn start(&self) -> Vec<DestinationId> {
        self.started.store(true, Ordering::Release);
        self.scheduler.start()
    }

    /// Stop the admission loops.
    pub fn shutdown(&self) {
        self.started.store(false, Ordering::Release);
        self.scheduler.shutdown();
    }

    /// Run one admission pass for `destination` immediately.
    pub async fn tick(&self, destination: &DestinationId) -> TickOutcome {
        self.scheduler.tick(destination).await
    }

    /// Re-open queues from configuration and schedule any new destination.
    pub fn enable(&self) -> Vec<DestinationId> {
        let destinations = self.lifecycle.enable();
        if self.started.load(Ordering::Acquire) {
            self.scheduler.ensure_running();
        }
        destinations
    }

    /// Drop all queues; arrivals connect directly until re-enabled.
    pub fn disable(&self) {
        self.lifecycle.disable();
    }

    /// Stop draining queues.
    pub fn pause(&self) {
        self.lifecycle.pause();
    }

    /// Resume draining queues.
    pub fn resume(&self) {
        self.lifecycle.resume();
    }

    /// Whether arrivals are queued.
    pub fn is_enabled(&self) -> bool {
        self.lifecycle.is_enabled()
    }

    /// Whether draining is paused.
    pub fn is_paused(&self) -> bool {
        self.lifecycle.is_paused()
    }

    /// 1-based position of `client`.
    pub fn position_of(&self, client: &ClientId) -> Option<usize> {
        self.store.position_of(client)
    }

    /// Copy of `destination`'s sequence.
    pub fn queue_snapshot(&self, destination: &DestinationId) -> Vec<WaitingClient> {
        self.store.snapshot(destination)
    }

    /// Waiting clients per queued destination.
    pub fn queue_sizes(&self) -> BTreeMap<DestinationId, usize> {
        self.store
            .destinations()
            .into_iter()
            .map(|destination| {
                let waiting = self.store.waiting_for(&destination);
                (destination, waiting)
            })
            .collect()
    }

    /// Tell every client in `destination`'s sequence its position.
    pub fn announce_positions(&self, destination: &DestinationId) -> usize {
        self.scheduler.announce_positions(destination)
    }

    /// Admission state of `destination`.
    pub fn tick_state(&self, destination: &DestinationId) -> TickState {
        self.scheduler.state_of(destination)
    }

    /// Underlying queue store.
    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    fn origin_allowed(&self, origin: Option<&str>) -> bool {
        match origin {
            _ if self.allowed_origins.is_empty() => true,
            None => true,
            Some(origin) => self
                .allowed_origins
                .iter()
                .any(|allowed| origin.contains(allowed.as_str())),
        }
    }

    fn notify(&self, client: &ClientId, event: NotificationEvent) {
        self.sink.notify(Notification::new(client.clone(), event));
    }
}
