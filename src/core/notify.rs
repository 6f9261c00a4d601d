//! Client-facing notifications.
//!
//! The queue emits structured events keyed by client; rendering them into
//! messages is left to the UI layer behind a [`NotificationSink`].

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::clock::now_ms;
use crate::util::serde::{ClientId, DestinationId};

/// Event payloads delivered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum NotificationEvent {
    /// Client entered the queue.
    Joined {
        /// Destination queued for.
        destination: DestinationId,
        /// 1-based position.
        position: usize,
        /// Queue length after joining.
        queue_size: usize,
        /// Tier name.
        priority: String,
    },
    /// Destination has no free slot; sent to the head of the queue only.
    Full {
        /// Destination probed.
        destination: DestinationId,
    },
    /// Destination could not be probed; sent to the head of the queue only.
    Unavailable {
        /// Destination probed.
        destination: DestinationId,
        /// Probe failure reason.
        reason: String,
    },
    /// Periodic position announcement.
    PositionUpdate {
        /// Destination queued for.
        destination: DestinationId,
        /// 1-based position.
        position: usize,
        /// Current queue length.
        queue_size: usize,
    },
    /// Client was moved into the destination.
    Admitted {
        /// Destination joined.
        destination: DestinationId,
        /// Clients still waiting for the destination.
        remaining: usize,
    },
    /// Connect attempt failed; the client stays queued.
    ConnectFailed {
        /// Destination attempted.
        destination: DestinationId,
        /// Failure reason.
        reason: String,
    },
    /// Client may not queue from where it currently is.
    CannotJoin {
        /// Destination requested.
        destination: DestinationId,
    },
}

/// A notification addressed to one client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification id.
    pub id: Uuid,
    /// Recipient.
    pub client: ClientId,
    /// Creation time in milliseconds since epoch.
    pub created_at_ms: u128,
    /// Payload.
    #[serde(flatten)]
    pub event: NotificationEvent,
}

impl Notification {
    /// Stamp a new notification for `client`.
    #[must_use]
    pub fn new(client: ClientId, event: NotificationEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            client,
            created_at_ms: now_ms(),
            event,
        }
    }
}

/// Receiver of client notifications. Called from arrival threads and pool workers alike.
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification.
    fn notify(&self, notification: Notification);
}

/// Bounded in-memory sink for tests and development.
pub struct InMemoryNotificationSink {
    events: Mutex<VecDeque<Notification>>,
    max_events: usize,
}

impl InMemoryNotificationSink {
    /// Create a sink that keeps the most recent `max_events` notifications.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events,
        }
    }

    /// Snapshot of stored notifications, oldest first.
    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().iter().cloned().collect()
    }

    /// Stored notifications addressed to `client`.
    pub fn events_for(&self, client: &ClientId) -> Vec<NotificationEvent> {
        self.events
            .lock()
            .iter()
            .filter(|n| &n.client == client)
            .map(|n| n.event.clone())
            .collect()
    }
}

impl NotificationSink for InMemoryNotificationSink {
    fn notify(&self, notification: Notification) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(notification);
    }
}

/// Sink that only logs notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, notification: Notification) {
        tracing::info!(
            client = %notification.client,
            event = ?notification.event,
            "queue notification"
        );
    }
}
