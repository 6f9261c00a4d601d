//! Queue domain, admission scheduling, and collaborator seams.

pub mod collaborators;
pub mod error;
pub mod join_queue;
pub mod lifecycle;
pub mod notify;
pub mod priority;
pub mod queue_store;
pub mod registry;
pub mod scheduler;

pub use collaborators::{Capacity, CapacityProber, Connector, DestinationDirectory};
pub use error::{AppResult, QueueError};
pub use join_queue::{ArrivalEvent, ArrivalOutcome, Collaborators, JoinQueue};
pub use lifecycle::LifecycleController;
pub use notify::{
    InMemoryNotificationSink, Notification, NotificationEvent, NotificationSink,
    TracingNotificationSink,
};
pub use priority::{Authorizer, Priority, PriorityClassifier, DEFAULT_TIER_NAME};
pub use queue_store::{EnqueueReceipt, QueueStore, WaitingClient};
pub use registry::ClientRegistry;
pub use scheduler::{
    AdmissionScheduler, SchedulerSettings, SkipReason, Spawn, TickOutcome, TickState,
};
