//! Traits for the external services the queue talks to.
//!
//! Probes and connects are async and are only ever awaited on the worker pool,
//! never on the thread that delivered an arrival.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::QueueError;
use crate::util::serde::{ClientId, DestinationId};

/// Occupancy reported by a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    /// Clients currently connected.
    pub online: u32,
    /// Maximum clients accepted.
    pub max: u32,
}

impl Capacity {
    /// Free slots, negative when the destination is over capacity.
    #[must_use]
    pub fn free_slots(&self) -> i64 {
        i64::from(self.max) - i64::from(self.online)
    }
}

/// Asynchronous status query against a destination.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use join_queue::core::{Capacity, CapacityProber, QueueError};
/// use join_queue::util::DestinationId;
///
/// #[derive(Clone)]
/// struct PingProber;
///
/// #[async_trait]
/// impl CapacityProber for PingProber {
///     async fn probe(&self, destination: &DestinationId) -> Result<Capacity, QueueError> {
///         Ok(Capacity { online: 12, max: 100 })
///     }
/// }
/// ```
#[async_trait]
pub trait CapacityProber: Send + Sync + 'static {
    /// Report current and maximum occupancy, or why the destination could not be reached.
    async fn probe(&self, destination: &DestinationId) -> Result<Capacity, QueueError>;
}

/// Moves a client into a destination.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Attempt the connection. `Err` leaves the client queued for the next tick.
    async fn connect(&self, client: &ClientId, destination: &DestinationId) -> Result<(), QueueError>;
}

/// Resolves configured destination names against what actually exists.
pub trait DestinationDirectory: Send + Sync {
    /// Whether `destination` exists and may be scheduled.
    fn exists(&self, destination: &DestinationId) -> bool;
}

impl DestinationDirectory for HashSet<DestinationId> {
    fn exists(&self, destination: &DestinationId) -> bool {
        self.contains(destination)
    }
}

impl<F> DestinationDirectory for F
where
    F: Fn(&DestinationId) -> bool + Send + Sync,
{
    fn exists(&self, destination: &DestinationId) -> bool {
        self(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_slots_can_go_negative() {
        assert_eq!(Capacity { online: 0, max: 2 }.free_slots(), 2);
        assert_eq!(Capacity { online: 1, max: 1 }.free_slots(), 0);
        assert_eq!(Capacity { online: 5, max: 3 }.free_slots(), -2);
    }

    #[test]
    fn directory_from_set_and_closure() {
        let set: HashSet<DestinationId> = [DestinationId::new("a")].into_iter().collect();
        assert!(set.exists(&"a".into()));
        assert!(!set.exists(&"b".into()));
        let any = |_: &DestinationId| true;
        assert!(any.exists(&"b".into()));
    }
}
