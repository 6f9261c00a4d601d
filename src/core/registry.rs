//! Registry of clients currently holding a wait slot.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::util::serde::{ClientId, DestinationId};

/// Tracks which clients are queued and for which destination.
///
/// A client appears at most once. `try_register` is a single critical section,
/// so two racing arrivals for the same client produce exactly one winner.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    members: Mutex<HashMap<ClientId, DestinationId>>,
}

impl ClientRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `client` for `destination`. Returns false if already present.
    pub fn try_register(&self, client: &ClientId, destination: &DestinationId) -> bool {
        let mut members = self.members.lock();
        if members.contains_key(client) {
            return false;
        }
        members.insert(client.clone(), destination.clone());
        true
    }

    /// Remove `client`, returning the destination it was registered for.
    pub fn unregister(&self, client: &ClientId) -> Option<DestinationId> {
        self.members.lock().remove(client)
    }

    /// Destination `client` is queued for, if any.
    pub fn destination_of(&self, client: &ClientId) -> Option<DestinationId> {
        self.members.lock().get(client).cloned()
    }

    /// Whether `client` currently holds a wait slot.
    pub fn contains(&self, client: &ClientId) -> bool {
        self.members.lock().contains_key(client)
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.members.lock().len()
    }

    /// Whether no client is registered.
    pub fn is_empty(&self) -> bool {
        self.members.lock().is_empty()
    }

    /// Drop every registration.
    pub fn clear(&self) {
        self.members.lock().clear();
    }
}
