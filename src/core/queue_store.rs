//! Per-destination wait sequences kept in priority order.
//!
//! Each destination owns one `parking_lot::Mutex`-guarded sequence. In shared
//! mode every destination aliases the same sequence. The destination map sits
//! behind an `RwLock` that every operation holds for reading, so `clear` and
//! `reset` (write side) never race an insertion into a sequence that is being
//! discarded.
//!
//! Lock order: destination map, then sequence, then registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::core::priority::Priority;
use crate::core::registry::ClientRegistry;
use crate::util::clock::now_ms;
use crate::util::serde::{ClientId, DestinationId};

/// One client's presence in a destination's queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitingClient {
    /// Queued client.
    pub client: ClientId,
    /// Destination the client asked for.
    pub destination: DestinationId,
    /// Tier assigned at enqueue time.
    pub priority: Priority,
    /// Set while an admission attempt is outstanding.
    pub connecting: bool,
    /// Enqueue timestamp in milliseconds since epoch.
    pub enqueued_at_ms: u128,
}

/// Result of a successful enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnqueueReceipt {
    /// 1-based position in the sequence.
    pub position: usize,
    /// Sequence length after insertion.
    pub queue_size: usize,
}

type Sequence = Arc<Mutex<Vec<WaitingClient>>>;

/// Mapping from destination to its ordered wait sequence, plus the registry
/// that enforces single membership across all of them.
#[derive(Debug)]
pub struct QueueStore {
    sequences: RwLock<HashMap<DestinationId, Sequence>>,
    registry: ClientRegistry,
    shared: bool,
}

impl QueueStore {
    /// Create a store with no destinations. `shared` aliases all destinations
    /// to a single sequence once they are added with [`QueueStore::reset`].
    #[must_use]
    pub fn new(shared: bool) -> Self {
        Self {
            sequences: RwLock::new(HashMap::new()),
            registry: ClientRegistry::new(),
            shared,
        }
    }

    /// Whether all destinations share one sequence.
    #[must_use]
    pub const fn is_shared(&self) -> bool {
        self.shared
    }

    /// Registry backing this store.
    #[must_use]
    pub const fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    /// Ensure a sequence exists for each destination. Existing sequences are kept.
    pub fn reset(&self, destinations: &[DestinationId]) {
        let mut sequences = self.sequences.write();
        let shared = if self.shared {
            Some(
                sequences
                    .values()
                    .next()
                    .cloned()
                    .unwrap_or_else(|| Arc::new(Mutex::new(Vec::new()))),
            )
        } else {
            None
        };
        for destination in destinations {
            sequences.entry(destination.clone()).or_insert_with(|| {
                shared
                    .clone()
                    .unwrap_or_else(|| Arc::new(Mutex::new(Vec::new())))
            });
        }
    }

    /// Drop every sequence and registry entry. Destinations become unknown
    /// until the next [`QueueStore::reset`].
    pub fn clear(&self) -> usize {
        let mut sequences = self.sequences.write();
        let mut dropped = 0;
        for sequence in sequences.values() {
            let mut seq = sequence.lock();
            dropped += seq.len();
            seq.clear();
        }
        sequences.clear();
        self.registry.clear();
        dropped
    }

    /// Whether `destination` currently has a sequence.
    pub fn contains(&self, destination: &DestinationId) -> bool {
        self.sequences.read().contains_key(destination)
    }

    /// Known destinations, sorted by name.
    pub fn destinations(&self) -> Vec<DestinationId> {
        let mut out: Vec<_> = self.sequences.read().keys().cloned().collect();
        out.sort();
        out
    }

    /// Insert `client` keeping weights non-increasing and FIFO within a weight.
    ///
    /// Returns `None` without side effects if the destination is unknown or
    /// the client already holds a wait slot anywhere.
    pub fn enqueue(
        &self,
        destination: &DestinationId,
        client: &ClientId,
        priority: Priority,
    ) -> Option<EnqueueReceipt> {
        let sequences = self.sequences.read();
        let mut seq = sequences.get(destination)?.lock();
        if !self.registry.try_register(client, destination) {
            return None;
        }
        let index = seq
            .iter()
            .position(|w| w.priority.weight < priority.weight)
            .unwrap_or(seq.len());
        seq.insert(
            index,
            WaitingClient {
                client: client.clone(),
                destination: destination.clone(),
                priority,
                connecting: false,
                enqueued_at_ms: now_ms(),
            },
        );
        Some(EnqueueReceipt {
            position: index + 1,
            queue_size: seq.len(),
        })
    }

    /// Up to `limit` clients from the front that target `destination` and are
    /// not connecting. Nothing is removed.
    pub fn dequeue_candidates(&self, destination: &DestinationId, limit: usize) -> Vec<WaitingClient> {
        let sequences = self.sequences.read();
        let Some(sequence) = sequences.get(destination) else {
            return Vec::new();
        };
        let seq = sequence.lock();
        seq.iter()
            .filter(|w| !w.connecting && &w.destination == destination)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Flip `connecting` on. Returns false if the client is gone or already connecting.
    pub fn mark_connecting(&self, destination: &DestinationId, client: &ClientId) -> bool {
        self.with_client(destination, client, |w| {
            if w.connecting {
                false
            } else {
                w.connecting = true;
                true
            }
        })
        .unwrap_or(false)
    }

    /// Flip `connecting` off. Returns false if the client is gone.
    pub fn clear_connecting(&self, destination: &DestinationId, client: &ClientId) -> bool {
        self.with_client(destination, client, |w| {
            w.connecting = false;
            true
        })
        .unwrap_or(false)
    }

    /// Remove `client` from `destination`'s sequence and the registry. Idempotent.
    pub fn remove(&self, destination: &DestinationId, client: &ClientId) -> bool {
        let sequences = self.sequences.read();
        let Some(sequence) = sequences.get(destination) else {
            return false;
        };
        let mut seq = sequence.lock();
        let Some(index) = seq.iter().position(|w| &w.client == client) else {
            return false;
        };
        seq.remove(index);
        self.registry.unregister(client);
        true
    }

    /// Remove `client` from whichever sequence holds it.
    pub fn remove_client(&self, client: &ClientId) -> bool {
        self.registry
            .destination_of(client)
            .is_some_and(|destination| self.remove(&destination, client))
    }

    /// 1-based position of `client` in its sequence.
    pub fn position_of(&self, client: &ClientId) -> Option<usize> {
        let destination = self.registry.destination_of(client)?;
        let sequences = self.sequences.read();
        let seq = sequences.get(&destination)?.lock();
        seq.iter().position(|w| &w.client == client).map(|i| i + 1)
    }

    /// Copy of `destination`'s sequence; empty if unknown.
    pub fn snapshot(&self, destination: &DestinationId) -> Vec<WaitingClient> {
        self.sequences
            .read()
            .get(destination)
            .map(|sequence| sequence.lock().clone())
            .unwrap_or_default()
    }

    /// Length of the sequence `destination` resolves to.
    pub fn len(&self, destination: &DestinationId) -> usize {
        self.sequences
            .read()
            .get(destination)
            .map_or(0, |sequence| sequence.lock().len())
    }

    /// Whether the sequence `destination` resolves to is empty.
    pub fn is_empty(&self, destination: &DestinationId) -> bool {
        self.len(destination) == 0
    }

    /// Clients in the sequence that target `destination`.
    pub fn waiting_for(&self, destination: &DestinationId) -> usize {
        self.sequences.read().get(destination).map_or(0, |sequence| {
            sequence
                .lock()
                .iter()
                .filter(|w| &w.destination == destination)
                .count()
        })
    }

    /// Whether `client` sits at the very front of `destination`'s sequence.
    pub fn is_head(&self, destination: &DestinationId, client: &ClientId) -> bool {
        self.sequences
            .read()
            .get(destination)
            .is_some_and(|sequence| sequence.lock().first().is_some_and(|w| &w.client == client))
    }

    fn with_client<R>(
        &self,
        destination: &DestinationId,
        client: &ClientId,
        f: impl FnOnce(&mut WaitingClient) -> R,
    ) -> Option<R> {
        let sequences = self.sequences.read();
        let mut seq = sequences.get(destination)?.lock();
        seq.iter_mut().find(|w| &w.client == client).map(f)
    }
}
