//! Management-facing request/response models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{ArrivalEvent, ArrivalOutcome, JoinQueue, Spawn, TickState, WaitingClient};
use crate::util::serde::{ClientId, DestinationId};

/// One destination's waiting line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSnapshotResponse {
    /// Destination name.
    pub destination: DestinationId,
    /// Current admission pass state.
    pub state: TickState,
    /// Waiting clients, front first.
    pub clients: Vec<WaitingClient>,
}

/// Position lookup result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionResponse {
    /// Client looked up.
    pub client: ClientId,
    /// 1-based position, absent when not queued.
    pub position: Option<usize>,
}

/// Overall queue status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Arrivals are queued.
    pub enabled: bool,
    /// Draining is suspended.
    pub paused: bool,
    /// Waiting clients per destination.
    pub queues: BTreeMap<DestinationId, usize>,
}

/// Feed an arrival into the queue.
pub fn submit_arrival<S>(queue: &JoinQueue<S>, arrival: ArrivalEvent) -> ArrivalOutcome
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    queue.on_arrival(arrival)
}

/// Snapshot one destination.
pub fn queue_snapshot<S>(queue: &JoinQueue<S>, destination: &DestinationId) -> QueueSnapshotResponse
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    QueueSnapshotResponse {
        destination: destination.clone(),
        state: queue.tick_state(destination),
        clients: queue.queue_snapshot(destination),
    }
}

/// Look up a client's position.
pub fn position<S>(queue: &JoinQueue<S>, client: &ClientId) -> PositionResponse
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    PositionResponse {
        client: client.clone(),
        position: queue.position_of(client),
    }
}

/// Overall status.
pub fn status<S>(queue: &JoinQueue<S>) -> StatusResponse
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    StatusResponse {
        enabled: queue.is_enabled(),
        paused: queue.is_paused(),
        queues: queue.queue_sizes(),
    }
}
