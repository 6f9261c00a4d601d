//! Runtime adapters and management API surface.

pub mod api;
pub mod tokio_spawner;

pub use api::{position, queue_snapshot, status, submit_arrival, PositionResponse, QueueSnapshotResponse, StatusResponse};
pub use tokio_spawner::TokioSpawner;
