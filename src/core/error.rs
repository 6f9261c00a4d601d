//! Error types for queue operations.

use thiserror::Error;

use crate::util::serde::{ClientId, DestinationId};

/// Errors produced by queue components and their collaborators.
///
/// None of these are fatal: the scheduler absorbs them and reflects them to
/// clients as notifications or as omitted scheduling.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Destination is not known to the directory or has no queue.
    #[error("unknown destination: {0}")]
    UnknownDestination(DestinationId),
    /// Capacity probe could not reach the destination.
    #[error("destination {destination} unreachable: {reason}")]
    Unreachable {
        /// Destination that failed to answer.
        destination: DestinationId,
        /// Collaborator supplied reason.
        reason: String,
    },
    /// Destination refused the connect attempt.
    #[error("connect rejected for {client}: {reason}")]
    ConnectRejected {
        /// Client whose attempt was refused.
        client: ClientId,
        /// Collaborator supplied reason.
        reason: String,
    },
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Runtime construction or spawning failure.
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
