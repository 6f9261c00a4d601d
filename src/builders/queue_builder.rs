//! Builders to construct a join queue from configuration.

use tokio::runtime::Runtime;

use crate::config::QueueConfig;
use crate::core::{Collaborators, JoinQueue, QueueError, Spawn};
use crate::runtime::TokioSpawner;

/// Validate configuration and wire a queue onto an existing spawner.
pub fn build_join_queue<S>(
    cfg: &QueueConfig,
    collaborators: Collaborators,
    spawner: S,
) -> Result<JoinQueue<S>, QueueError>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    cfg.validate().map_err(QueueError::InvalidConfig)?;
    let queue = JoinQueue::new(cfg, collaborators, spawner);
    tracing::info!(
        destinations = ?queue.store().destinations(),
        shared = queue.store().is_shared(),
        tick_period_ms = cfg.tick_period_ms,
        candidates_per_tick = cfg.candidates_per_tick,
        "join queue built"
    );
    Ok(queue)
}

/// Like [`build_join_queue`], on a dedicated runtime with `worker_threads`
/// threads. The returned runtime is the worker pool; keep it alive for as long
/// as the queue is used.
pub fn build_join_queue_with_runtime(
    cfg: &QueueConfig,
    collaborators: Collaborators,
) -> Result<(JoinQueue<TokioSpawner>, Runtime), QueueError> {
    cfg.validate().map_err(QueueError::InvalidConfig)?;
    let (runtime, spawner) = TokioSpawner::with_worker_threads(cfg.worker_threads)
        .map_err(|e| QueueError::Runtime(format!("worker pool: {e}")))?;
    let queue = build_join_queue(cfg, collaborators, spawner)?;
    Ok((queue, runtime))
}
