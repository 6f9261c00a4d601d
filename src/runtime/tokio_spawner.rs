//! Tokio runtime spawner implementation.

use std::future::Future;

use crate::core::Spawn;

/// Tokio-based spawner that executes tasks on a tokio runtime.
#[derive(Clone)]
pub struct TokioSpawner {
    handle: tokio::runtime::Handle,
}

impl TokioSpawner {
    /// Create a new `TokioSpawner` from a tokio runtime handle.
    #[must_use]
    pub const fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Create a multi-threaded runtime with the specified worker threads and a
    /// spawner bound to it.
    ///
    /// The caller owns the runtime and must drop it outside of any async
    /// context; spawned admission loops stop when it shuts down.
    pub fn with_worker_threads(
        worker_threads: usize,
    ) -> Result<(tokio::runtime::Runtime, Self), std::io::Error> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads)
            .thread_name("join-queue-worker")
            .enable_all()
            .build()?;
        let spawner = Self::new(runtime.handle().clone());
        Ok((runtime, spawner))
    }

    /// Handle of the runtime tasks are spawned on.
    #[must_use]
    pub const fn handle(&self) -> &tokio::runtime::Handle {
        &self.handle
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(fut);
    }
}
