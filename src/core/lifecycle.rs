//! Enabled/disabled state plus the orthogonal pause flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::collaborators::DestinationDirectory;
use crate::core::queue_store::QueueStore;
use crate::util::serde::DestinationId;

/// Governs whether arrivals queue at all and whether the scheduler drains.
pub struct LifecycleController {
    enabled: AtomicBool,
    paused: AtomicBool,
    // Held across a flag change and the store change that goes with it.
    transition: Mutex<()>,
    configured: Vec<DestinationId>,
    directory: Arc<dyn DestinationDirectory>,
    store: Arc<QueueStore>,
}

impl LifecycleController {
    /// Create a controller and initialize sequences for every resolvable destination.
    pub fn new(
        configured: Vec<DestinationId>,
        directory: Arc<dyn DestinationDirectory>,
        store: Arc<QueueStore>,
    ) -> Self {
        let controller = Self {
            enabled: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            transition: Mutex::new(()),
            configured,
            directory,
            store,
        };
        controller.enable();
        controller
    }

    /// Whether arrivals are queued.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Whether admission ticks are suspended.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Re-derive destinations from configuration and open empty sequences for
    /// them. Previously cleared clients are not restored. Returns the
    /// destinations that now have a queue.
    pub fn enable(&self) -> Vec<DestinationId> {
        let resolved: Vec<DestinationId> = self
            .configured
            .iter()
            .filter(|destination| {
                let exists = self.directory.exists(destination);
                if !exists {
                    tracing::warn!(%destination, "configured destination not found, not queued");
                }
                exists
            })
            .cloned()
            .collect();
        let _transition = self.transition.lock();
        self.store.reset(&resolved);
        for destination in &resolved {
            tracing::info!(%destination, "queue enabled for destination");
        }
        self.enabled.store(true, Ordering::Release);
        resolved
    }

    /// Drop every queue and registration immediately. Clients with a connect
    /// attempt in flight are no longer tracked; their outcome is ignored.
    pub fn disable(&self) {
        let _transition = self.transition.lock();
        self.enabled.store(false, Ordering::Release);
        let dropped = self.store.clear();
        tracing::info!(dropped, "queue disabled, waiting clients dropped");
    }

    /// Stop draining. Arrivals keep queuing.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
        tracing::info!("queue paused");
    }

    /// Resume draining.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        tracing::info!("queue resumed");
    }
}
