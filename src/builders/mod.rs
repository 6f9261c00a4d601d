//! Builders to construct queues from configuration.

pub mod queue_builder;

pub use queue_builder::{build_join_queue, build_join_queue_with_runtime};
