//! Configuration models for destinations, tiers, and scheduling cadence.

pub mod queue;

pub use queue::{QueueConfig, TierConfig, CONFIG_PATH_ENV};
