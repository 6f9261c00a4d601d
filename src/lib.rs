//! # Join Queue
//!
//! A priority join queue that admits waiting clients into capacity-limited
//! destination services without overshooting their capacity.
//!
//! Clients that cannot join a destination right away wait in a per-destination
//! sequence ordered by tier weight, first come first served within a tier. A
//! recurring admission pass per destination probes the destination once, and
//! when it reports free slots, hands the front of the line to the connector.
//!
//! ## Key Features
//!
//! - **Priority Tiers**: Permission-driven tiers with configurable weights
//! - **At-Most-Once Membership**: A client holds at most one wait slot system-wide
//! - **Non-Blocking Admission**: Probes and connects run on the worker pool
//! - **Lifecycle Control**: Enable/disable, pause/resume, and permission bypass
//! - **Shared Queue Mode**: Optionally alias all destinations to one line
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use join_queue::builders::build_join_queue;
//! use join_queue::config::QueueConfig;
//! use join_queue::core::{ArrivalEvent, Collaborators, TracingNotificationSink};
//! use join_queue::runtime::TokioSpawner;
//!
//! let cfg = QueueConfig::from_env()?;
//! let queue = build_join_queue(
//!     &cfg,
//!     Collaborators {
//!         directory: Arc::new(my_directory),
//!         authorizer: Arc::new(my_permissions),
//!         prober: Arc::new(my_pinger),
//!         connector: Arc::new(my_proxy),
//!         sink: Arc::new(TracingNotificationSink),
//!     },
//!     TokioSpawner::new(tokio::runtime::Handle::current()),
//! )?;
//! queue.start();
//!
//! let outcome = queue.on_arrival(ArrivalEvent::new("steve", "survival").from_origin("lobby-1"));
//! ```
//!
//! For complete scenarios, see `tests/admission_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Queue domain, admission scheduling, and collaborator seams.
pub mod core;
/// Configuration models for destinations, tiers, and cadence.
pub mod config;
/// Builders to construct a queue from configuration.
pub mod builders;
/// In-memory adapters for external collaborators.
pub mod infra;
/// Runtime adapters and management API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
