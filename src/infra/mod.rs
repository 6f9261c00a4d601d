//! In-memory adapters for the queue's external collaborators.

pub mod memory;

pub use memory::{RecordingConnector, ScriptedProber, StaticAuthorizer};
