//! Queue configuration structures.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;
use crate::util::serde::DestinationId;

/// Environment variable naming the JSON config file read by [`QueueConfig::from_env`].
pub const CONFIG_PATH_ENV: &str = "JOIN_QUEUE_CONFIG";

/// One priority tier. Tiers are matched in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Tier name, appended to the permission prefix.
    pub name: String,
    /// Ordering weight; treated as 0 when unset.
    #[serde(default)]
    pub weight: Option<i32>,
}

impl TierConfig {
    /// Build a tier entry.
    pub fn new(name: impl Into<String>, weight: Option<i32>) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

/// Root queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Destinations that get a queue.
    pub destinations: Vec<DestinationId>,
    /// Alias every destination to a single sequence.
    #[serde(default)]
    pub shared_queue: bool,
    /// Admission tick period per destination, in milliseconds.
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,
    /// Candidates attempted per tick.
    #[serde(default = "default_candidates_per_tick")]
    pub candidates_per_tick: usize,
    /// Worker threads driving ticks, probes, and connects.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// Priority tiers, highest privilege first.
    #[serde(default)]
    pub tiers: Vec<TierConfig>,
    /// Prefix of the per-tier permission key.
    #[serde(default = "default_priority_permission_prefix")]
    pub priority_permission_prefix: String,
    /// Permission that skips the queue entirely.
    #[serde(default = "default_bypass_permission")]
    pub bypass_permission: String,
    /// Origins a client must currently be on to queue. Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Send a position update to every waiting client after a tick admits someone.
    #[serde(default)]
    pub announce_positions: bool,
}

const fn default_tick_period_ms() -> u64 {
    1_000
}

const fn default_candidates_per_tick() -> usize {
    1
}

fn default_worker_threads() -> usize {
    num_cpus::get().max(1)
}

fn default_priority_permission_prefix() -> String {
    "joinqueue.priority.".into()
}

fn default_bypass_permission() -> String {
    "joinqueue.bypass".into()
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            destinations: Vec::new(),
            shared_queue: false,
            tick_period_ms: default_tick_period_ms(),
            candidates_per_tick: default_candidates_per_tick(),
            worker_threads: default_worker_threads(),
            tiers: Vec::new(),
            priority_permission_prefix: default_priority_permission_prefix(),
            bypass_permission: default_bypass_permission(),
            allowed_origins: Vec::new(),
            announce_positions: false,
        }
    }
}

impl QueueConfig {
    /// Tick period as a `Duration`.
    #[must_use]
    pub const fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.destinations.is_empty() {
            return Err("at least one destination must be defined".into());
        }
        if self.tick_period_ms == 0 {
            return Err("tick_period_ms must be greater than 0".into());
        }
        if self.candidates_per_tick == 0 {
            return Err("candidates_per_tick must be greater than 0".into());
        }
        if self.worker_threads == 0 {
            return Err("worker_threads must be greater than 0".into());
        }
        let mut seen = std::collections::HashSet::new();
        for tier in &self.tiers {
            if tier.name.is_empty() {
                return Err("tier names must not be empty".into());
            }
            if !seen.insert(tier.name.as_str()) {
                return Err(format!("tier `{}` declared twice", tier.name));
            }
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading queue config {}", path.display()))?;
        Self::from_json_str(&raw)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("loading queue config {}", path.display()))
    }

    /// Load the file named by `JOIN_QUEUE_CONFIG`, honoring a `.env` file if present.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        let path = std::env::var(CONFIG_PATH_ENV)
            .with_context(|| format!("{CONFIG_PATH_ENV} is not set"))?;
        Self::load(path)
    }
}
