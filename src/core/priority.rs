//! Priority tiers and the classifier that assigns them.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::config::TierConfig;
use crate::util::serde::ClientId;

/// Name given to the fallback tier when no tiers are configured.
pub const DEFAULT_TIER_NAME: &str = "default";

/// A named tier with its ordering weight. Higher weight is served first.
///
/// Two priorities compare by weight only; the name is informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Priority {
    /// Tier name as declared in configuration.
    pub name: String,
    /// Ordering weight.
    pub weight: i32,
}

impl Priority {
    /// Build a priority value.
    pub fn new(name: impl Into<String>, weight: i32) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

impl PartialEq for Priority {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight
    }
}

impl Eq for Priority {}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight.cmp(&other.weight)
    }
}

/// Permission lookup consulted for tier classification and bypass checks.
pub trait Authorizer: Send + Sync {
    /// Whether `client` holds `permission`.
    fn is_authorized(&self, client: &ClientId, permission: &str) -> bool;
}

/// Maps a client onto the first configured tier it is authorized for.
#[derive(Debug, Clone)]
pub struct PriorityClassifier {
    tiers: Vec<TierConfig>,
    permission_prefix: String,
}

impl PriorityClassifier {
    /// Create a classifier over tiers in declared order.
    pub fn new(tiers: Vec<TierConfig>, permission_prefix: impl Into<String>) -> Self {
        Self {
            tiers,
            permission_prefix: permission_prefix.into(),
        }
    }

    /// Permission key guarding `tier`.
    #[must_use]
    pub fn permission_for(&self, tier: &str) -> String {
        format!("{}{tier}", self.permission_prefix)
    }

    /// Classify `client`. Falls back to the last declared tier, or to a
    /// zero-weight default when no tiers are configured.
    pub fn classify(&self, client: &ClientId, authorizer: &dyn Authorizer) -> Priority {
        for tier in &self.tiers {
            if authorizer.is_authorized(client, &self.permission_for(&tier.name)) {
                return Priority::new(tier.name.clone(), tier.weight.unwrap_or(0));
            }
        }
        self.tiers.last().map_or_else(
            || Priority::new(DEFAULT_TIER_NAME, 0),
            |last| Priority::new(last.name.clone(), last.weight.unwrap_or(0)),
        )
    }
}
