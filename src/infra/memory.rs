//! In-memory authorizer, prober, and connector for development and testing.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::core::{Authorizer, Capacity, CapacityProber, Connector, QueueError};
use crate::util::serde::{ClientId, DestinationId};

/// Authorizer backed by an explicit permission table.
#[derive(Debug, Default)]
pub struct StaticAuthorizer {
    grants: Mutex<HashMap<ClientId, HashSet<String>>>,
}

impl StaticAuthorizer {
    /// Create an authorizer with no grants.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `permission` to `client`.
    pub fn grant(&self, client: impl Into<ClientId>, permission: impl Into<String>) {
        self.grants
            .lock()
            .entry(client.into())
            .or_default()
            .insert(permission.into());
    }

    /// Revoke `permission` from `client`.
    pub fn revoke(&self, client: &ClientId, permission: &str) {
        if let Some(perms) = self.grants.lock().get_mut(client) {
            perms.remove(permission);
        }
    }
}

impl Authorizer for StaticAuthorizer {
    fn is_authorized(&self, client: &ClientId, permission: &str) -> bool {
        self.grants
            .lock()
            .get(client)
            .is_some_and(|perms| perms.contains(permission))
    }
}

#[derive(Debug, Clone)]
enum ProbeScript {
    Answer(Capacity),
    Fail(String),
}

/// Prober answering from a per-destination script. Unscripted destinations
/// fail with [`QueueError::UnknownDestination`].
#[derive(Debug, Default)]
pub struct ScriptedProber {
    scripts: Mutex<HashMap<DestinationId, ProbeScript>>,
    probes: Mutex<HashMap<DestinationId, usize>>,
}

impl ScriptedProber {
    /// Create a prober with no scripted destinations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer probes for `destination` with the given occupancy.
    pub fn set_capacity(&self, destination: impl Into<DestinationId>, online: u32, max: u32) {
        self.scripts
            .lock()
            .insert(destination.into(), ProbeScript::Answer(Capacity { online, max }));
    }

    /// Fail probes for `destination`.
    pub fn set_unreachable(&self, destination: impl Into<DestinationId>, reason: impl Into<String>) {
        self.scripts
            .lock()
            .insert(destination.into(), ProbeScript::Fail(reason.into()));
    }

    /// Number of probes issued against `destination`.
    pub fn probe_count(&self, destination: &DestinationId) -> usize {
        self.probes.lock().get(destination).copied().unwrap_or(0)
    }
}

#[async_trait]
impl CapacityProber for ScriptedProber {
    async fn probe(&self, destination: &DestinationId) -> Result<Capacity, QueueError> {
        *self.probes.lock().entry(destination.clone()).or_default() += 1;
        let script = self.scripts.lock().get(destination).cloned();
        match script {
            Some(ProbeScript::Answer(capacity)) => Ok(capacity),
            Some(ProbeScript::Fail(reason)) => Err(QueueError::Unreachable {
                destination: destination.clone(),
                reason,
            }),
            None => Err(QueueError::UnknownDestination(destination.clone())),
        }
    }
}

/// Connector that records attempts, can reject chosen clients, and can hold
/// every attempt open until released.
pub struct RecordingConnector {
    rejected: Mutex<HashSet<ClientId>>,
    attempts: Mutex<Vec<(ClientId, DestinationId)>>,
    connected: Mutex<Vec<(ClientId, DestinationId)>>,
    gate: watch::Sender<bool>,
}

impl Default for RecordingConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingConnector {
    /// Create a connector that accepts everyone immediately.
    #[must_use]
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            rejected: Mutex::new(HashSet::new()),
            attempts: Mutex::new(Vec::new()),
            connected: Mutex::new(Vec::new()),
            gate,
        }
    }

    /// Refuse future attempts by `client`.
    pub fn reject(&self, client: impl Into<ClientId>) {
        self.rejected.lock().insert(client.into());
    }

    /// Accept future attempts by `client` again.
    pub fn accept(&self, client: &ClientId) {
        self.rejected.lock().remove(client);
    }

    /// Park new and pending attempts until [`RecordingConnector::release`].
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    /// Let parked attempts finish.
    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Every attempt seen, in order.
    pub fn attempts(&self) -> Vec<(ClientId, DestinationId)> {
        self.attempts.lock().clone()
    }

    /// Successful connections, in completion order.
    pub fn connected(&self) -> Vec<(ClientId, DestinationId)> {
        self.connected.lock().clone()
    }
}

#[async_trait]
impl Connector for RecordingConnector {
    async fn connect(&self, client: &ClientId, destination: &DestinationId) -> Result<(), QueueError> {
        self.attempts.lock().push((client.clone(), destination.clone()));
        let mut gate = self.gate.subscribe();
        let opened = gate.wait_for(|open| *open).await.is_ok();
        if !opened {
            return Err(QueueError::Runtime("connector dropped".into()));
        }
        if self.rejected.lock().contains(client) {
            return Err(QueueError::ConnectRejected {
                client: client.clone(),
                reason: "destination refused the client".into(),
            });
        }
        self.connected.lock().push((client.clone(), destination.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorizer_grant_and_revoke() {
        let auth = StaticAuthorizer::new();
        let client = ClientId::new("p1");
        auth.grant("p1", "joinqueue.bypass");
        assert!(auth.is_authorized(&client, "joinqueue.bypass"));
        auth.revoke(&client, "joinqueue.bypass");
        assert!(!auth.is_authorized(&client, "joinqueue.bypass"));
    }

    #[tokio::test]
    async fn prober_counts_and_scripts() {
        let prober = ScriptedProber::new();
        let a = DestinationId::new("a");
        assert!(prober.probe(&a).await.is_err());
        prober.set_capacity("a", 1, 4);
        assert_eq!(prober.probe(&a).await.unwrap(), Capacity { online: 1, max: 4 });
        assert_eq!(prober.probe_count(&a), 2);
    }

    #[tokio::test]
    async fn connector_rejects_listed_clients() {
        let connector = RecordingConnector::new();
        connector.reject("p2");
        let a = DestinationId::new("a");
        assert!(connector.connect(&"p1".into(), &a).await.is_ok());
        assert!(connector.connect(&"p2".into(), &a).await.is_err());
        assert_eq!(connector.attempts().len(), 2);
        assert_eq!(connector.connected(), vec![(ClientId::new("p1"), a.clone())]);

        connector.accept(&"p2".into());
        assert!(connector.connect(&"p2".into(), &a).await.is_ok());
        assert_eq!(connector.connected().len(), 2);
    }
}
