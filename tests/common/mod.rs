//! Shared harness for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use join_queue::config::{QueueConfig, TierConfig};
use join_queue::core::{ArrivalEvent, ArrivalOutcome, Collaborators, InMemoryNotificationSink, JoinQueue};
use join_queue::infra::{RecordingConnector, ScriptedProber, StaticAuthorizer};
use join_queue::runtime::TokioSpawner;
use join_queue::util::DestinationId;

pub const VIP: &str = "joinqueue.priority.vip";
pub const MEMBER: &str = "joinqueue.priority.member";
pub const BYPASS: &str = "joinqueue.bypass";

pub struct Harness {
    pub queue: JoinQueue<TokioSpawner>,
    pub authorizer: Arc<StaticAuthorizer>,
    pub prober: Arc<ScriptedProber>,
    pub connector: Arc<RecordingConnector>,
    pub sink: Arc<InMemoryNotificationSink>,
}

impl Harness {
    /// Queue `client` on `destination`, granting `permission` first if given.
    pub fn arrive(&self, client: &str, destination: &str, permission: Option<&str>) -> ArrivalOutcome {
        if let Some(permission) = permission {
            self.authorizer.grant(client, permission);
        }
        self.queue.on_arrival(ArrivalEvent::new(client, destination))
    }

    /// Client names waiting on `destination`, front first.
    pub fn order(&self, destination: &str) -> Vec<String> {
        self.queue
            .queue_snapshot(&DestinationId::new(destination))
            .into_iter()
            .map(|w| w.client.as_str().to_owned())
            .collect()
    }

    /// Names of clients the connector let through.
    pub fn connected(&self) -> Vec<String> {
        self.connector
            .connected()
            .into_iter()
            .map(|(client, _)| client.as_str().to_owned())
            .collect()
    }
}

/// Destinations `A` and `B`, plus `ghost` which the directory does not know.
/// The tick period is long enough that loops never fire on their own.
pub fn config() -> QueueConfig {
    QueueConfig {
        destinations: vec!["A".into(), "B".into(), "ghost".into()],
        tick_period_ms: 3_600_000,
        candidates_per_tick: 2,
        worker_threads: 2,
        tiers: vec![
            TierConfig::new("vip", Some(10)),
            TierConfig::new("member", Some(5)),
        ],
        ..QueueConfig::default()
    }
}

/// Build a harness on the current tokio runtime.
pub fn harness(cfg: &QueueConfig) -> Harness {
    let authorizer = Arc::new(StaticAuthorizer::new());
    let prober = Arc::new(ScriptedProber::new());
    let connector = Arc::new(RecordingConnector::new());
    let sink = Arc::new(InMemoryNotificationSink::new(1_000));
    let directory: HashSet<DestinationId> = ["A", "B"].into_iter().map(DestinationId::new).collect();
    let queue = join_queue::builders::build_join_queue(
        cfg,
        Collaborators {
            directory: Arc::new(directory),
            authorizer: authorizer.clone(),
            prober: prober.clone(),
            connector: connector.clone(),
            sink: sink.clone(),
        },
        TokioSpawner::new(tokio::runtime::Handle::current()),
    )
    .expect("valid config");
    Harness {
        queue,
        authorizer,
        prober,
        connector,
        sink,
    }
}

/// Poll `check` for up to two seconds.
pub async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
