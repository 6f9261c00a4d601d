//! Tests for queue builders

use std::sync::Arc;

use join_queue::builders::{build_join_queue, build_join_queue_with_runtime};
use join_queue::config::QueueConfig;
use join_queue::core::{Collaborators, QueueError, TracingNotificationSink};
use join_queue::infra::{RecordingConnector, ScriptedProber, StaticAuthorizer};
use join_queue::runtime::TokioSpawner;
use join_queue::util::DestinationId;

fn collaborators() -> Collaborators {
    Collaborators {
        directory: Arc::new(|destination: &DestinationId| destination.as_str() != "missing"),
        authorizer: Arc::new(StaticAuthorizer::new()),
        prober: Arc::new(ScriptedProber::new()),
        connector: Arc::new(RecordingConnector::new()),
        sink: Arc::new(TracingNotificationSink),
    }
}

#[tokio::test]
async fn test_build_skips_missing_destinations() {
    let cfg = QueueConfig {
        destinations: vec!["survival".into(), "missing".into()],
        ..QueueConfig::default()
    };
    let queue = build_join_queue(
        &cfg,
        collaborators(),
        TokioSpawner::new(tokio::runtime::Handle::current()),
    )
    .expect("queue builds");
    assert_eq!(queue.store().destinations(), vec![DestinationId::new("survival")]);
    assert!(queue.is_enabled());
    assert!(!queue.is_paused());
}

#[tokio::test]
async fn test_build_rejects_invalid_config() {
    let cfg = QueueConfig::default();
    let result = build_join_queue(
        &cfg,
        collaborators(),
        TokioSpawner::new(tokio::runtime::Handle::current()),
    );
    assert!(matches!(result, Err(QueueError::InvalidConfig(_))));
}

#[test]
fn test_build_with_dedicated_runtime() {
    let cfg = QueueConfig {
        destinations: vec!["survival".into()],
        worker_threads: 1,
        ..QueueConfig::default()
    };
    let (queue, runtime) = build_join_queue_with_runtime(&cfg, collaborators()).expect("queue builds");
    assert_eq!(queue.start(), vec![DestinationId::new("survival")]);
    queue.shutdown();
    drop(queue);
    runtime.shutdown_timeout(std::time::Duration::from_secs(1));
}
