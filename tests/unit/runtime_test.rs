//! Tests for tokio spawner utilities and management responses

use join_queue::core::{ArrivalEvent, ArrivalOutcome, Spawn};
use join_queue::runtime::tokio_spawner::TokioSpawner;
use join_queue::runtime::{position, queue_snapshot, status, submit_arrival};
use join_queue::util::{ClientId, DestinationId};

use crate::common;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[test]
fn test_tokio_spawner_with_worker_threads() {
    let (runtime, spawner) = TokioSpawner::with_worker_threads(2).expect("runtime builds");
    assert_eq!(spawner.handle().metrics().num_workers(), 2);

    let (tx, rx) = std::sync::mpsc::channel();
    spawner.spawn(async move {
        tx.send(7).unwrap();
    });
    assert_eq!(rx.recv_timeout(std::time::Duration::from_secs(2)).unwrap(), 7);
    drop(runtime);
}

#[tokio::test]
async fn test_management_responses_serialize() {
    let h = common::harness(&common::config());
    let outcome = submit_arrival(&h.queue, ArrivalEvent::new("steve", "A"));
    assert!(matches!(outcome, ArrivalOutcome::Queued { position: 1, .. }));

    let found = position(&h.queue, &ClientId::new("steve"));
    assert_eq!(found.position, Some(1));
    let missing = position(&h.queue, &ClientId::new("alex"));
    assert_eq!(missing.position, None);

    let snapshot = queue_snapshot(&h.queue, &DestinationId::new("A"));
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["destination"], "A");
    assert_eq!(json["state"], "idle");
    assert_eq!(json["clients"][0]["client"], "steve");
    assert_eq!(json["clients"][0]["connecting"], false);

    let overall = status(&h.queue);
    assert!(overall.enabled);
    assert!(!overall.paused);
    assert_eq!(overall.queues.get(&DestinationId::new("A")), Some(&1));
    assert_eq!(overall.queues.get(&DestinationId::new("B")), Some(&0));
}

#[test]
fn test_init_tracing_is_idempotent() {
    join_queue::util::init_tracing();
    join_queue::util::init_tracing();
    assert!(tracing::dispatcher::has_been_set());
}
