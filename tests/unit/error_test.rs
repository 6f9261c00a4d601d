//! Tests for error types

use join_queue::core::QueueError;
use join_queue::util::{ClientId, DestinationId};

#[test]
fn test_unknown_destination_error() {
    let err = QueueError::UnknownDestination(DestinationId::new("survival"));
    assert_eq!(format!("{err}"), "unknown destination: survival");
}

#[test]
fn test_unreachable_error() {
    let err = QueueError::Unreachable {
        destination: DestinationId::new("survival"),
        reason: "timed out".to_string(),
    };
    assert_eq!(format!("{err}"), "destination survival unreachable: timed out");
}

#[test]
fn test_connect_rejected_error() {
    let err = QueueError::ConnectRejected {
        client: ClientId::new("steve"),
        reason: "banned".to_string(),
    };
    assert_eq!(format!("{err}"), "connect rejected for steve: banned");
}

#[test]
fn test_invalid_config_error() {
    let err = QueueError::InvalidConfig("no destinations".to_string());
    assert_eq!(format!("{err}"), "invalid configuration: no destinations");
}
