//! Tests for configuration validation

use join_queue::config::{QueueConfig, TierConfig, CONFIG_PATH_ENV};

fn valid() -> QueueConfig {
    QueueConfig {
        destinations: vec!["survival".into()],
        tick_period_ms: 500,
        candidates_per_tick: 2,
        worker_threads: 2,
        tiers: vec![TierConfig::new("vip", Some(10))],
        ..QueueConfig::default()
    }
}

#[test]
fn test_queue_config_validation() {
    assert!(valid().validate().is_ok());
}

#[test]
fn test_queue_config_requires_destinations() {
    let cfg = QueueConfig {
        destinations: Vec::new(),
        ..valid()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_queue_config_invalid_tick_period() {
    let cfg = QueueConfig {
        tick_period_ms: 0,
        ..valid()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_queue_config_invalid_candidates() {
    let cfg = QueueConfig {
        candidates_per_tick: 0,
        ..valid()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_queue_config_invalid_workers() {
    let cfg = QueueConfig {
        worker_threads: 0,
        ..valid()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_queue_config_from_json() {
    let json = r#"{
        "destinations": ["survival", "creative"],
        "shared_queue": true,
        "tick_period_ms": 250,
        "candidates_per_tick": 3,
        "worker_threads": 4,
        "tiers": [
            {"name": "admin", "weight": 100},
            {"name": "default"}
        ],
        "bypass_permission": "queue.skip",
        "allowed_origins": ["lobby"]
    }"#;

    let cfg = QueueConfig::from_json_str(json).expect("valid json config");
    assert!(cfg.shared_queue);
    assert_eq!(cfg.destinations.len(), 2);
    assert_eq!(cfg.tiers[1].weight, None);
    assert_eq!(cfg.bypass_permission, "queue.skip");
    assert_eq!(cfg.priority_permission_prefix, "joinqueue.priority.");
    assert!(!cfg.announce_positions);
}

#[test]
fn test_queue_config_from_json_rejects_garbage() {
    assert!(QueueConfig::from_json_str("{").is_err());
    assert!(QueueConfig::from_json_str(r#"{"destinations": []}"#).is_err());
}

#[test]
fn test_queue_config_load_from_file() {
    let path = std::env::temp_dir().join(format!("join-queue-config-{}.json", std::process::id()));
    std::fs::write(&path, serde_json::to_string(&valid()).unwrap()).unwrap();
    let cfg = QueueConfig::load(&path).expect("config file loads");
    assert_eq!(cfg.tick_period_ms, 500);
    std::fs::remove_file(&path).unwrap();

    let missing = QueueConfig::load(&path).unwrap_err();
    assert!(format!("{missing:#}").contains("reading queue config"));
}

#[test]
fn test_config_from_env_reads_named_file() {
    assert_eq!(CONFIG_PATH_ENV, "JOIN_QUEUE_CONFIG");
    let path = std::env::temp_dir().join(format!("join-queue-env-{}.json", std::process::id()));
    std::fs::write(&path, serde_json::to_string(&valid()).unwrap()).unwrap();

    std::env::set_var(CONFIG_PATH_ENV, &path);
    let cfg = QueueConfig::from_env().expect("config named by env loads");
    assert_eq!(cfg.tick_period_ms, 500);

    std::env::remove_var(CONFIG_PATH_ENV);
    let unset = QueueConfig::from_env().unwrap_err();
    assert!(format!("{unset:#}").contains("JOIN_QUEUE_CONFIG is not set"));
    std::fs::remove_file(&path).unwrap();
}
