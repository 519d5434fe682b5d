//! Scenario: Unused keys warn or fail per policy
//!
//! # Invariants under test
//!
//! 1. Warn policy reports unused leaves without erroring.
//! 2. Fail policy errors with CONFIG_UNUSED_KEYS.
//! 3. Every key `ConnectorConfig` reads is consumed in Connector mode.
//! 4. `/runtime` keys are unused in Replay mode.
//! 5. Unused pointers are sorted.

use vda_config::{load_layered_yaml_from_strings, report_unused_keys, ConfigMode, UnusedKeyPolicy};

const FULL: &str = r#"
vehicle:
  manufacturer: "acme"
  serial_number: "agv-7"
  protocol_version: "2.0.0"
navigation:
  deviation_radius_m: 0.5
  deviation_theta_rad: 0.1
runtime:
  queue_capacity: 64
  state_publish_interval_ms: 500
"#;

#[test]
fn connector_mode_consumes_every_known_key() {
    let loaded = load_layered_yaml_from_strings(&[FULL]).unwrap();
    let report =
        report_unused_keys(ConfigMode::Connector, &loaded.config_json, UnusedKeyPolicy::Fail)
            .unwrap();
    assert!(report.is_clean(), "{:?}", report.unused_leaf_pointers);
}

#[test]
fn replay_mode_flags_runtime_keys() {
    let loaded = load_layered_yaml_from_strings(&[FULL]).unwrap();
    let report =
        report_unused_keys(ConfigMode::Replay, &loaded.config_json, UnusedKeyPolicy::Warn)
            .unwrap();
    assert_eq!(
        report.unused_leaf_pointers,
        vec![
            "/runtime/queue_capacity".to_string(),
            "/runtime/state_publish_interval_ms".to_string()
        ]
    );
}

#[test]
fn fail_policy_errors_on_unknown_section() {
    let yaml = format!("{FULL}\nmqtt:\n  host: \"broker.local\"\n");
    let loaded = load_layered_yaml_from_strings(&[&yaml]).unwrap();

    let warn =
        report_unused_keys(ConfigMode::Connector, &loaded.config_json, UnusedKeyPolicy::Warn)
            .unwrap();
    assert_eq!(warn.unused_leaf_pointers, vec!["/mqtt/host".to_string()]);

    let err =
        report_unused_keys(ConfigMode::Connector, &loaded.config_json, UnusedKeyPolicy::Fail)
            .unwrap_err();
    assert!(format!("{err:?}").contains("CONFIG_UNUSED_KEYS"));
}

#[test]
fn unused_pointers_are_sorted() {
    let loaded = load_layered_yaml_from_strings(&["unused:\n  b: 2\n  a: 1\n"]).unwrap();
    let report =
        report_unused_keys(ConfigMode::Replay, &loaded.config_json, UnusedKeyPolicy::Warn)
            .unwrap();
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/unused/a".to_string(), "/unused/b".to_string()]
    );
}
