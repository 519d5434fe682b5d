//! Scenario: `vda replay`
//!
//! # Invariants under test
//!
//! 1. Recorded events drive the controller to the printed final state.
//! 2. A rejected event does not stop the replay; it shows up in `errors`.
//! 3. Unused config keys are warned about, not fatal, in replay mode.
//! 4. A config without the vehicle identity is refused.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, body: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path.to_string_lossy().to_string()
}

fn order_event(order_update_id: u32) -> Value {
    json!({"order": {
        "orderId": "O-1",
        "orderUpdateId": order_update_id,
        "nodes": [
            {"nodeId": "n0", "sequenceId": 0, "released": true},
            {"nodeId": "n1", "sequenceId": 2, "released": true, "actions": [
                {"actionId": "pick-1", "actionType": "pick", "blockingType": "HARD"}
            ]},
            {"nodeId": "n2", "sequenceId": 4, "released": true}
        ],
        "edges": [
            {"edgeId": "e0", "sequenceId": 1, "released": true, "startNodeId": "n0", "endNodeId": "n1"},
            {"edgeId": "e1", "sequenceId": 3, "released": true, "startNodeId": "n1", "endNodeId": "n2"}
        ]
    }})
}

fn events() -> Value {
    json!([
        order_event(0),
        {"progress": {
            "orderId": "O-1",
            "lastNodeId": "n0",
            "lastNodeSequenceId": 0,
            "nodeStates": [
                {"nodeId": "n1", "sequenceId": 2, "released": true},
                {"nodeId": "n2", "sequenceId": 4, "released": true}
            ],
            "edgeStates": [
                {"edgeId": "e0", "sequenceId": 1, "released": true},
                {"edgeId": "e1", "sequenceId": 3, "released": true}
            ],
            "actionStates": [{"actionId": "pick-1", "actionStatus": "RUNNING"}],
            "batteryState": {"batteryCharge": 87.5, "charging": false}
        }},
        // Resent update 0 is rejected as stale.
        order_event(0)
    ])
}

const CONFIG: &str = "vehicle:\n  manufacturer: acme\n  serial_number: agv-7\nsite:\n  name: hall-3\n";

#[test]
fn replay_prints_final_state() {
    let dir = TempDir::new().unwrap();
    let cfg = write(&dir, "vehicle.yaml", CONFIG);
    let events = write(&dir, "events.json", &events().to_string());

    let out = Command::cargo_bin("vda")
        .unwrap()
        .args(["replay", "--config", &cfg, &events])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let state: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(state["orderId"], json!("O-1"));
    assert_eq!(state["manufacturer"], json!("acme"));
    assert_eq!(state["serialNumber"], json!("agv-7"));
    assert_eq!(state["lastNodeId"], json!("n0"));
    assert_eq!(state["nodeStates"].as_array().unwrap().len(), 2);
    assert_eq!(state["actionStates"][0]["actionStatus"], json!("RUNNING"));
    assert_eq!(state["batteryState"]["batteryCharge"], json!(87.5));

    let errors = state["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["errorType"], json!("orderUpdateIdError"));
    assert_eq!(errors[0]["errorLevel"], json!("WARNING"));

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("CONFIG_UNUSED_KEYS mode=REPLAY"));
    assert!(stderr.contains("unused=/site/name"));
    assert!(stderr.contains("replay_events=3 rejected=1"));
}

#[test]
fn missing_identity_is_refused() {
    let dir = TempDir::new().unwrap();
    let cfg = write(&dir, "vehicle.yaml", "vehicle:\n  manufacturer: acme\n");
    let events = write(&dir, "events.json", "[]");

    Command::cargo_bin("vda")
        .unwrap()
        .args(["replay", "--config", &cfg, &events])
        .assert()
        .failure()
        .stderr(predicate::str::contains("connector config invalid"));
}
