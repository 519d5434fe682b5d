//! Scenario: VDA 5050 wire format
//!
//! # Invariants under test
//!
//! 1. A realistic order JSON parses with the header flattened into the body.
//! 2. Omitted optional fields default instead of failing.
//! 3. Instant actions accept both `actions` and the 1.x `instantActions` key.
//! 4. A state message serializes camelCase keys and upper-case enum literals,
//!    and leaves out unset optional fields.

use serde_json::json;
use vda_schemas::{
    ActionStatus, BlockingType, ErrorEntry, ErrorLevel, InstantActionsMessage, OperatingMode,
    OrderMessage, StateMessage,
};

const ORDER_JSON: &str = r#"{
  "headerId": 12,
  "timestamp": "2024-05-01T08:30:00.000Z",
  "version": "2.0.0",
  "manufacturer": "acme",
  "serialNumber": "agv-7",
  "orderId": "O-1001",
  "orderUpdateId": 0,
  "nodes": [
    {
      "nodeId": "dock",
      "sequenceId": 0,
      "released": true,
      "nodePosition": {"x": 1.0, "y": 2.0, "theta": 0.0, "allowedDeviationXY": 0.1, "mapId": "hall"},
      "actions": []
    },
    {
      "nodeId": "rack-4",
      "sequenceId": 2,
      "released": true,
      "actions": [
        {"actionType": "pick", "actionId": "pick-1", "blockingType": "HARD",
         "actionParameters": [{"key": "loadId", "value": "L-9"}]}
      ]
    }
  ],
  "edges": [
    {"edgeId": "dock-rack-4", "sequenceId": 1, "released": true,
     "startNodeId": "dock", "endNodeId": "rack-4", "maxSpeed": 1.2, "actions": []}
  ]
}"#;

#[test]
fn order_parses_with_flattened_header() {
    let order: OrderMessage = serde_json::from_str(ORDER_JSON).unwrap();
    assert_eq!(order.header.header_id, 12);
    assert_eq!(order.header.serial_number, "agv-7");
    assert_eq!(order.order_id, "O-1001");
    assert_eq!(order.nodes.len(), 2);
    assert_eq!(
        order.nodes[0]
            .node_position
            .as_ref()
            .and_then(|p| p.allowed_deviation_xy),
        Some(0.1)
    );
    assert_eq!(order.edges[0].max_speed, Some(1.2));

    let actions: Vec<_> = order.actions().collect();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].blocking_type, BlockingType::Hard);
    assert_eq!(actions[0].action_parameters[0].value, json!("L-9"));
}

#[test]
fn sparse_order_defaults_missing_fields() {
    let order: OrderMessage =
        serde_json::from_str(r#"{"orderId": "O-2", "nodes": [{"nodeId": "a"}]}"#).unwrap();
    assert_eq!(order.order_update_id, 0);
    assert!(order.edges.is_empty());
    assert!(!order.nodes[0].released);
    assert_eq!(order.zone_set_id, None);
}

#[test]
fn instant_actions_accept_legacy_key() {
    let current: InstantActionsMessage = serde_json::from_str(
        r#"{"actions": [{"actionType": "startPause", "actionId": "ia-1"}]}"#,
    )
    .unwrap();
    let legacy: InstantActionsMessage = serde_json::from_str(
        r#"{"instantActions": [{"actionType": "startPause", "actionId": "ia-1"}]}"#,
    )
    .unwrap();
    assert_eq!(current, legacy);
    assert_eq!(current.actions[0].blocking_type, BlockingType::None);
}

#[test]
fn state_serializes_protocol_names() {
    let mut state = StateMessage {
        order_id: "O-1001".to_string(),
        operating_mode: OperatingMode::Semiautomatic,
        ..Default::default()
    };
    state.errors.push(
        ErrorEntry::fatal("stateReferenceError", "lost").with_reference("actionId", "pick-1"),
    );
    state.action_states.push(vda_schemas::ActionState {
        action_id: "pick-1".to_string(),
        action_status: ActionStatus::Running,
        ..Default::default()
    });

    let v = serde_json::to_value(&state).unwrap();
    assert_eq!(v["orderId"], json!("O-1001"));
    assert_eq!(v["operatingMode"], json!("SEMIAUTOMATIC"));
    assert_eq!(v["actionStates"][0]["actionStatus"], json!("RUNNING"));
    assert_eq!(v["errors"][0]["errorLevel"], json!("FATAL"));
    assert_eq!(
        v["errors"][0]["errorReferences"][0],
        json!({"referenceKey": "actionId", "referenceValue": "pick-1"})
    );
    assert_eq!(v["safetyState"]["eStop"], json!("NONE"));
    assert!(v.get("headerId").is_some(), "header is flattened");
    assert!(v.get("zoneSetId").is_none());
    assert!(v.get("distanceSinceLastNode").is_none());
    assert_eq!(ErrorLevel::default(), ErrorLevel::Warning);
}
