//! Scenario: Delayed and replayed order updates
//!
//! # Invariants under test
//!
//! 1. Updates 1, 2, 3 in order and updates 1, 3, 2, 3 (2 delayed, 3 retried)
//!    leave the same order, node/edge/action states and update id.
//! 2. Every late or repeated update is rejected with `StaleUpdate` and does
//!    not mutate the order.
//! 3. Repeated stale rejections occupy one ledger entry.

use vda_order::ErrorKind;
use vda_runtime::{VehicleController, VehicleIdentity};
use vda_schemas::OrderMessage;
use vda_state::StateSettings;
use vda_testkit::{action, edge, node, order, progress};

fn controller() -> VehicleController {
    VehicleController::with_identity(
        VehicleIdentity {
            manufacturer: "acme".to_string(),
            serial_number: "agv-7".to_string(),
            protocol_version: "2.0.0".to_string(),
        },
        StateSettings::default(),
    )
}

/// Horizon re-plan from n0: update `k` proposes target node `t{k}` with action `a{k}`.
fn update(k: u32) -> OrderMessage {
    let target = format!("t{k}");
    let mut next = node(&target, 2, false);
    next.actions.push(action(&format!("a{k}"), "drop"));
    order(
        "O1",
        k,
        vec![node("n0", 0, true), next],
        vec![edge(&format!("e{k}"), 1, "n0", &target, false)],
    )
}

/// Order O1 accepted and the vehicle standing on n0.
fn started() -> VehicleController {
    let mut c = controller();
    c.handle_order(&order(
        "O1",
        0,
        vec![node("n0", 0, true), node("t0", 2, false)],
        vec![edge("e0", 1, "n0", "t0", false)],
    ))
    .unwrap();
    c.handle_progress(&progress("O1", "n0", 0)).unwrap();
    c
}

#[test]
fn delayed_update_is_a_noop() {
    let mut in_order = started();
    for k in [1, 2, 3] {
        in_order.handle_order(&update(k)).unwrap();
    }

    let mut delayed = started();
    delayed.handle_order(&update(1)).unwrap();
    delayed.handle_order(&update(3)).unwrap();
    for k in [2, 3] {
        let before = delayed.order().clone();
        let err = delayed.handle_order(&update(k)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StaleUpdate);
        assert_eq!(delayed.order(), &before);
    }

    assert_eq!(in_order.order(), delayed.order());
    assert_eq!(in_order.state().order_update_id(), 3);
    assert_eq!(delayed.state().order_update_id(), 3);
    assert_eq!(in_order.state().node_states(), delayed.state().node_states());
    assert_eq!(in_order.state().edge_states(), delayed.state().edge_states());
    let actions = |c: &VehicleController| -> Vec<String> {
        c.state().action_states().map(|a| a.action_id.clone()).collect()
    };
    assert_eq!(actions(&in_order), vec!["a3".to_string()]);
    assert_eq!(actions(&in_order), actions(&delayed));

    assert!(in_order.state().errors().is_empty());
    assert_eq!(delayed.state().errors().len(), 1);
    assert!(delayed.state().errors().get("orderUpdateIdError").is_some());
}
