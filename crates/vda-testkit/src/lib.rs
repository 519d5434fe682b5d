//! Test fixtures for the connector crates.
//!
//! Builders produce wire records (`vda-schemas`) only, so every engine crate
//! can use this kit as a dev-dependency.

use anyhow::{Context, Result};
use std::fs;
use vda_schemas::{
    Action, ActionState, ActionStatus, Edge, EdgeState, InstantActionsMessage, Node, NodeState,
    OrderMessage, StateMessage,
};

mod mock_vehicle;

pub use mock_vehicle::MockVehicle;

pub fn node(id: &str, sequence_id: u32, released: bool) -> Node {
    Node {
        node_id: id.to_string(),
        sequence_id,
        released,
        ..Default::default()
    }
}

pub fn edge(id: &str, sequence_id: u32, start: &str, end: &str, released: bool) -> Edge {
    Edge {
        edge_id: id.to_string(),
        sequence_id,
        released,
        start_node_id: start.to_string(),
        end_node_id: end.to_string(),
        ..Default::default()
    }
}

pub fn action(id: &str, action_type: &str) -> Action {
    Action {
        action_type: action_type.to_string(),
        action_id: id.to_string(),
        ..Default::default()
    }
}

pub fn order(order_id: &str, order_update_id: u32, nodes: Vec<Node>, edges: Vec<Edge>) -> OrderMessage {
    OrderMessage {
        order_id: order_id.to_string(),
        order_update_id,
        nodes,
        edges,
        ..Default::default()
    }
}

/// Straight path through `node_ids`, edges named `e0, e1, ...`.
///
/// The first `released` nodes form the base; an edge is released when both
/// of its endpoints are.
pub fn linear_order(order_id: &str, node_ids: &[&str], released: usize) -> OrderMessage {
    let nodes = node_ids
        .iter()
        .enumerate()
        .map(|(i, id)| node(id, (i * 2) as u32, i < released))
        .collect();
    let edges = node_ids
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            edge(
                &format!("e{i}"),
                (i * 2 + 1) as u32,
                pair[0],
                pair[1],
                i + 1 < released,
            )
        })
        .collect();
    order(order_id, 0, nodes, edges)
}

pub fn instant_actions(actions: Vec<Action>) -> InstantActionsMessage {
    InstantActionsMessage {
        actions,
        ..Default::default()
    }
}

pub fn node_state(id: &str, sequence_id: u32, released: bool) -> NodeState {
    NodeState {
        node_id: id.to_string(),
        sequence_id,
        released,
        ..Default::default()
    }
}

pub fn edge_state(id: &str, sequence_id: u32, released: bool) -> EdgeState {
    EdgeState {
        edge_id: id.to_string(),
        sequence_id,
        released,
        ..Default::default()
    }
}

pub fn action_state(id: &str, status: ActionStatus) -> ActionState {
    ActionState {
        action_id: id.to_string(),
        action_status: status,
        ..Default::default()
    }
}

/// Progress report naming `order_id` with the boundary at `last_node`.
/// Remaining node/edge/action lists start empty.
pub fn progress(order_id: &str, last_node_id: &str, last_node_sequence_id: u32) -> StateMessage {
    StateMessage {
        order_id: order_id.to_string(),
        last_node_id: last_node_id.to_string(),
        last_node_sequence_id,
        ..Default::default()
    }
}

pub fn load_order_json(path: &str) -> Result<OrderMessage> {
    let s = fs::read_to_string(path).with_context(|| format!("read order: {path}"))?;
    let order: OrderMessage = serde_json::from_str(&s).context("parse order json")?;
    Ok(order)
}

pub fn load_state_json(path: &str) -> Result<StateMessage> {
    let s = fs::read_to_string(path).with_context(|| format!("read state: {path}"))?;
    let state: StateMessage = serde_json::from_str(&s).context("parse state json")?;
    Ok(state)
}
