//! Scripted vehicle that drives the base one node per step.
//!
//! No timing and no geometry: `step` jumps to the next released node,
//! finishes the actions of everything it passed, and returns the progress
//! report the real execution layer would send.

use std::collections::BTreeSet;

use vda_schemas::{ActionState, ActionStatus, Edge, EdgeState, Node, NodeState, OrderMessage, StateMessage};

#[derive(Debug, Clone, Default)]
pub struct MockVehicle {
    order_id: String,
    order_update_id: u32,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    /// Index into `nodes` of the last reached node.
    reached: Option<usize>,
    finished: BTreeSet<String>,
}

impl MockVehicle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a new order, or graft an update of the current one onto the
    /// reached node.
    pub fn receive_order(&mut self, msg: &OrderMessage) {
        if msg.order_id != self.order_id || msg.order_update_id == 0 {
            *self = Self {
                order_id: msg.order_id.clone(),
                order_update_id: msg.order_update_id,
                nodes: msg.nodes.clone(),
                edges: msg.edges.clone(),
                ..Self::default()
            };
            return;
        }
        let Some(head) = msg.nodes.first() else {
            return;
        };
        self.nodes.retain(|n| n.sequence_id < head.sequence_id);
        self.nodes.extend(msg.nodes.iter().cloned());
        self.edges.retain(|e| e.sequence_id < head.sequence_id);
        self.edges.extend(msg.edges.iter().cloned());
        self.order_update_id = msg.order_update_id;
    }

    /// Drive to the next released node. `None` when the base is exhausted.
    pub fn step(&mut self) -> Option<StateMessage> {
        let next = self.reached.map_or(0, |i| i + 1);
        let target = self.nodes.get(next).filter(|n| n.released)?;
        let target_seq = target.sequence_id;

        let passed_edges = self
            .edges
            .iter()
            .filter(|e| e.sequence_id < target_seq)
            .flat_map(|e| e.actions.iter());
        let passed_nodes = self.nodes[..=next].iter().flat_map(|n| n.actions.iter());
        let ids: Vec<String> = passed_nodes
            .chain(passed_edges)
            .map(|a| a.action_id.clone())
            .collect();
        self.finished.extend(ids);
        self.reached = Some(next);
        Some(self.report())
    }

    /// Current progress report.
    pub fn report(&self) -> StateMessage {
        let (last_node_id, last_node_sequence_id) = self
            .reached
            .and_then(|i| self.nodes.get(i))
            .map(|n| (n.node_id.clone(), n.sequence_id))
            .unwrap_or_default();
        let ahead = self.reached.map_or(0, |i| i + 1);

        StateMessage {
            order_id: self.order_id.clone(),
            order_update_id: self.order_update_id,
            last_node_id,
            last_node_sequence_id,
            node_states: self.nodes[ahead.min(self.nodes.len())..]
                .iter()
                .map(|n| NodeState {
                    node_id: n.node_id.clone(),
                    sequence_id: n.sequence_id,
                    released: n.released,
                    ..Default::default()
                })
                .collect(),
            edge_states: self
                .edges
                .iter()
                .filter(|e| self.reached.is_none() || e.sequence_id > last_node_sequence_id)
                .map(|e| EdgeState {
                    edge_id: e.edge_id.clone(),
                    sequence_id: e.sequence_id,
                    released: e.released,
                    ..Default::default()
                })
                .collect(),
            action_states: self
                .finished
                .iter()
                .map(|id| ActionState {
                    action_id: id.clone(),
                    action_status: ActionStatus::Finished,
                    ..Default::default()
                })
                .collect(),
            driving: self.nodes.get(ahead).is_some_and(|n| n.released),
            ..Default::default()
        }
    }

    pub fn reached_node(&self) -> Option<&Node> {
        self.reached.and_then(|i| self.nodes.get(i))
    }
}
