//! The currently known order definition.
//!
//! # Lifecycle
//!
//! ```text
//!   classify(msg) ──► NewOrder | Restart ──► accept_new_order  (replace everything)
//!                 ──► Update             ──► update_order      (graft onto tail)
//!                 ──► Duplicate | Stale  ──► rejected, nothing changes
//! ```
//!
//! `Order` keeps the full path since sequence id 0; traversed nodes stay in it.
//! Execution progress lives in `vda-state`, not here.

use vda_schemas::{Edge, Node, OrderMessage};

use crate::error::{GraphViolation, ProtocolError};
use crate::graph::validate_graph;

/// How an inbound order message relates to the current order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// No current order, or a different `orderId`.
    NewOrder,
    /// Same `orderId`, strictly larger `orderUpdateId`.
    Update,
    /// Same `orderId` sent again from `orderUpdateId` 0 after updates were applied.
    Restart,
    /// Same `orderId` and `orderUpdateId` as already applied.
    Duplicate,
    /// Same `orderId`, smaller `orderUpdateId`.
    Stale,
}

impl Disposition {
    /// `true` when the message replaces the order wholesale.
    pub fn is_new_order(&self) -> bool {
        matches!(self, Disposition::NewOrder | Disposition::Restart)
    }

    /// `true` when the message must be rejected without touching state.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Disposition::Duplicate | Disposition::Stale)
    }
}

/// Owned order definition: ids, zone set, nodes and edges.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Order {
    msg: OrderMessage,
}

impl Order {
    /// An empty order (no `orderId`), as held before the first order arrives.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.msg.order_id.is_empty()
    }

    /// Classify an inbound message against the current order.
    pub fn classify(&self, incoming: &OrderMessage) -> Disposition {
        if self.is_empty() || incoming.order_id != self.msg.order_id {
            return Disposition::NewOrder;
        }
        let current = self.msg.order_update_id;
        let received = incoming.order_update_id;
        if received > current {
            Disposition::Update
        } else if received == current {
            Disposition::Duplicate
        } else if received == 0 {
            Disposition::Restart
        } else {
            Disposition::Stale
        }
    }

    /// Replace the whole order with `candidate` once its own graph validates.
    pub fn accept_new_order(&mut self, candidate: &OrderMessage) -> Result<(), ProtocolError> {
        validate_graph(&candidate.nodes, &candidate.edges)?;
        self.msg = candidate.clone();
        Ok(())
    }

    /// Graft `update` onto the current order.
    ///
    /// The update's first node must be a node of the current order (same
    /// `nodeId` and `sequenceId`); everything after it must still be horizon
    /// and is replaced. In the common case that node is the order's last node
    /// and the overlap is exactly one node. The concatenated path must pass
    /// [`validate_graph`]. On any error the order is left untouched.
    pub fn update_order(&mut self, update: &OrderMessage) -> Result<(), ProtocolError> {
        if update.order_id != self.msg.order_id {
            return Err(ProtocolError::IdentityMismatch {
                active: self.msg.order_id.clone(),
                received: update.order_id.clone(),
            });
        }
        if update.order_update_id <= self.msg.order_update_id {
            return Err(ProtocolError::StaleUpdate {
                order_id: update.order_id.clone(),
                current: self.msg.order_update_id,
                received: update.order_update_id,
            });
        }
        let head = update.nodes.first().ok_or(GraphViolation::NoNodes)?;

        let graft = self
            .msg
            .nodes
            .iter()
            .position(|n| n.sequence_id == head.sequence_id && n.node_id == head.node_id)
            .ok_or_else(|| self.continuity_error(self.last_node(), head))?;

        let drops_base = self.msg.nodes[graft + 1..].iter().any(|n| n.released)
            || self
                .msg
                .edges
                .iter()
                .any(|e| e.sequence_id > head.sequence_id && e.released);
        if drops_base {
            return Err(self.continuity_error(self.last_released_node(), head));
        }

        let mut nodes: Vec<Node> = self.msg.nodes[..graft].to_vec();
        nodes.extend(update.nodes.iter().cloned());
        let mut edges: Vec<Edge> = self
            .msg
            .edges
            .iter()
            .filter(|e| e.sequence_id < head.sequence_id)
            .cloned()
            .collect();
        edges.extend(update.edges.iter().cloned());

        validate_graph(&nodes, &edges)?;

        self.msg.header = update.header.clone();
        self.msg.order_update_id = update.order_update_id;
        self.msg.zone_set_id = update.zone_set_id.clone();
        self.msg.nodes = nodes;
        self.msg.edges = edges;
        Ok(())
    }

    /// Re-run graph validation over the full current node/edge list.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        validate_graph(&self.msg.nodes, &self.msg.edges)?;
        Ok(())
    }

    fn continuity_error(&self, expected: Option<&Node>, head: &Node) -> ProtocolError {
        let (expected_node_id, expected_sequence_id) = expected
            .map(|n| (n.node_id.clone(), n.sequence_id))
            .unwrap_or_default();
        ProtocolError::Continuity {
            expected_node_id,
            expected_sequence_id,
            got_node_id: head.node_id.clone(),
            got_sequence_id: head.sequence_id,
        }
    }

    // ----- Getters -----

    pub fn order_id(&self) -> &str {
        &self.msg.order_id
    }

    pub fn order_update_id(&self) -> u32 {
        self.msg.order_update_id
    }

    pub fn zone_set_id(&self) -> Option<&str> {
        self.msg.zone_set_id.as_deref()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.msg.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.msg.edges
    }

    pub fn last_node(&self) -> Option<&Node> {
        self.msg.nodes.last()
    }

    /// Last node of the base, if any node is released.
    pub fn last_released_node(&self) -> Option<&Node> {
        self.msg.nodes.iter().rev().find(|n| n.released)
    }

    /// The order as a wire record.
    pub fn as_message(&self) -> &OrderMessage {
        &self.msg
    }
}

impl From<OrderMessage> for Order {
    /// Wrap a message without validating it. Call [`Order::validate`] before use.
    fn from(msg: OrderMessage) -> Self {
        Self { msg }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn node(id: &str, seq: u32, released: bool) -> Node {
        Node {
            node_id: id.to_string(),
            sequence_id: seq,
            released,
            ..Default::default()
        }
    }

    fn edge(id: &str, seq: u32, start: &str, end: &str, released: bool) -> Edge {
        Edge {
            edge_id: id.to_string(),
            sequence_id: seq,
            released,
            start_node_id: start.to_string(),
            end_node_id: end.to_string(),
            ..Default::default()
        }
    }

    fn msg(order_id: &str, update_id: u32, nodes: Vec<Node>, edges: Vec<Edge>) -> OrderMessage {
        OrderMessage {
            order_id: order_id.to_string(),
            order_update_id: update_id,
            nodes,
            edges,
            ..Default::default()
        }
    }

    /// n0 (base) -- e0 -- n1 (horizon)
    fn accepted_o1() -> Order {
        let mut order = Order::new();
        order
            .accept_new_order(&msg(
                "O1",
                0,
                vec![node("n0", 0, true), node("n1", 2, false)],
                vec![edge("e0", 1, "n0", "n1", false)],
            ))
            .unwrap();
        order
    }

    #[test]
    fn classify_covers_every_disposition() {
        let mut order = Order::new();
        assert_eq!(order.classify(&msg("O1", 0, vec![], vec![])), Disposition::NewOrder);

        order = accepted_o1();
        assert_eq!(order.classify(&msg("O2", 0, vec![], vec![])), Disposition::NewOrder);
        assert_eq!(order.classify(&msg("O1", 1, vec![], vec![])), Disposition::Update);
        assert_eq!(order.classify(&msg("O1", 0, vec![], vec![])), Disposition::Duplicate);

        order.msg.order_update_id = 3;
        assert_eq!(order.classify(&msg("O1", 2, vec![], vec![])), Disposition::Stale);
        assert_eq!(order.classify(&msg("O1", 0, vec![], vec![])), Disposition::Restart);
        assert!(Disposition::Restart.is_new_order());
        assert!(Disposition::Stale.is_rejected());
    }

    #[test]
    fn accept_rejects_invalid_candidate_and_keeps_previous() {
        let mut order = accepted_o1();
        let before = order.clone();
        let bad = msg("O2", 0, vec![node("a", 0, true), node("b", 2, true)], vec![]);
        let err = order.accept_new_order(&bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert_eq!(order, before);
    }

    #[test]
    fn update_overlapping_last_node_appends_tail() {
        let mut order = accepted_o1();
        let update = msg(
            "O1",
            1,
            vec![node("n1", 2, true), node("n2", 4, false)],
            vec![edge("e1", 3, "n1", "n2", false)],
        );
        order.update_order(&update).unwrap();

        assert_eq!(order.order_update_id(), 1);
        let ids: Vec<&str> = order.nodes().iter().map(|n| n.node_id.as_str()).collect();
        assert_eq!(ids, ["n0", "n1", "n2"]);
        assert_eq!(order.edges().len(), 2);
        assert!(order.nodes()[1].released, "head node takes the update's flags");
        assert_eq!(order.validate(), Ok(()));
    }

    #[test]
    fn update_head_not_in_order_is_continuity_error() {
        let mut order = accepted_o1();
        let before = order.clone();
        let update = msg("O1", 1, vec![node("x", 2, true)], vec![]);
        match order.update_order(&update) {
            Err(ProtocolError::Continuity {
                expected_node_id,
                expected_sequence_id,
                got_node_id,
                ..
            }) => {
                assert_eq!(expected_node_id, "n1");
                assert_eq!(expected_sequence_id, 2);
                assert_eq!(got_node_id, "x");
            }
            other => panic!("expected Continuity, got {other:?}"),
        }
        assert_eq!(order, before);
    }

    #[test]
    fn update_may_replace_horizon_but_never_base() {
        // n0 R -- e0 R -- n1 R -- e1 U -- n2 U
        let mut order = Order::new();
        order
            .accept_new_order(&msg(
                "O1",
                0,
                vec![node("n0", 0, true), node("n1", 2, true), node("n2", 4, false)],
                vec![edge("e0", 1, "n0", "n1", true), edge("e1", 3, "n1", "n2", false)],
            ))
            .unwrap();

        // Grafting at n0 would drop released n1.
        let from_n0 = msg("O1", 1, vec![node("n0", 0, true)], vec![]);
        let err = order.update_order(&from_n0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Continuity);

        // Grafting at n1 replaces the horizon n2 with n3.
        let from_n1 = msg(
            "O1",
            1,
            vec![node("n1", 2, true), node("n3", 4, true)],
            vec![edge("e3", 3, "n1", "n3", true)],
        );
        order.update_order(&from_n1).unwrap();
        let ids: Vec<&str> = order.nodes().iter().map(|n| n.node_id.as_str()).collect();
        assert_eq!(ids, ["n0", "n1", "n3"]);
        let edge_ids: Vec<&str> = order.edges().iter().map(|e| e.edge_id.as_str()).collect();
        assert_eq!(edge_ids, ["e0", "e3"]);
    }

    #[test]
    fn update_with_equal_or_lower_id_is_stale() {
        let mut order = accepted_o1();
        let update = msg("O1", 0, vec![node("n1", 2, true)], vec![]);
        assert_eq!(
            order.update_order(&update),
            Err(ProtocolError::StaleUpdate {
                order_id: "O1".to_string(),
                current: 0,
                received: 0
            })
        );
    }

    #[test]
    fn update_for_other_order_is_identity_mismatch() {
        let mut order = accepted_o1();
        let update = msg("O9", 1, vec![node("n1", 2, true)], vec![]);
        assert_eq!(
            order.update_order(&update).unwrap_err().kind(),
            ErrorKind::IdentityMismatch
        );
    }

    #[test]
    fn broken_concatenation_is_structural_and_atomic() {
        let mut order = accepted_o1();
        let before = order.clone();
        // Edge e1 claims to start at n0 instead of n1.
        let update = msg(
            "O1",
            1,
            vec![node("n1", 2, true), node("n2", 4, false)],
            vec![edge("e1", 3, "n0", "n2", false)],
        );
        assert_eq!(
            order.update_order(&update).unwrap_err().kind(),
            ErrorKind::Structural
        );
        assert_eq!(order, before);
    }
}
