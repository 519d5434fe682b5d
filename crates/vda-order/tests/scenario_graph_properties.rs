//! Scenario: Graph validator properties
//!
//! # Invariants under test
//!
//! 1. Every well-formed linear path (any length >= 1) is accepted.
//! 2. Changing any single sequence id of a well-formed path is rejected as a
//!    sequence break at exactly that element.
//! 3. Dropping or adding an edge is rejected as an edge-count mismatch.
//! 4. An order accepted through `Order::accept_new_order` always re-validates.

use proptest::prelude::*;
use vda_order::{validate_graph, ElementKind, GraphViolation, Order};
use vda_schemas::{Edge, Node, OrderMessage};

fn linear_path(len: usize) -> (Vec<Node>, Vec<Edge>) {
    let nodes: Vec<Node> = (0..len)
        .map(|i| Node {
            node_id: format!("n{i}"),
            sequence_id: (i * 2) as u32,
            released: true,
            ..Default::default()
        })
        .collect();
    let edges: Vec<Edge> = (0..len.saturating_sub(1))
        .map(|i| Edge {
            edge_id: format!("e{i}"),
            sequence_id: (i * 2 + 1) as u32,
            released: true,
            start_node_id: format!("n{i}"),
            end_node_id: format!("n{}", i + 1),
            ..Default::default()
        })
        .collect();
    (nodes, edges)
}

proptest! {
    #[test]
    fn well_formed_paths_are_accepted(len in 1usize..40) {
        let (nodes, edges) = linear_path(len);
        prop_assert_eq!(validate_graph(&nodes, &edges), Ok(()));
    }

    #[test]
    fn any_single_sequence_mutation_is_rejected(
        len in 2usize..30,
        pick in any::<prop::sample::Index>(),
        delta in 1u32..7,
    ) {
        let (mut nodes, mut edges) = linear_path(len);
        // Positions 0..2*len-1 address the interleaved series.
        let position = pick.index(len * 2 - 1);
        let (kind, index) = if position % 2 == 0 {
            (ElementKind::Node, position / 2)
        } else {
            (ElementKind::Edge, position / 2)
        };
        let expected = position as u32;
        let found = expected + delta;
        match kind {
            ElementKind::Node => nodes[index].sequence_id = found,
            ElementKind::Edge => edges[index].sequence_id = found,
        }

        prop_assert_eq!(
            validate_graph(&nodes, &edges),
            Err(GraphViolation::SequenceBreak { kind, index, expected, found })
        );
    }

    #[test]
    fn edge_count_off_by_one_is_rejected(len in 2usize..30, add in any::<bool>()) {
        let (nodes, mut edges) = linear_path(len);
        if add {
            edges.push(edges[0].clone());
        } else {
            edges.pop();
        }
        let rejected = matches!(
            validate_graph(&nodes, &edges),
            Err(GraphViolation::EdgeCountMismatch { .. })
        );
        prop_assert!(rejected);
    }

    #[test]
    fn accepted_orders_always_revalidate(len in 1usize..25) {
        let (nodes, edges) = linear_path(len);
        let msg = OrderMessage {
            order_id: "prop".to_string(),
            nodes,
            edges,
            ..Default::default()
        };
        let mut order = Order::new();
        prop_assert!(order.accept_new_order(&msg).is_ok());
        prop_assert_eq!(order.validate(), Ok(()));
        prop_assert_eq!(order.nodes().len(), len);
        prop_assert_eq!(order.edges().len(), len - 1);
    }
}
