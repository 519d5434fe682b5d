//! Order graph validation.
//!
//! Rules are checked in a fixed order and the first violation is returned:
//!
//! 1. at least one node;
//! 2. exactly `nodes - 1` edges;
//! 3. sequence ids run 0, 1, 2, ... with nodes on even and edges on odd ids;
//! 4. each edge starts at the node before it and ends at the node after it;
//! 5. every `actionId` across nodes and edges is unique.
//!
//! Pure function, no allocation beyond the action-id set.

use std::collections::BTreeSet;

use vda_schemas::{Edge, Node};

use crate::error::{ElementKind, Endpoint, GraphViolation};

/// Validate a candidate node/edge sequence as a single linear VDA 5050 order graph.
pub fn validate_graph(nodes: &[Node], edges: &[Edge]) -> Result<(), GraphViolation> {
    if nodes.is_empty() {
        return Err(GraphViolation::NoNodes);
    }

    let expected_edges = nodes.len() - 1;
    if edges.len() != expected_edges {
        return Err(GraphViolation::EdgeCountMismatch {
            nodes: nodes.len(),
            edges: edges.len(),
            expected: expected_edges,
        });
    }

    // Walk the interleaved series so the first break is reported in path order.
    for (index, node) in nodes.iter().enumerate() {
        let expected = node_sequence_id(index);
        if node.sequence_id != expected {
            return Err(GraphViolation::SequenceBreak {
                kind: ElementKind::Node,
                index,
                expected,
                found: node.sequence_id,
            });
        }
        if let Some(edge) = edges.get(index) {
            let expected = expected + 1;
            if edge.sequence_id != expected {
                return Err(GraphViolation::SequenceBreak {
                    kind: ElementKind::Edge,
                    index,
                    expected,
                    found: edge.sequence_id,
                });
            }
        }
    }

    for (index, edge) in edges.iter().enumerate() {
        check_endpoint(index, edge, Endpoint::Start, &nodes[index].node_id)?;
        check_endpoint(index, edge, Endpoint::End, &nodes[index + 1].node_id)?;
    }

    check_unique_action_ids(nodes, edges)
}

fn node_sequence_id(index: usize) -> u32 {
    // Orders are far shorter than u32::MAX / 2 elements.
    (index as u32).saturating_mul(2)
}

fn check_endpoint(
    index: usize,
    edge: &Edge,
    endpoint: Endpoint,
    expected: &str,
) -> Result<(), GraphViolation> {
    let found = match endpoint {
        Endpoint::Start => &edge.start_node_id,
        Endpoint::End => &edge.end_node_id,
    };
    if found != expected {
        return Err(GraphViolation::EndpointMismatch {
            index,
            edge_id: edge.edge_id.clone(),
            endpoint,
            expected: expected.to_string(),
            found: found.clone(),
        });
    }
    Ok(())
}

fn check_unique_action_ids(nodes: &[Node], edges: &[Edge]) -> Result<(), GraphViolation> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let actions = nodes
        .iter()
        .flat_map(|n| n.actions.iter())
        .chain(edges.iter().flat_map(|e| e.actions.iter()));
    for action in actions {
        if !seen.insert(action.action_id.as_str()) {
            return Err(GraphViolation::DuplicateActionId {
                action_id: action.action_id.clone(),
            });
        }
    }
    Ok(())
}
