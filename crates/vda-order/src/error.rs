//! Protocol error taxonomy shared by `Order` and `ExecutionState`.
//!
//! Every rejection carries enough context to be surfaced twice: once as the
//! `Err` returned to the caller, and once as an [`ErrorEntry`] appended to
//! the published state. Nothing here is process-fatal.

use std::fmt;

use thiserror::Error;
use vda_schemas::{ErrorEntry, ErrorLevel};

/// Which half of the interleaved node/edge series an index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Edge,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Node => f.write_str("node"),
            ElementKind::Edge => f.write_str("edge"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Start,
    End,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Start => f.write_str("startNodeId"),
            Endpoint::End => f.write_str("endNodeId"),
        }
    }
}

/// First structural rule a node/edge sequence broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphViolation {
    #[error("order contains no nodes")]
    NoNodes,

    #[error("{nodes} node(s) require {expected} edge(s), got {edges}")]
    EdgeCountMismatch {
        nodes: usize,
        edges: usize,
        expected: usize,
    },

    #[error("{kind} at index {index} has sequenceId {found}, expected {expected}")]
    SequenceBreak {
        kind: ElementKind,
        index: usize,
        expected: u32,
        found: u32,
    },

    #[error("edge {edge_id} (index {index}) has {endpoint} {found:?}, expected {expected:?}")]
    EndpointMismatch {
        index: usize,
        edge_id: String,
        endpoint: Endpoint,
        expected: String,
        found: String,
    },

    #[error("actionId {action_id:?} is used more than once")]
    DuplicateActionId { action_id: String },
}

/// An id referenced by a progress report or command that the current state does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnknownReference {
    #[error("action {action_id:?} is not part of the current state")]
    Action { action_id: String },

    #[error("node {node_id:?} (sequenceId {sequence_id}) is not part of the remaining node states")]
    Node { node_id: String, sequence_id: u32 },

    #[error("edge {edge_id:?} (sequenceId {sequence_id}) is not part of the remaining edge states")]
    Edge { edge_id: String, sequence_id: u32 },
}

/// Fieldless discriminant of [`ProtocolError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    Structural,
    Continuity,
    StaleUpdate,
    IdentityMismatch,
    UnknownReference,
}

impl ErrorKind {
    /// `errorType` string used for ledger entries of this kind.
    ///
    /// The ledger keys on this string, so one entry per kind is kept.
    pub fn error_type(&self) -> &'static str {
        match self {
            ErrorKind::Structural => "validationError",
            ErrorKind::Continuity => "orderUpdateError",
            ErrorKind::StaleUpdate => "orderUpdateIdError",
            ErrorKind::IdentityMismatch => "orderStateMismatch",
            ErrorKind::UnknownReference => "stateReferenceError",
        }
    }

    /// Rejected inbound messages are warnings; controller/vehicle divergence is fatal.
    pub fn level(&self) -> ErrorLevel {
        match self {
            ErrorKind::Structural | ErrorKind::Continuity | ErrorKind::StaleUpdate => {
                ErrorLevel::Warning
            }
            ErrorKind::IdentityMismatch | ErrorKind::UnknownReference => ErrorLevel::Fatal,
        }
    }
}

/// Reason an order, order update, instant action or progress report was rejected.
///
/// A rejected call never leaves partial mutations behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("malformed order graph: {0}")]
    Structural(#[from] GraphViolation),

    #[error(
        "update starts at {got_node_id:?}/{got_sequence_id}, \
         expected {expected_node_id:?}/{expected_sequence_id}"
    )]
    Continuity {
        expected_node_id: String,
        expected_sequence_id: u32,
        got_node_id: String,
        got_sequence_id: u32,
    },

    #[error("stale update for order {order_id:?}: orderUpdateId {received} <= current {current}")]
    StaleUpdate {
        order_id: String,
        current: u32,
        received: u32,
    },

    #[error("order id mismatch: active {active:?}, received {received:?}")]
    IdentityMismatch { active: String, received: String },

    #[error(transparent)]
    UnknownReference(#[from] UnknownReference),
}

impl ProtocolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProtocolError::Structural(_) => ErrorKind::Structural,
            ProtocolError::Continuity { .. } => ErrorKind::Continuity,
            ProtocolError::StaleUpdate { .. } => ErrorKind::StaleUpdate,
            ProtocolError::IdentityMismatch { .. } => ErrorKind::IdentityMismatch,
            ProtocolError::UnknownReference(_) => ErrorKind::UnknownReference,
        }
    }

    pub fn level(&self) -> ErrorLevel {
        self.kind().level()
    }

    /// Render as a state-message error entry, references pointing at the offending ids.
    pub fn to_entry(&self) -> ErrorEntry {
        let kind = self.kind();
        let entry = ErrorEntry::new(kind.error_type(), self.to_string(), kind.level());

        match self {
            ProtocolError::Structural(v) => match v {
                GraphViolation::NoNodes | GraphViolation::EdgeCountMismatch { .. } => entry,
                GraphViolation::SequenceBreak { found, .. } => {
                    entry.with_reference("sequenceId", found.to_string())
                }
                GraphViolation::EndpointMismatch { edge_id, .. } => {
                    entry.with_reference("edgeId", edge_id.clone())
                }
                GraphViolation::DuplicateActionId { action_id } => {
                    entry.with_reference("actionId", action_id.clone())
                }
            },
            ProtocolError::Continuity {
                got_node_id,
                got_sequence_id,
                ..
            } => entry
                .with_reference("nodeId", got_node_id.clone())
                .with_reference("sequenceId", got_sequence_id.to_string()),
            ProtocolError::StaleUpdate {
                order_id, received, ..
            } => entry
                .with_reference("orderId", order_id.clone())
                .with_reference("orderUpdateId", received.to_string()),
            ProtocolError::IdentityMismatch { received, .. } => {
                entry.with_reference("orderId", received.clone())
            }
            ProtocolError::UnknownReference(r) => match r {
                UnknownReference::Action { action_id } => {
                    entry.with_reference("actionId", action_id.clone())
                }
                UnknownReference::Node {
                    node_id,
                    sequence_id,
                } => entry
                    .with_reference("nodeId", node_id.clone())
                    .with_reference("sequenceId", sequence_id.to_string()),
                UnknownReference::Edge {
                    edge_id,
                    sequence_id,
                } => entry
                    .with_reference("edgeId", edge_id.clone())
                    .with_reference("sequenceId", sequence_id.to_string()),
            },
        }
    }
}
