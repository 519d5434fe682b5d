//! Reconciliation of vehicle-reported progress into `ExecutionState`.
//!
//! `set_order_state` plans every change first (node trim, edge trim, action
//! updates) and commits only when the whole report is consistent.

use vda_order::{GraphViolation, ProtocolError, UnknownReference};
use vda_schemas::{ActionStatus, InstantActionsMessage, StateMessage};

use crate::state::{ActionSource, ExecutionState, TrackedAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeSync {
    Unchanged,
    /// Drop node states `..=index` and move the boundary.
    TrimThrough(usize),
    /// Vehicle reports no remaining nodes.
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeSync {
    Unchanged,
    /// Drop edge states `..index`.
    TrimBefore(usize),
    Clear,
}

impl ExecutionState {
    /// Merge a progress report from the vehicle's execution layer.
    ///
    /// The report must name the active order. Node states are trimmed from
    /// the front through the reported boundary node, edge states up to the
    /// reported edge head, and every reported action state is applied by id.
    /// Telemetry is not touched here.
    pub fn set_order_state(&mut self, report: &StateMessage) -> Result<(), ProtocolError> {
        if report.order_id != self.order_id {
            return Err(ProtocolError::IdentityMismatch {
                active: self.order_id.clone(),
                received: report.order_id.clone(),
            });
        }

        let nodes = self.plan_node_sync(report)?;
        let edges = self.plan_edge_sync(report)?;
        for reported in &report.action_states {
            self.ensure_action(&reported.action_id)?;
        }

        // ---- commit ----
        match nodes {
            NodeSync::Unchanged => {}
            NodeSync::TrimThrough(index) => {
                self.node_states.drain(..=index);
                self.move_boundary(report);
            }
            NodeSync::Clear => {
                self.node_states.clear();
                self.move_boundary(report);
            }
        }
        match edges {
            EdgeSync::Unchanged => {}
            EdgeSync::TrimBefore(index) => {
                self.edge_states.drain(..index);
            }
            EdgeSync::Clear => self.edge_states.clear(),
        }
        for reported in &report.action_states {
            if let Some(tracked) = self.actions.get_mut(&reported.action_id) {
                tracked.state.action_status = reported.action_status;
                tracked.state.result_description = reported.result_description.clone();
            }
        }
        Ok(())
    }

    /// Update one action's status; the id must be tracked.
    pub fn set_action_state(
        &mut self,
        action_id: &str,
        status: ActionStatus,
        result_description: Option<String>,
    ) -> Result<(), ProtocolError> {
        let tracked = self
            .actions
            .get_mut(action_id)
            .ok_or_else(|| UnknownReference::Action {
                action_id: action_id.to_string(),
            })?;
        tracked.state.action_status = status;
        tracked.state.result_description = result_description;
        Ok(())
    }

    /// Track every instant action as WAITING. Instant actions count as base.
    ///
    /// Ids must be unique within the message and unknown to the state.
    pub fn add_instant_actions(&mut self, msg: &InstantActionsMessage) -> Result<(), ProtocolError> {
        let mut seen = std::collections::BTreeSet::new();
        for action in &msg.actions {
            if self.actions.contains_key(&action.action_id)
                || !seen.insert(action.action_id.as_str())
            {
                return Err(GraphViolation::DuplicateActionId {
                    action_id: action.action_id.clone(),
                }
                .into());
            }
        }
        for action in &msg.actions {
            self.actions.insert(
                action.action_id.clone(),
                TrackedAction::waiting(action, true, ActionSource::Instant),
            );
        }
        Ok(())
    }

    fn ensure_action(&self, action_id: &str) -> Result<(), ProtocolError> {
        if self.actions.contains_key(action_id) {
            Ok(())
        } else {
            Err(UnknownReference::Action {
                action_id: action_id.to_string(),
            }
            .into())
        }
    }

    fn plan_node_sync(&self, report: &StateMessage) -> Result<NodeSync, ProtocolError> {
        let advanced = self.boundary_moved(report);

        if report.node_states.is_empty() {
            // Vehicle finished the known path. Without an order there is
            // nothing the boundary could contradict.
            if advanced && !self.order_id.is_empty() && self.boundary_index(report).is_none() {
                return Err(self.unknown_boundary(report));
            }
            return Ok(if self.node_states.is_empty() && !advanced {
                NodeSync::Unchanged
            } else {
                NodeSync::Clear
            });
        }

        let head_moved = match (self.node_states.first(), report.node_states.first()) {
            (Some(ours), Some(theirs)) => ours.sequence_id != theirs.sequence_id,
            _ => false,
        };
        if !advanced && !head_moved {
            return Ok(NodeSync::Unchanged);
        }

        match self.boundary_index(report) {
            Some(index) => Ok(NodeSync::TrimThrough(index)),
            // Boundary already trimmed on an earlier report.
            None if !advanced => Ok(NodeSync::Unchanged),
            None => Err(self.unknown_boundary(report)),
        }
    }

    /// Position of the reported boundary node among the remaining node states.
    fn boundary_index(&self, report: &StateMessage) -> Option<usize> {
        self.node_states.iter().position(|n| {
            n.sequence_id == report.last_node_sequence_id && n.node_id == report.last_node_id
        })
    }

    fn unknown_boundary(&self, report: &StateMessage) -> ProtocolError {
        UnknownReference::Node {
            node_id: report.last_node_id.clone(),
            sequence_id: report.last_node_sequence_id,
        }
        .into()
    }

    fn plan_edge_sync(&self, report: &StateMessage) -> Result<EdgeSync, ProtocolError> {
        let Some(ours) = self.edge_states.first() else {
            return Ok(EdgeSync::Unchanged);
        };
        let Some(head) = report.edge_states.first() else {
            return Ok(EdgeSync::Clear);
        };
        if ours.sequence_id == head.sequence_id {
            return Ok(EdgeSync::Unchanged);
        }
        self.edge_states
            .iter()
            .position(|e| e.sequence_id == head.sequence_id && e.edge_id == head.edge_id)
            .map(EdgeSync::TrimBefore)
            .ok_or_else(|| {
                UnknownReference::Edge {
                    edge_id: head.edge_id.clone(),
                    sequence_id: head.sequence_id,
                }
                .into()
            })
    }

    fn boundary_moved(&self, report: &StateMessage) -> bool {
        report.last_node_sequence_id != self.last_node_sequence_id
            || report.last_node_id != self.last_node_id
    }

    fn move_boundary(&mut self, report: &StateMessage) {
        self.last_node_id = report.last_node_id.clone();
        self.last_node_sequence_id = report.last_node_sequence_id;
    }
}
