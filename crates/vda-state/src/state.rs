//! Execution state: the live progress mirror of the current order.
//!
//! # Ownership
//!
//! `ExecutionState` is a plain value. The runtime holds exactly one and
//! serializes every mutation through it; nothing here locks.
//!
//! # Base and horizon
//!
//! Released (base) node/edge/action states are commitments: order updates
//! never remove them. Unreleased (horizon) states are plan and are replaced
//! wholesale by every accepted update. Progress reported by the vehicle
//! trims node/edge states from the front (see `sync`).
//!
//! Every mutating operation validates first and commits last; an `Err`
//! means the state is exactly what it was before the call.

use std::collections::{BTreeMap, BTreeSet};

use vda_order::{GraphViolation, Order, ProtocolError};
use vda_schemas::{
    Action, ActionState, ActionStatus, EdgeState, ErrorEntry, Header, NodeState, OrderMessage,
    StateMessage,
};

use crate::ledger::ErrorLedger;
use crate::telemetry::Telemetry;

/// Tolerances used by the deviation check.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSettings {
    /// Default positional tolerance in metres, used when a node declares none.
    pub deviation_radius_m: f64,
    /// Default heading tolerance in radians; `None` skips the heading check
    /// for nodes that declare no tolerance of their own.
    pub deviation_theta_rad: Option<f64>,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            deviation_radius_m: 0.5,
            deviation_theta_rad: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionPhase {
    Idle,
    Executing,
}

/// Result of [`ExecutionState::last_node_in_base`].
#[derive(Debug, Clone, PartialEq)]
pub enum BaseEnd {
    /// Highest released node state still ahead of (or at) the vehicle.
    Ahead(NodeState),
    /// Every released node was traversed; the base ends at the last passed node.
    Reached { node_id: String, sequence_id: u32 },
    /// No order, or the order has not produced any progress yet.
    NotStarted,
}

/// Element an action state belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActionSource {
    Node(u32),
    Edge(u32),
    Instant,
}

/// Action state plus the release flag and origin of the element it came from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TrackedAction {
    pub(crate) state: ActionState,
    pub(crate) released: bool,
    pub(crate) source: ActionSource,
}

impl TrackedAction {
    pub(crate) fn waiting(action: &Action, released: bool, source: ActionSource) -> Self {
        Self {
            state: ActionState {
                action_id: action.action_id.clone(),
                action_type: Some(action.action_type.clone()),
                action_description: action.action_description.clone(),
                action_status: ActionStatus::Waiting,
                result_description: None,
            },
            released,
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionState {
    pub(crate) order_id: String,
    pub(crate) order_update_id: u32,
    pub(crate) zone_set_id: Option<String>,
    pub(crate) last_node_id: String,
    pub(crate) last_node_sequence_id: u32,
    pub(crate) node_states: Vec<NodeState>,
    pub(crate) edge_states: Vec<EdgeState>,
    pub(crate) actions: BTreeMap<String, TrackedAction>,
    pub(crate) errors: ErrorLedger,
    pub(crate) telemetry: Telemetry,
    pub(crate) settings: StateSettings,
}

impl ExecutionState {
    pub fn new(settings: StateSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Replace all progress with fresh WAITING state derived from `new_order`.
    ///
    /// Errors and instant actions of the previous order are dropped.
    /// Telemetry survives; it describes the vehicle, not the order.
    pub fn accept_new_order(&mut self, new_order: &Order) -> Result<(), ProtocolError> {
        new_order.validate()?;

        let node_states = new_order.nodes().iter().map(node_state).collect();
        let edge_states = new_order.edges().iter().map(edge_state).collect();
        let mut actions = BTreeMap::new();
        for node in new_order.nodes() {
            for action in &node.actions {
                actions.insert(
                    action.action_id.clone(),
                    TrackedAction::waiting(
                        action,
                        node.released,
                        ActionSource::Node(node.sequence_id),
                    ),
                );
            }
        }
        for edge in new_order.edges() {
            for action in &edge.actions {
                actions.insert(
                    action.action_id.clone(),
                    TrackedAction::waiting(
                        action,
                        edge.released,
                        ActionSource::Edge(edge.sequence_id),
                    ),
                );
            }
        }

        self.order_id = new_order.order_id().to_string();
        self.order_update_id = new_order.order_update_id();
        self.zone_set_id = new_order.zone_set_id().map(str::to_string);
        self.last_node_id.clear();
        self.last_node_sequence_id = 0;
        self.node_states = node_states;
        self.edge_states = edge_states;
        self.actions = actions;
        self.clear_all_errors();
        Ok(())
    }

    /// `true` iff `candidate` names the order held here and some of it is still pending.
    ///
    /// Informational only. Whether a message is a new order or a
    /// continuation is decided by `Order::classify` on ids alone, so an
    /// update of an order the vehicle already finished is still merged.
    pub fn has_active_order(&self, candidate: &OrderMessage) -> bool {
        if self.order_id.is_empty() || candidate.order_id != self.order_id {
            return false;
        }
        !self.node_states.is_empty()
            || !self.edge_states.is_empty()
            || self
                .actions
                .values()
                .any(|a| !a.state.action_status.is_terminal())
    }

    /// The update's first node must be where the base currently ends.
    ///
    /// That is the last released node still ahead of the vehicle, else the
    /// node it last reached. Before any progress on an order without a
    /// released node the update must replace the whole path, so it starts at
    /// the first node state.
    pub fn validate_update_base(&self, update: &OrderMessage) -> Result<(), ProtocolError> {
        let head = update.nodes.first().ok_or(GraphViolation::NoNodes)?;
        let (expected_node_id, expected_sequence_id) = match self.last_node_in_base() {
            BaseEnd::Ahead(node) => (node.node_id, node.sequence_id),
            BaseEnd::Reached {
                node_id,
                sequence_id,
            } => (node_id, sequence_id),
            BaseEnd::NotStarted => self
                .node_states
                .first()
                .map(|n| (n.node_id.clone(), n.sequence_id))
                .unwrap_or_default(),
        };
        if head.node_id != expected_node_id || head.sequence_id != expected_sequence_id {
            return Err(ProtocolError::Continuity {
                expected_node_id,
                expected_sequence_id,
                got_node_id: head.node_id.clone(),
                got_sequence_id: head.sequence_id,
            });
        }
        Ok(())
    }

    /// An update may repeat the actions of the base node it grafts on, but
    /// may not reuse the id of any other action that survives the update.
    fn validate_update_action_ids(&self, update: &OrderMessage) -> Result<(), ProtocolError> {
        for (action, source, _) in update_actions(update) {
            let collides = self
                .actions
                .get(&action.action_id)
                .is_some_and(|tracked| tracked.released && tracked.source != source);
            if collides {
                return Err(GraphViolation::DuplicateActionId {
                    action_id: action.action_id.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Merge an accepted order update.
    ///
    /// `current` is the order with `update` already grafted on; it must
    /// validate as a whole. Horizon states are discarded, base states kept,
    /// and states for the update's elements appended (ids already present are
    /// not duplicated).
    pub fn update_order(
        &mut self,
        current: &Order,
        update: &OrderMessage,
    ) -> Result<(), ProtocolError> {
        if current.order_id() != self.order_id || update.order_id != self.order_id {
            return Err(ProtocolError::IdentityMismatch {
                active: self.order_id.clone(),
                received: update.order_id.clone(),
            });
        }
        if update.order_update_id <= self.order_update_id {
            return Err(ProtocolError::StaleUpdate {
                order_id: update.order_id.clone(),
                current: self.order_update_id,
                received: update.order_update_id,
            });
        }
        self.validate_update_base(update)?;
        current.validate()?;
        self.validate_update_action_ids(update)?;

        // ---- commit ----
        self.node_states.retain(|n| n.released);
        self.edge_states.retain(|e| e.released);
        self.actions.retain(|_, a| a.released);

        let kept_nodes: BTreeSet<u32> = self.node_states.iter().map(|n| n.sequence_id).collect();
        let kept_edges: BTreeSet<u32> = self.edge_states.iter().map(|e| e.sequence_id).collect();
        self.node_states.extend(
            update
                .nodes
                .iter()
                .filter(|n| !kept_nodes.contains(&n.sequence_id))
                .map(node_state),
        );
        self.edge_states.extend(
            update
                .edges
                .iter()
                .filter(|e| !kept_edges.contains(&e.sequence_id))
                .map(edge_state),
        );
        self.node_states.sort_by_key(|n| n.sequence_id);
        self.edge_states.sort_by_key(|e| e.sequence_id);

        for (action, source, released) in update_actions(update) {
            self.actions
                .entry(action.action_id.clone())
                .or_insert_with(|| TrackedAction::waiting(action, released, source));
        }

        self.order_update_id = update.order_update_id;
        self.zone_set_id = update.zone_set_id.clone();
        Ok(())
    }

    /// Where the committed part of the path currently ends. Never mutates.
    pub fn last_node_in_base(&self) -> BaseEnd {
        if let Some(node) = self.node_states.iter().rev().find(|n| n.released) {
            return BaseEnd::Ahead(node.clone());
        }
        if self.last_node_id.is_empty() {
            return BaseEnd::NotStarted;
        }
        BaseEnd::Reached {
            node_id: self.last_node_id.clone(),
            sequence_id: self.last_node_sequence_id,
        }
    }

    pub fn phase(&self) -> ExecutionPhase {
        let drained = self.node_states.is_empty()
            && self.edge_states.is_empty()
            && self
                .actions
                .values()
                .all(|a| a.state.action_status.is_terminal());
        if self.order_id.is_empty() || drained {
            ExecutionPhase::Idle
        } else {
            ExecutionPhase::Executing
        }
    }

    // ----- Error ledger -----

    pub fn append_error(&mut self, entry: ErrorEntry) {
        self.errors.append(entry);
    }

    pub fn clear_error_with_type(&mut self, error_type: &str) -> bool {
        self.errors.clear_type(error_type)
    }

    pub fn clear_all_errors(&mut self) {
        self.errors.clear_all();
    }

    // ----- Getters -----

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn order_update_id(&self) -> u32 {
        self.order_update_id
    }

    pub fn zone_set_id(&self) -> Option<&str> {
        self.zone_set_id.as_deref()
    }

    pub fn last_node_id(&self) -> &str {
        &self.last_node_id
    }

    pub fn last_node_sequence_id(&self) -> u32 {
        self.last_node_sequence_id
    }

    pub fn node_states(&self) -> &[NodeState] {
        &self.node_states
    }

    pub fn edge_states(&self) -> &[EdgeState] {
        &self.edge_states
    }

    /// Action states in `actionId` order.
    pub fn action_states(&self) -> impl Iterator<Item = &ActionState> {
        self.actions.values().map(|a| &a.state)
    }

    pub fn action_state(&self, action_id: &str) -> Option<&ActionState> {
        self.actions.get(action_id).map(|a| &a.state)
    }

    pub fn errors(&self) -> &ErrorLedger {
        &self.errors
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn settings(&self) -> &StateSettings {
        &self.settings
    }

    /// Render the outbound state record under `header`.
    pub fn to_message(&self, header: Header) -> StateMessage {
        let t = &self.telemetry;
        StateMessage {
            header,
            order_id: self.order_id.clone(),
            order_update_id: self.order_update_id,
            zone_set_id: self.zone_set_id.clone(),
            last_node_id: self.last_node_id.clone(),
            last_node_sequence_id: self.last_node_sequence_id,
            node_states: self.node_states.clone(),
            edge_states: self.edge_states.clone(),
            action_states: self.action_states().cloned().collect(),
            driving: t.driving,
            paused: t.paused,
            new_base_request: t.new_base_request,
            distance_since_last_node: t.distance_since_last_node,
            operating_mode: t.operating_mode,
            battery_state: t.battery.clone(),
            agv_position: t.position.clone(),
            velocity: t.velocity.clone(),
            loads: t.loads.clone(),
            errors: self.errors.to_vec(),
            information: t.information.clone(),
            safety_state: t.safety.clone(),
        }
    }
}

/// Every action of `update` with the element it is attached to and that element's release flag.
fn update_actions(update: &OrderMessage) -> impl Iterator<Item = (&Action, ActionSource, bool)> {
    let on_nodes = update.nodes.iter().flat_map(|n| {
        n.actions
            .iter()
            .map(move |a| (a, ActionSource::Node(n.sequence_id), n.released))
    });
    let on_edges = update.edges.iter().flat_map(|e| {
        e.actions
            .iter()
            .map(move |a| (a, ActionSource::Edge(e.sequence_id), e.released))
    });
    on_nodes.chain(on_edges)
}

fn node_state(node: &vda_schemas::Node) -> NodeState {
    NodeState {
        node_id: node.node_id.clone(),
        sequence_id: node.sequence_id,
        node_description: node.node_description.clone(),
        node_position: node.node_position.clone(),
        released: node.released,
    }
}

fn edge_state(edge: &vda_schemas::Edge) -> EdgeState {
    EdgeState {
        edge_id: edge.edge_id.clone(),
        sequence_id: edge.sequence_id,
        edge_description: edge.edge_description.clone(),
        released: edge.released,
    }
}
