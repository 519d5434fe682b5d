use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Header, NodePosition};

/// How an action interacts with driving and with other actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockingType {
    #[default]
    None,
    Soft,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionParameter {
    pub key: String,
    pub value: Value,
}

/// An action attached to a node, an edge, or sent as an instant action.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Action {
    pub action_type: String,
    pub action_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_description: Option<String>,
    pub blocking_type: BlockingType,
    pub action_parameters: Vec<ActionParameter>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Node {
    pub node_id: String,
    /// Even, starting at 0, strictly increasing along the path.
    pub sequence_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_description: Option<String>,
    /// `true` for base (committed), `false` for horizon.
    pub released: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_position: Option<NodePosition>,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Edge {
    pub edge_id: String,
    /// Odd, sitting between the sequence ids of its two nodes.
    pub sequence_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_description: Option<String>,
    pub released: bool,
    pub start_node_id: String,
    pub end_node_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f64>,
    pub actions: Vec<Action>,
}

/// Inbound order or order update from the fleet controller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderMessage {
    #[serde(flatten)]
    pub header: Header,
    pub order_id: String,
    pub order_update_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_set_id: Option<String>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl OrderMessage {
    /// Iterate every action attached to the order's nodes and edges, nodes first.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.nodes
            .iter()
            .flat_map(|n| n.actions.iter())
            .chain(self.edges.iter().flat_map(|e| e.actions.iter()))
    }
}

/// Inbound instant actions. VDA 5050 1.x named the array `instantActions`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstantActionsMessage {
    #[serde(flatten)]
    pub header: Header,
    #[serde(alias = "instantActions")]
    pub actions: Vec<Action>,
}
