use serde::{Deserialize, Serialize};

use crate::{ErrorEntry, Header, NodePosition};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeState {
    pub node_id: String,
    pub sequence_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_position: Option<NodePosition>,
    pub released: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EdgeState {
    pub edge_id: String,
    pub sequence_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_description: Option<String>,
    pub released: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    #[default]
    Waiting,
    Initializing,
    Running,
    Paused,
    Finished,
    Failed,
}

impl ActionStatus {
    /// `true` once the action can no longer change status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionState {
    pub action_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_description: Option<String>,
    pub action_status: ActionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatteryState {
    /// Percent, 0..=100.
    pub battery_charge: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_voltage: Option<f64>,
    /// Percent, 0..=100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_health: Option<f64>,
    pub charging: bool,
    /// Estimated reach in metres.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reach: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgvPosition {
    pub position_initialized: bool,
    /// 0..=1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub localization_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation_range: Option<f64>,
    pub x: f64,
    pub y: f64,
    pub theta: f64,
    pub map_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Velocity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omega: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EStop {
    Autoack,
    Manual,
    Remote,
    #[default]
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SafetyState {
    pub e_stop: EStop,
    pub field_violation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatingMode {
    #[default]
    Automatic,
    Semiautomatic,
    Manual,
    Service,
    Teachin,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Load {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InfoEntry {
    pub info_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info_description: Option<String>,
    pub info_level: String,
}

/// Outbound state message. Also the shape of progress reports coming up
/// from the vehicle's own execution layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateMessage {
    #[serde(flatten)]
    pub header: Header,
    pub order_id: String,
    pub order_update_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_set_id: Option<String>,
    pub last_node_id: String,
    pub last_node_sequence_id: u32,
    pub node_states: Vec<NodeState>,
    pub edge_states: Vec<EdgeState>,
    pub action_states: Vec<ActionState>,
    pub driving: bool,
    pub paused: bool,
    pub new_base_request: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_since_last_node: Option<f64>,
    pub operating_mode: OperatingMode,
    pub battery_state: BatteryState,
    pub agv_position: AgvPosition,
    pub velocity: Velocity,
    pub loads: Vec<Load>,
    pub errors: Vec<ErrorEntry>,
    pub information: Vec<InfoEntry>,
    pub safety_state: SafetyState,
}
