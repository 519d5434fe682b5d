use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AgvPosition, Header, Velocity};

/// High-rate position message for visualization clients.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisualizationMessage {
    #[serde(flatten)]
    pub header: Header,
    pub agv_position: AgvPosition,
    pub velocity: Velocity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Online,
    #[default]
    Offline,
    Connectionbroken,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionMessage {
    #[serde(flatten)]
    pub header: Header,
    pub connection_state: ConnectionState,
}

/// Vehicle capability description. The body sections are carried opaquely.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FactsheetMessage {
    #[serde(flatten)]
    pub header: Header,
    pub type_specification: Value,
    pub physical_parameters: Value,
    pub protocol_limits: Value,
    pub protocol_features: Value,
}
