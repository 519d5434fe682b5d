//! Outbound summary messages derived from the execution state. Copies only.

use vda_schemas::{
    ConnectionMessage, ConnectionState, FactsheetMessage, Header, VisualizationMessage,
};

use crate::state::ExecutionState;

impl ExecutionState {
    pub fn visualization_message(&self, header: Header) -> VisualizationMessage {
        VisualizationMessage {
            header,
            agv_position: self.telemetry.position.clone(),
            velocity: self.telemetry.velocity.clone(),
        }
    }
}

pub fn connection_message(header: Header, connection_state: ConnectionState) -> ConnectionMessage {
    ConnectionMessage {
        header,
        connection_state,
    }
}

/// Stamp the vehicle's identity onto a factsheet; the capability sections are kept.
pub fn factsheet_with_identity(factsheet: &FactsheetMessage, header: Header) -> FactsheetMessage {
    FactsheetMessage {
        header,
        ..factsheet.clone()
    }
}
