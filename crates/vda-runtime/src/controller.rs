use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use vda_config::ConnectorConfig;
use vda_order::{Disposition, ErrorKind, Order, ProtocolError};
use vda_schemas::{
    ConnectionMessage, ConnectionState, ErrorLevel, FactsheetMessage, Header,
    InstantActionsMessage, OrderMessage, StateMessage, VisualizationMessage,
};
use vda_state::{
    connection_message, factsheet_with_identity, ExecutionPhase, ExecutionState, FieldReport,
    StateSettings,
};

/// Ledger types cleared once an order update is accepted.
const ORDER_REJECTION_TYPES: [ErrorKind; 3] = [
    ErrorKind::Structural,
    ErrorKind::Continuity,
    ErrorKind::StaleUpdate,
];

/// Header fields owned by the process, not derived from order state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleIdentity {
    pub manufacturer: String,
    pub serial_number: String,
    pub protocol_version: String,
}

impl From<&ConnectorConfig> for VehicleIdentity {
    fn from(cfg: &ConnectorConfig) -> Self {
        Self {
            manufacturer: cfg.manufacturer.clone(),
            serial_number: cfg.serial_number.clone(),
            protocol_version: cfg.protocol_version.clone(),
        }
    }
}

/// Owns the current `Order` and `ExecutionState` of one vehicle.
///
/// Every `handle_*` call either commits completely or returns the error
/// after recording it in the state's error ledger.
#[derive(Debug, Clone)]
pub struct VehicleController {
    identity: VehicleIdentity,
    order: Order,
    state: ExecutionState,
    header_id: u32,
}

impl VehicleController {
    pub fn new(cfg: &ConnectorConfig) -> Self {
        Self::with_identity(
            VehicleIdentity::from(cfg),
            StateSettings {
                deviation_radius_m: cfg.deviation_radius_m,
                deviation_theta_rad: cfg.deviation_theta_rad,
            },
        )
    }

    pub fn with_identity(identity: VehicleIdentity, settings: StateSettings) -> Self {
        Self {
            identity,
            order: Order::new(),
            state: ExecutionState::new(settings),
            header_id: 0,
        }
    }

    /// Accept, merge or reject an order message.
    pub fn handle_order(&mut self, msg: &OrderMessage) -> Result<Disposition, ProtocolError> {
        let disposition = self.order.classify(msg);
        let result = match disposition {
            Disposition::NewOrder | Disposition::Restart => self.accept(msg, disposition),
            Disposition::Update => self.update(msg),
            Disposition::Duplicate | Disposition::Stale => Err(ProtocolError::StaleUpdate {
                order_id: msg.order_id.clone(),
                current: self.order.order_update_id(),
                received: msg.order_update_id,
            }),
        };
        match result {
            Ok(()) => Ok(disposition),
            Err(err) => {
                self.reject(&err, &msg.order_id);
                Err(err)
            }
        }
    }

    pub fn handle_instant_actions(
        &mut self,
        msg: &InstantActionsMessage,
    ) -> Result<(), ProtocolError> {
        match self.state.add_instant_actions(msg) {
            Ok(()) => {
                info!(count = msg.actions.len(), "instant actions queued");
                Ok(())
            }
            Err(err) => {
                let order_id = self.state.order_id().to_string();
                self.reject(&err, &order_id);
                Err(err)
            }
        }
    }

    /// Merge a progress report from the execution layer.
    ///
    /// Telemetry is applied even when the order part is rejected.
    pub fn handle_progress(&mut self, report: &StateMessage) -> Result<FieldReport, ProtocolError> {
        let fields = self.state.apply_reported_telemetry(report);
        for (field, reason) in fields.rejected() {
            warn!(field, ?reason, "reported telemetry field rejected");
        }
        match self.state.set_order_state(report) {
            Ok(()) => Ok(fields),
            Err(err) => {
                self.reject(&err, &report.order_id);
                Err(err)
            }
        }
    }

    fn accept(&mut self, msg: &OrderMessage, disposition: Disposition) -> Result<(), ProtocolError> {
        if self.state.phase() == ExecutionPhase::Executing {
            info!(
                active = self.state.order_id(),
                order_id = %msg.order_id,
                restart = disposition == Disposition::Restart,
                "replacing order still in progress"
            );
        }
        let mut next = Order::new();
        next.accept_new_order(msg)?;
        self.state.accept_new_order(&next)?;
        self.order = next;
        info!(
            order_id = %msg.order_id,
            order_update_id = msg.order_update_id,
            nodes = msg.nodes.len(),
            "order accepted"
        );
        Ok(())
    }

    fn update(&mut self, msg: &OrderMessage) -> Result<(), ProtocolError> {
        let extends_finished = !self.state.has_active_order(msg);
        let mut merged = self.order.clone();
        merged.update_order(msg)?;
        self.state.update_order(&merged, msg)?;
        self.order = merged;
        for kind in ORDER_REJECTION_TYPES {
            self.state.clear_error_with_type(kind.error_type());
        }
        info!(
            order_id = %msg.order_id,
            order_update_id = msg.order_update_id,
            extends_finished,
            "order update merged"
        );
        Ok(())
    }

    fn reject(&mut self, err: &ProtocolError, order_id: &str) {
        let mut entry = err.to_entry();
        if !entry
            .error_references
            .iter()
            .any(|r| r.reference_key == "orderId")
        {
            entry = entry.with_reference("orderId", order_id);
        }
        self.state.append_error(entry);
        match err.level() {
            ErrorLevel::Fatal => error!(order_id, kind = ?err.kind(), %err, "vehicle and controller diverged"),
            ErrorLevel::Warning => warn!(order_id, kind = ?err.kind(), %err, "message rejected"),
        }
    }

    // ----- Outbound -----

    /// Next header; `headerId` increases by one per published message.
    pub fn next_header(&mut self, now: DateTime<Utc>) -> Header {
        self.header_id = self.header_id.wrapping_add(1);
        Header {
            header_id: self.header_id,
            timestamp: now,
            version: self.identity.protocol_version.clone(),
            manufacturer: self.identity.manufacturer.clone(),
            serial_number: self.identity.serial_number.clone(),
        }
    }

    pub fn publish_state(&mut self, now: DateTime<Utc>) -> StateMessage {
        let header = self.next_header(now);
        self.state.to_message(header)
    }

    pub fn visualization(&mut self, now: DateTime<Utc>) -> VisualizationMessage {
        let header = self.next_header(now);
        self.state.visualization_message(header)
    }

    pub fn connection(&mut self, now: DateTime<Utc>, state: ConnectionState) -> ConnectionMessage {
        connection_message(self.next_header(now), state)
    }

    pub fn factsheet(&mut self, now: DateTime<Utc>, sheet: &FactsheetMessage) -> FactsheetMessage {
        factsheet_with_identity(sheet, self.next_header(now))
    }

    // ----- Accessors -----

    pub fn identity(&self) -> &VehicleIdentity {
        &self.identity
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Direct access for telemetry configuration outside progress reports.
    pub fn state_mut(&mut self) -> &mut ExecutionState {
        &mut self.state
    }
}
