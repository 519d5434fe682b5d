//! vda-state
//!
//! Live execution-progress mirror of the current order:
//! - fresh state on a new order, horizon replacement on an order update
//! - reconciliation of progress reported by the vehicle
//! - the error ledger published in the state message
//! - telemetry group updates with per-field validation
//! - deviation check and outbound projections
//!
//! Pure, deterministic logic. No IO, no clock, no logging.

mod deviation;
mod ledger;
mod projection;
mod state;
mod sync;
mod telemetry;

pub use deviation::Positioned;
pub use ledger::ErrorLedger;
pub use projection::{connection_message, factsheet_with_identity};
pub use state::{BaseEnd, ExecutionPhase, ExecutionState, StateSettings};
pub use telemetry::{
    BatteryUpdate, FieldOutcome, FieldRejection, FieldReport, MotionUpdate, PositionUpdate,
    Telemetry,
};
