//! vda-runtime
//!
//! The single mutation point for one vehicle: `VehicleController` sequences
//! every inbound message through `Order` and then `ExecutionState`, stamps
//! headers, and surfaces rejections in the error ledger and the log.
//! `spawn_connector` drives a controller from a bounded tokio queue.

mod controller;
mod event_loop;

pub use controller::{VehicleController, VehicleIdentity};
pub use event_loop::{spawn_connector, ConnectorEvent, ConnectorHandle};
