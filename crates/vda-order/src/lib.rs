//! vda-order
//!
//! Order side of the vehicle connector:
//! - graph validation of node/edge sequences
//! - acceptance of new orders and grafting of order updates
//! - classification of inbound order messages (new / update / stale)
//! - the `ProtocolError` taxonomy shared with `vda-state`
//!
//! Pure, deterministic logic. No IO, no clock, no logging.

mod error;
mod graph;
mod order;

pub use error::{
    ElementKind, Endpoint, ErrorKind, GraphViolation, ProtocolError, UnknownReference,
};
pub use graph::validate_graph;
pub use order::{Disposition, Order};
