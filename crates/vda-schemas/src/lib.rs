//! vda-schemas
//!
//! Wire records for the VDA 5050 vehicle interface. Field names follow the
//! protocol's camelCase JSON; enums use the protocol's upper-case literals.
//!
//! These are plain data. Nothing here validates graph structure or merges
//! state; see `vda-order` and `vda-state` for that.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod order;
mod outbound;
mod state;

pub use order::*;
pub use outbound::*;
pub use state::*;

/// Protocol version stamped into headers when configuration does not say otherwise.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2.0.0";

/// Header shared by every VDA 5050 message. Flattened into the message body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Header {
    pub header_id: u32,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub manufacturer: String,
    pub serial_number: String,
}

/// Position of a node on the map, with optional per-node deviation tolerances.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theta: Option<f64>,
    #[serde(rename = "allowedDeviationXY", skip_serializing_if = "Option::is_none")]
    pub allowed_deviation_xy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_deviation_theta: Option<f64>,
    pub map_id: String,
}

/// Error severity as published in the state message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorLevel {
    #[default]
    Warning,
    Fatal,
}

/// Key/value pointer from an error entry to the element it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ErrorReference {
    pub reference_key: String,
    pub reference_value: String,
}

/// One entry of the state message's `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ErrorEntry {
    pub error_type: String,
    pub error_references: Vec<ErrorReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    pub error_level: ErrorLevel,
}

impl ErrorEntry {
    pub fn new(
        error_type: impl Into<String>,
        description: impl Into<String>,
        level: ErrorLevel,
    ) -> Self {
        Self {
            error_type: error_type.into(),
            error_references: Vec::new(),
            error_description: Some(description.into()),
            error_level: level,
        }
    }

    pub fn warning(error_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(error_type, description, ErrorLevel::Warning)
    }

    pub fn fatal(error_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(error_type, description, ErrorLevel::Fatal)
    }

    pub fn with_reference(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.error_references.push(ErrorReference {
            reference_key: key.into(),
            reference_value: value.into(),
        });
        self
    }
}
