//! Typed view of the keys the connector reads.

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use vda_schemas::DEFAULT_PROTOCOL_VERSION;

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorConfig {
    pub manufacturer: String,
    pub serial_number: String,
    pub protocol_version: String,
    /// Default positional tolerance for the deviation check, metres.
    pub deviation_radius_m: f64,
    /// Default heading tolerance, radians. `None` disables the heading check
    /// for nodes that declare no tolerance.
    pub deviation_theta_rad: Option<f64>,
    /// Bound of the inbound event queue.
    pub queue_capacity: usize,
    /// Period of the unsolicited state publish.
    pub state_publish_interval_ms: u64,
}

impl ConnectorConfig {
    pub fn from_config_json(cfg: &Value) -> Result<Self> {
        let manufacturer = required_str(cfg, "/vehicle/manufacturer")?;
        let serial_number = required_str(cfg, "/vehicle/serial_number")?;
        let protocol_version = cfg
            .pointer("/vehicle/protocol_version")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PROTOCOL_VERSION)
            .to_string();

        let deviation_radius_m = optional_f64(cfg, "/navigation/deviation_radius_m")?.unwrap_or(0.5);
        if !(deviation_radius_m.is_finite() && deviation_radius_m > 0.0) {
            return Err(anyhow!(
                "navigation.deviation_radius_m must be finite and > 0 (got {deviation_radius_m})"
            ));
        }
        let deviation_theta_rad = optional_f64(cfg, "/navigation/deviation_theta_rad")?;
        if let Some(t) = deviation_theta_rad {
            if !(t.is_finite() && t > 0.0) {
                return Err(anyhow!(
                    "navigation.deviation_theta_rad must be finite and > 0 (got {t})"
                ));
            }
        }

        let queue_capacity = optional_u64(cfg, "/runtime/queue_capacity")?.unwrap_or(64);
        if queue_capacity == 0 {
            return Err(anyhow!("runtime.queue_capacity must be > 0"));
        }
        let queue_capacity =
            usize::try_from(queue_capacity).context("runtime.queue_capacity out of range")?;
        let state_publish_interval_ms =
            optional_u64(cfg, "/runtime/state_publish_interval_ms")?.unwrap_or(1000);
        if state_publish_interval_ms == 0 {
            return Err(anyhow!("runtime.state_publish_interval_ms must be > 0"));
        }

        Ok(Self {
            manufacturer,
            serial_number,
            protocol_version,
            deviation_radius_m,
            deviation_theta_rad,
            queue_capacity,
            state_publish_interval_ms,
        })
    }
}

fn required_str(cfg: &Value, pointer: &str) -> Result<String> {
    let s = cfg
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .with_context(|| format!("config missing {}", dotted(pointer)))?;
    Ok(s.to_string())
}

/// Number or numeric string; absent/null is `None`.
fn optional_f64(cfg: &Value, pointer: &str) -> Result<Option<f64>> {
    match cfg.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .with_context(|| format!("{} is not a number: {s:?}", dotted(pointer))),
        Some(other) => Err(anyhow!("{} must be a number (got {other})", dotted(pointer))),
    }
}

fn optional_u64(cfg: &Value, pointer: &str) -> Result<Option<u64>> {
    match cfg.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .with_context(|| format!("{} must be a non-negative integer (got {v})", dotted(pointer))),
    }
}

/// "/runtime/queue_capacity" -> "runtime.queue_capacity"
fn dotted(pointer: &str) -> String {
    pointer.trim_start_matches('/').replace('/', ".")
}
