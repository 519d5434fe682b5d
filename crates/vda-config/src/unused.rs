//! Unused-key report: which configured leaves no reader in a mode consumes.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::leaves::{covers, leaves, normalize};
use crate::ConfigMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    pub mode: String,
    /// Consumed pointers used for this analysis (sorted, unique).
    pub consumed_prefixes: Vec<String>,
    /// Leaves none of them cover (sorted).
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Every pointer `ConnectorConfig::from_config_json` reads, with the modes
/// that read it. Replay never starts the event loop, so `/runtime` is
/// connector-only.
const REGISTRY: &[(&str, &[ConfigMode])] = &[
    ("/vehicle/manufacturer", &[ConfigMode::Connector, ConfigMode::Replay]),
    ("/vehicle/serial_number", &[ConfigMode::Connector, ConfigMode::Replay]),
    ("/vehicle/protocol_version", &[ConfigMode::Connector, ConfigMode::Replay]),
    ("/navigation/deviation_radius_m", &[ConfigMode::Connector, ConfigMode::Replay]),
    ("/navigation/deviation_theta_rad", &[ConfigMode::Connector, ConfigMode::Replay]),
    ("/runtime/queue_capacity", &[ConfigMode::Connector]),
    ("/runtime/state_publish_interval_ms", &[ConfigMode::Connector]),
];

/// JSON pointers read in `mode`.
pub fn consumed_pointers_for_mode(mode: ConfigMode) -> Vec<&'static str> {
    REGISTRY
        .iter()
        .filter(|(_, modes)| modes.contains(&mode))
        .map(|(pointer, _)| *pointer)
        .collect()
}

/// Produce an unused-key report for `mode`.
/// `Fail` turns a non-clean report into an error; `Warn` always returns it.
pub fn report_unused_keys(
    mode: ConfigMode,
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let mut consumed: Vec<String> = consumed_pointers_for_mode(mode)
        .into_iter()
        .map(normalize)
        .collect();
    consumed.sort();
    consumed.dedup();

    // `leaves` is sorted and yields each pointer once.
    let unused: Vec<String> = leaves(config_json)
        .into_iter()
        .map(|(pointer, _)| pointer)
        .filter(|pointer| !consumed.iter().any(|c| covers(c, pointer)))
        .collect();

    let report = UnusedKeyReport {
        mode: mode.as_str().to_string(),
        consumed_prefixes: consumed,
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        let preview: Vec<&String> = report.unused_leaf_pointers.iter().take(12).collect();
        bail!(
            "CONFIG_UNUSED_KEYS (mode={}): {} config key(s) not read by the connector. \
            Remove them or register the reader. First few: {:?}",
            report.mode,
            report.unused_leaf_pointers.len(),
            preview
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_reads_a_subset_of_connector() {
        let connector = consumed_pointers_for_mode(ConfigMode::Connector);
        let replay = consumed_pointers_for_mode(ConfigMode::Replay);
        assert!(replay.iter().all(|p| connector.contains(p)));
        assert_eq!(connector.len() - replay.len(), 2);
    }
}
