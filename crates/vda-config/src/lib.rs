//! vda-config
//!
//! Layered YAML configuration for the vehicle connector.
//!
//! Layers are merged in order (later overrides earlier, objects merge key by
//! key) and converted to JSON. The merged document is refused if it carries
//! a secret-looking literal, then serialized canonically and hashed so a
//! connector run can be tied to the exact config it started with.
//! [`report_unused_keys`] compares the document against the keys each
//! [`ConfigMode`] reads; [`ConnectorConfig`] is the typed view.

use anyhow::{Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

mod connector;
mod leaves;
mod secrets;
mod unused;

pub use connector::ConnectorConfig;
pub use unused::{consumed_pointers_for_mode, report_unused_keys, UnusedKeyPolicy, UnusedKeyReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMode {
    /// Long-running connector (event loop + periodic publish).
    Connector,
    /// Offline replay of recorded events through the controller.
    Replay,
}

impl ConfigMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigMode::Connector => "CONNECTOR",
            ConfigMode::Replay => "REPLAY",
        }
    }
}

/// Merged configuration plus its canonical form.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Lower-case hex SHA-256 of `canonical_json`.
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

/// Read and merge YAML files in the given order.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|path| {
            fs::read_to_string(path).with_context(|| format!("failed to read config layer: {path}"))
        })
        .collect::<Result<Vec<String>>>()?;
    let doc_refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

/// Merge in-memory YAML documents in the given order.
pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Default::default());
    for (layer, raw) in yaml_docs.iter().enumerate() {
        let doc: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("config layer {layer} is not valid yaml"))?;
        let doc = serde_json::to_value(doc)
            .with_context(|| format!("config layer {layer} has no JSON representation"))?;
        merge_layer(&mut merged, doc);
    }

    secrets::reject_secret_literals(&merged)?;

    // Map keys are ordered, so plain serialization is canonical.
    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge recursively; anything else in `layer` replaces `base`.
fn merge_layer(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base_map), Value::Object(layer_map)) => {
            for (key, value) in layer_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_layer(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
