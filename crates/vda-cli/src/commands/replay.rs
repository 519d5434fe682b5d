//! `vda replay`: offline run of recorded events through one controller.
//!
//! Rejections are logged by the controller and recorded in the state's
//! error list; replay keeps going so the printed state shows them.

use anyhow::{Context, Result};
use chrono::Utc;
use vda_config::{report_unused_keys, ConfigMode, ConnectorConfig, UnusedKeyPolicy};
use vda_runtime::{ConnectorEvent, VehicleController};

use super::read_json_text;

pub fn replay(config_paths: &[String], events_path: &str) -> Result<()> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = vda_config::load_layered_yaml(&path_refs)?;

    let report = report_unused_keys(ConfigMode::Replay, &loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !report.is_clean() {
        eprintln!(
            "WARN: CONFIG_UNUSED_KEYS mode={} unused_leaf_keys={}",
            report.mode,
            report.unused_leaf_pointers.len()
        );
        for p in report.unused_leaf_pointers.iter().take(50) {
            eprintln!("  unused={}", p);
        }
        let extra = report.unused_leaf_pointers.len().saturating_sub(50);
        if extra > 0 {
            eprintln!("  ... and {} more", extra);
        }
    }

    let cfg = ConnectorConfig::from_config_json(&loaded.config_json)
        .context("connector config invalid")?;

    let raw = read_json_text(events_path)?;
    let events: Vec<ConnectorEvent> = serde_json::from_str(raw.trim())
        .with_context(|| format!("{} must be a JSON array of tagged events", events_path))?;

    let mut controller = VehicleController::new(&cfg);
    let mut rejected = 0usize;
    for (index, event) in events.iter().enumerate() {
        if let Err(err) = controller.apply(event) {
            rejected += 1;
            tracing::debug!(index, kind = event.kind(), error = %err, "replay event rejected");
        }
    }

    eprintln!(
        "replay_events={} rejected={} config_hash={}",
        events.len(),
        rejected,
        loaded.config_hash
    );

    let state = controller.publish_state(Utc::now());
    let json = serde_json::to_string_pretty(&state).context("serialize state json failed")?;
    println!("{}", json);
    Ok(())
}
