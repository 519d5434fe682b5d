//! Command handler modules for the `vda` binary.
//!
//! Shared utilities used by multiple command paths live here.

pub mod order;
pub mod replay;

use anyhow::{Context, Result};
use std::fs;

/// Read a UTF-8 JSON file, tolerating a leading byte-order mark.
pub fn read_json_text(path: &str) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("read failed: {}", path))?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    let raw = String::from_utf8(bytes.to_vec())
        .with_context(|| format!("{} must be UTF-8 text", path))?;
    Ok(raw)
}
