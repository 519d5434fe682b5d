//! Refuse configs that carry credentials inline.
//!
//! Broker passwords and tokens belong in the environment; YAML names the
//! variable instead (`password_env: VDA_BROKER_PASSWORD`).

use anyhow::{bail, Result};
use serde_json::Value;

use crate::leaves::leaves;

/// Known credential shapes, matched at the start of a string leaf.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",
    "sk_live",
    "sk_test",
    "AKIA",
    "-----BEGIN",
    "ghp_",
    "gho_",
    "glpat-",
    "xoxb-",
    "xoxp-",
];

/// Short strings never count; a prefix alone is not a credential.
const MIN_SECRET_LEN: usize = 8;

pub(crate) fn reject_secret_literals(doc: &Value) -> Result<()> {
    for (pointer, value) in leaves(doc) {
        if value.as_str().is_some_and(looks_like_secret) {
            // Never echo the value.
            bail!("CONFIG_SECRET_DETECTED leaf={pointer} value=REDACTED");
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let s = s.trim();
    s.len() >= MIN_SECRET_LEN && SECRET_PREFIXES.iter().any(|p| s.starts_with(p))
}
