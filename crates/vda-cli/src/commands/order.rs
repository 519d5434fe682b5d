//! `vda validate-order`.

use anyhow::{bail, Context, Result};
use vda_order::validate_graph;
use vda_schemas::OrderMessage;

use super::read_json_text;

/// Parse `path` as an order message and run the graph validator.
/// A violation is returned as an error so the process exits non-zero.
pub fn validate_order(path: &str) -> Result<()> {
    let raw = read_json_text(path)?;
    let msg: OrderMessage = serde_json::from_str(raw.trim())
        .with_context(|| format!("{} is not a valid order message", path))?;

    if let Err(violation) = validate_graph(&msg.nodes, &msg.edges) {
        bail!(
            "ORDER_INVALID order_id={} order_update_id={}: {}",
            msg.order_id,
            msg.order_update_id,
            violation
        );
    }

    println!(
        "order_valid=true order_id={} order_update_id={}",
        msg.order_id, msg.order_update_id
    );
    println!(
        "nodes={} edges={} actions={} released_nodes={}",
        msg.nodes.len(),
        msg.edges.len(),
        msg.actions().count(),
        msg.nodes.iter().filter(|n| n.released).count()
    );
    Ok(())
}
