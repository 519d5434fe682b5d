//! Navigation monitoring: is the vehicle close enough to a node to count as there?

use std::f64::consts::{PI, TAU};

use vda_schemas::{Node, NodePosition, NodeState};

use crate::state::ExecutionState;

/// Anything that declares where a node is: an order node or its live state.
pub trait Positioned {
    fn node_position(&self) -> Option<&NodePosition>;
}

impl Positioned for Node {
    fn node_position(&self) -> Option<&NodePosition> {
        self.node_position.as_ref()
    }
}

impl Positioned for NodeState {
    fn node_position(&self) -> Option<&NodePosition> {
        self.node_position.as_ref()
    }
}

impl Positioned for NodePosition {
    fn node_position(&self) -> Option<&NodePosition> {
        Some(self)
    }
}

impl ExecutionState {
    /// Compare the current position against `node`'s declared position.
    ///
    /// Positional tolerance is the node's `allowedDeviationXY` when positive,
    /// else the configured radius. Heading is checked only when the node has
    /// a `theta` and some tolerance (node or configured) applies. An
    /// uninitialized position, a node without position, or a different map
    /// is never in range.
    pub fn in_deviation_range<N: Positioned + ?Sized>(&self, node: &N) -> bool {
        let position = &self.telemetry.position;
        let Some(target) = node.node_position() else {
            return false;
        };
        if !position.position_initialized {
            return false;
        }
        if !target.map_id.is_empty()
            && !position.map_id.is_empty()
            && target.map_id != position.map_id
        {
            return false;
        }

        let radius = target
            .allowed_deviation_xy
            .filter(|r| *r > 0.0)
            .unwrap_or(self.settings.deviation_radius_m);
        let distance = (position.x - target.x).hypot(position.y - target.y);
        if distance > radius {
            return false;
        }

        let tolerance = target
            .allowed_deviation_theta
            .filter(|t| *t > 0.0)
            .or(self.settings.deviation_theta_rad);
        match (target.theta, tolerance) {
            (Some(theta), Some(tolerance)) => {
                angle_between(position.theta, theta) <= tolerance
            }
            _ => true,
        }
    }
}

/// Absolute difference of two headings, in `[0, pi]`.
fn angle_between(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(TAU);
    if diff > PI {
        TAU - diff
    } else {
        diff
    }
}
