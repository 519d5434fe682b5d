//! Vehicle telemetry carried in the state message.
//!
//! Numeric fields are updated per group (battery, position, motion). Each
//! group update returns a [`FieldReport`]: valid fields are applied, invalid
//! ones are listed with the reason and the previous value is kept.

use std::f64::consts::PI;

use vda_schemas::{
    AgvPosition, BatteryState, InfoEntry, Load, OperatingMode, SafetyState, StateMessage, Velocity,
};

use crate::state::ExecutionState;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Telemetry {
    pub battery: BatteryState,
    pub position: AgvPosition,
    pub velocity: Velocity,
    pub safety: SafetyState,
    pub operating_mode: OperatingMode,
    pub driving: bool,
    pub paused: bool,
    pub new_base_request: bool,
    pub distance_since_last_node: Option<f64>,
    pub loads: Vec<Load>,
    pub information: Vec<InfoEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRejection {
    NotFinite,
    OutOfRange { min: f64, max: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldOutcome {
    Applied,
    Rejected { value: f64, reason: FieldRejection },
}

/// Per-field outcome of one group update, in the order fields were checked.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldReport {
    outcomes: Vec<(&'static str, FieldOutcome)>,
}

impl FieldReport {
    /// `true` when no field was rejected.
    pub fn is_clean(&self) -> bool {
        self.rejected().next().is_none()
    }

    pub fn outcome(&self, field: &str) -> Option<FieldOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, o)| *o)
    }

    pub fn rejected(&self) -> impl Iterator<Item = (&'static str, FieldRejection)> + '_ {
        self.outcomes.iter().filter_map(|(name, o)| match o {
            FieldOutcome::Rejected { reason, .. } => Some((*name, *reason)),
            FieldOutcome::Applied => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &(&'static str, FieldOutcome)> {
        self.outcomes.iter()
    }

    /// Append the outcomes of `other`.
    pub fn merge(&mut self, other: FieldReport) {
        self.outcomes.extend(other.outcomes);
    }

    fn check(&mut self, field: &'static str, value: f64, min: f64, max: f64) -> Option<f64> {
        match in_range(value, min, max) {
            Ok(v) => {
                self.outcomes.push((field, FieldOutcome::Applied));
                Some(v)
            }
            Err(reason) => {
                self.outcomes
                    .push((field, FieldOutcome::Rejected { value, reason }));
                None
            }
        }
    }
}

fn in_range(value: f64, min: f64, max: f64) -> Result<f64, FieldRejection> {
    if !value.is_finite() {
        return Err(FieldRejection::NotFinite);
    }
    if min <= value && value <= max {
        Ok(value)
    } else {
        Err(FieldRejection::OutOfRange { min, max })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatteryUpdate {
    /// Percent, `[0, 100]`.
    pub charge: Option<f64>,
    pub voltage: Option<f64>,
    /// Percent, `[0, 100]`.
    pub health: Option<f64>,
    pub charging: Option<bool>,
    /// Metres.
    pub reach: Option<f64>,
}

impl From<&BatteryState> for BatteryUpdate {
    fn from(b: &BatteryState) -> Self {
        Self {
            charge: Some(b.battery_charge),
            voltage: b.battery_voltage,
            health: b.battery_health,
            charging: Some(b.charging),
            reach: b.reach,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PositionUpdate {
    pub x: Option<f64>,
    pub y: Option<f64>,
    /// Radians, `[-pi, pi]`.
    pub theta: Option<f64>,
    /// `[0, 1]`.
    pub localization_score: Option<f64>,
    pub deviation_range: Option<f64>,
    pub position_initialized: Option<bool>,
    pub map_id: Option<String>,
    pub map_description: Option<String>,
}

impl From<&AgvPosition> for PositionUpdate {
    fn from(p: &AgvPosition) -> Self {
        Self {
            x: Some(p.x),
            y: Some(p.y),
            theta: Some(p.theta),
            localization_score: p.localization_score,
            deviation_range: p.deviation_range,
            position_initialized: Some(p.position_initialized),
            map_id: Some(p.map_id.clone()),
            map_description: p.map_description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MotionUpdate {
    pub vx: Option<f64>,
    pub vy: Option<f64>,
    pub omega: Option<f64>,
    pub driving: Option<bool>,
    pub paused: Option<bool>,
    pub new_base_request: Option<bool>,
    /// Metres, `>= 0`.
    pub distance_since_last_node: Option<f64>,
}

impl MotionUpdate {
    pub fn from_report(report: &StateMessage) -> Self {
        Self {
            vx: report.velocity.vx,
            vy: report.velocity.vy,
            omega: report.velocity.omega,
            driving: Some(report.driving),
            paused: Some(report.paused),
            new_base_request: Some(report.new_base_request),
            distance_since_last_node: report.distance_since_last_node,
        }
    }
}

impl ExecutionState {
    pub fn configure_battery(&mut self, update: &BatteryUpdate) -> FieldReport {
        let mut report = FieldReport::default();
        let battery = &mut self.telemetry.battery;
        if let Some(v) = update.charge {
            if let Some(v) = report.check("batteryCharge", v, 0.0, 100.0) {
                battery.battery_charge = v;
            }
        }
        if let Some(v) = update.voltage {
            if let Some(v) = report.check("batteryVoltage", v, 0.0, f64::MAX) {
                battery.battery_voltage = Some(v);
            }
        }
        if let Some(v) = update.health {
            if let Some(v) = report.check("batteryHealth", v, 0.0, 100.0) {
                battery.battery_health = Some(v);
            }
        }
        if let Some(v) = update.reach {
            if let Some(v) = report.check("reach", v, 0.0, f64::MAX) {
                battery.reach = Some(v);
            }
        }
        if let Some(charging) = update.charging {
            battery.charging = charging;
        }
        report
    }

    pub fn configure_position(&mut self, update: &PositionUpdate) -> FieldReport {
        let mut report = FieldReport::default();
        let position = &mut self.telemetry.position;
        if let Some(v) = update.x {
            if let Some(v) = report.check("x", v, f64::MIN, f64::MAX) {
                position.x = v;
            }
        }
        if let Some(v) = update.y {
            if let Some(v) = report.check("y", v, f64::MIN, f64::MAX) {
                position.y = v;
            }
        }
        if let Some(v) = update.theta {
            if let Some(v) = report.check("theta", v, -PI, PI) {
                position.theta = v;
            }
        }
        if let Some(v) = update.localization_score {
            if let Some(v) = report.check("localizationScore", v, 0.0, 1.0) {
                position.localization_score = Some(v);
            }
        }
        if let Some(v) = update.deviation_range {
            if let Some(v) = report.check("deviationRange", v, 0.0, f64::MAX) {
                position.deviation_range = Some(v);
            }
        }
        if let Some(initialized) = update.position_initialized {
            position.position_initialized = initialized;
        }
        if let Some(map_id) = &update.map_id {
            position.map_id = map_id.clone();
        }
        if update.map_description.is_some() {
            position.map_description = update.map_description.clone();
        }
        report
    }

    pub fn configure_motion(&mut self, update: &MotionUpdate) -> FieldReport {
        let mut report = FieldReport::default();
        let t = &mut self.telemetry;
        if let Some(v) = update.vx {
            if let Some(v) = report.check("vx", v, f64::MIN, f64::MAX) {
                t.velocity.vx = Some(v);
            }
        }
        if let Some(v) = update.vy {
            if let Some(v) = report.check("vy", v, f64::MIN, f64::MAX) {
                t.velocity.vy = Some(v);
            }
        }
        if let Some(v) = update.omega {
            if let Some(v) = report.check("omega", v, f64::MIN, f64::MAX) {
                t.velocity.omega = Some(v);
            }
        }
        if let Some(v) = update.distance_since_last_node {
            if let Some(v) = report.check("distanceSinceLastNode", v, 0.0, f64::MAX) {
                t.distance_since_last_node = Some(v);
            }
        }
        if let Some(driving) = update.driving {
            t.driving = driving;
        }
        if let Some(paused) = update.paused {
            t.paused = paused;
        }
        if let Some(request) = update.new_base_request {
            t.new_base_request = request;
        }
        report
    }

    pub fn set_operating_mode(&mut self, mode: OperatingMode) {
        self.telemetry.operating_mode = mode;
    }

    pub fn set_safety_state(&mut self, safety: SafetyState) {
        self.telemetry.safety = safety;
    }

    pub fn set_loads(&mut self, loads: Vec<Load>) {
        self.telemetry.loads = loads;
    }

    pub fn set_information(&mut self, information: Vec<InfoEntry>) {
        self.telemetry.information = information;
    }

    /// Apply the telemetry part of a progress report through the group updates.
    pub fn apply_reported_telemetry(&mut self, report: &StateMessage) -> FieldReport {
        let mut fields = self.configure_battery(&BatteryUpdate::from(&report.battery_state));
        fields.merge(self.configure_position(&PositionUpdate::from(&report.agv_position)));
        fields.merge(self.configure_motion(&MotionUpdate::from_report(report)));
        self.set_operating_mode(report.operating_mode);
        self.set_safety_state(report.safety_state.clone());
        self.set_loads(report.loads.clone());
        self.set_information(report.information.clone());
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_range_is_a_real_conjunction() {
        let mut state = ExecutionState::default();
        for bad in [-0.1, 100.1, 250.0] {
            let report = state.configure_battery(&BatteryUpdate {
                charge: Some(bad),
                ..Default::default()
            });
            assert_eq!(
                report.outcome("batteryCharge"),
                Some(FieldOutcome::Rejected {
                    value: bad,
                    reason: FieldRejection::OutOfRange { min: 0.0, max: 100.0 }
                })
            );
        }
        assert_eq!(state.telemetry().battery.battery_charge, 0.0);

        for good in [0.0, 42.5, 100.0] {
            assert!(state
                .configure_battery(&BatteryUpdate {
                    charge: Some(good),
                    ..Default::default()
                })
                .is_clean());
            assert_eq!(state.telemetry().battery.battery_charge, good);
        }
    }

    #[test]
    fn invalid_fields_do_not_block_valid_ones() {
        let mut state = ExecutionState::default();
        let report = state.configure_position(&PositionUpdate {
            x: Some(3.0),
            y: Some(f64::NAN),
            localization_score: Some(1.5),
            position_initialized: Some(true),
            ..Default::default()
        });

        assert_eq!(report.outcome("x"), Some(FieldOutcome::Applied));
        let rejected: Vec<&str> = report.rejected().map(|(f, _)| f).collect();
        assert_eq!(rejected, ["y", "localizationScore"]);
        assert!(matches!(
            report.outcome("y"),
            Some(FieldOutcome::Rejected {
                reason: FieldRejection::NotFinite,
                ..
            })
        ));

        let p = &state.telemetry().position;
        assert_eq!(p.x, 3.0);
        assert_eq!(p.y, 0.0);
        assert_eq!(p.localization_score, None);
        assert!(p.position_initialized);
    }

    #[test]
    fn negative_distance_is_rejected() {
        let mut state = ExecutionState::default();
        let report = state.configure_motion(&MotionUpdate {
            vx: Some(0.8),
            distance_since_last_node: Some(-1.0),
            driving: Some(true),
            ..Default::default()
        });
        assert!(!report.is_clean());
        assert_eq!(state.telemetry().velocity.vx, Some(0.8));
        assert_eq!(state.telemetry().distance_since_last_node, None);
        assert!(state.telemetry().driving);
    }

    #[test]
    fn reported_telemetry_flows_through_groups() {
        let mut state = ExecutionState::default();
        let mut report = StateMessage::default();
        report.battery_state.battery_charge = 77.0;
        report.agv_position.x = 1.5;
        report.agv_position.map_id = "floor-1".to_string();
        report.operating_mode = OperatingMode::Manual;
        report.paused = true;

        assert!(state.apply_reported_telemetry(&report).is_clean());
        let t = state.telemetry();
        assert_eq!(t.battery.battery_charge, 77.0);
        assert_eq!(t.position.map_id, "floor-1");
        assert_eq!(t.operating_mode, OperatingMode::Manual);
        assert!(t.paused);
    }
}
