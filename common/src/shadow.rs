//! Shadow-state reconciliation: turning raw gateway telemetry into the
//! operator-editable control document, and control edits back into the
//! desired-state payload submitted upstream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schedule::{IrrigationSchedule, RepeatMode, DEFAULT_START_TIME};
use crate::telemetry::{TelemetryRecord, WireBool, WireNumber};

pub const FALLBACK_SOIL_THRESHOLD: f64 = 0.0;
pub const FALLBACK_POLL_INTERVAL_S: u32 = 60;
pub const FALLBACK_DURATION_MIN: f64 = 0.0;

/// Boolean coercion rule for telemetry flags.
///
/// Deployed gateway firmware genuinely forks here: most revisions report
/// flags as the literal strings "true"/"false", one reports native JSON
/// booleans. Under `StrictString` only the string "true" counts as set — a
/// native `true` normalizes to false. `AcceptNative` additionally honors
/// native booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoolCoercion {
    StrictString,
    AcceptNative,
}

impl BoolCoercion {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "strict-string" => Some(Self::StrictString),
            "accept-native" => Some(Self::AcceptNative),
            _ => None,
        }
    }
}

impl Default for BoolCoercion {
    fn default() -> Self {
        Self::StrictString
    }
}

pub fn flag_is_true(field: Option<&WireBool>, coercion: BoolCoercion) -> bool {
    match field {
        Some(WireBool::Text(raw)) => raw == "true",
        Some(WireBool::Native(value)) => coercion == BoolCoercion::AcceptNative && *value,
        None => false,
    }
}

/// Operator-editable mirror of the gateway configuration. Invariant: every
/// field holds a native type — coercion happens at the boundaries, never
/// inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlState {
    pub auto_mode: bool,
    pub tank_pump: bool,
    #[serde(rename = "irr_pump")]
    pub irrigation_pump: bool,
    pub soil_threshold: f64,
    #[serde(rename = "poll_interval")]
    pub poll_interval_s: u32,
    pub irrigation_schedule: IrrigationSchedule,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            auto_mode: false,
            tank_pump: false,
            irrigation_pump: false,
            soil_threshold: 40.0,
            poll_interval_s: 60,
            irrigation_schedule: IrrigationSchedule::default(),
        }
    }
}

/// Wire payload for a shadow submission. The `{ state: { desired: ... } }`
/// envelope is applied by the transport adapter only; building the document
/// never wraps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesiredStateDocument {
    pub auto_mode: bool,
    pub tank_pump: bool,
    pub irr_pump: bool,
    pub soil_threshold: f64,
    pub poll_interval: u32,
    pub irrigation_schedule: IrrigationSchedule,
}

fn number_or(field: Option<&WireNumber>, fallback: f64) -> f64 {
    field
        .and_then(WireNumber::as_f64)
        .filter(|value| value.is_finite())
        .unwrap_or(fallback)
}

fn interval_or(field: Option<&WireNumber>, fallback: u32) -> u32 {
    field
        .and_then(WireNumber::as_f64)
        .filter(|value| value.is_finite() && *value >= 0.0)
        .map(|value| value as u32)
        .unwrap_or(fallback)
}

/// Normalizes a raw telemetry record into control state, applying the
/// boolean coercion rule and the documented fallbacks for absent or
/// non-numeric fields.
pub fn normalize_controls(record: &TelemetryRecord, coercion: BoolCoercion) -> ControlState {
    ControlState {
        auto_mode: flag_is_true(record.auto_mode.as_ref(), coercion),
        tank_pump: flag_is_true(record.tank_pump.as_ref(), coercion),
        irrigation_pump: flag_is_true(record.irrigation_pump.as_ref(), coercion),
        soil_threshold: number_or(record.soil_threshold.as_ref(), FALLBACK_SOIL_THRESHOLD),
        poll_interval_s: interval_or(record.poll_interval_s.as_ref(), FALLBACK_POLL_INTERVAL_S),
        irrigation_schedule: IrrigationSchedule {
            enabled: flag_is_true(record.irrigation_enabled.as_ref(), coercion),
            start_time: record
                .irrigation_start_time
                .clone()
                .unwrap_or_else(|| DEFAULT_START_TIME.to_string()),
            duration_min: number_or(record.irrigation_duration_min.as_ref(), FALLBACK_DURATION_MIN),
            repeat: record
                .irrigation_repeat
                .as_deref()
                .and_then(RepeatMode::parse)
                .unwrap_or(RepeatMode::Daily),
        },
    }
}

/// Builds the outbound desired-state document: a verbatim copy with numeric
/// coercion enforced on threshold, poll interval, and duration.
pub fn build_desired_state(controls: &ControlState) -> DesiredStateDocument {
    let schedule = &controls.irrigation_schedule;
    DesiredStateDocument {
        auto_mode: controls.auto_mode,
        tank_pump: controls.tank_pump,
        irr_pump: controls.irrigation_pump,
        soil_threshold: finite_or(controls.soil_threshold, FALLBACK_SOIL_THRESHOLD),
        poll_interval: controls.poll_interval_s,
        irrigation_schedule: IrrigationSchedule {
            enabled: schedule.enabled,
            start_time: schedule.start_time.clone(),
            duration_min: finite_or(schedule.duration_min, FALLBACK_DURATION_MIN),
            repeat: schedule.repeat,
        },
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Coerces a form-submitted JSON value to a number, parse-or-default. Form
/// widgets deliver numbers as strings as often as not.
pub fn coerce_number(value: &Value, fallback: f64) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().filter(|v| v.is_finite()).unwrap_or(fallback),
        Value::String(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(fallback),
        _ => fallback,
    }
}

/// Integer variant of [`coerce_number`]; fractional input truncates.
pub fn coerce_interval(value: &Value, fallback: u32) -> u32 {
    match value {
        Value::Number(_) | Value::String(_) => {
            let parsed = coerce_number(value, -1.0);
            if parsed >= 0.0 {
                parsed as u32
            } else {
                fallback
            }
        }
        _ => fallback,
    }
}

/// Form-side boolean: native JSON booleans and the literal strings
/// "true"/"false" are accepted, anything else is rejected. The telemetry-side
/// string-equality rule does not apply to our own form input.
pub fn value_to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(raw) if raw == "true" => Some(true),
        Value::String(raw) if raw == "false" => Some(false),
        _ => None,
    }
}
