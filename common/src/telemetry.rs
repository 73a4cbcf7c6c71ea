use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Boolean-like wire field. Gateway firmware revisions disagree on whether
/// flags are JSON booleans or the literal strings "true"/"false", so the raw
/// encoding is preserved until the reconciler applies its coercion rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireBool {
    Native(bool),
    Text(String),
}

/// Number-like wire field; same story as [`WireBool`] for numeric values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireNumber {
    Num(f64),
    Text(String),
}

impl WireNumber {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Num(value) => Some(*value),
            Self::Text(raw) => raw.trim().parse::<f64>().ok(),
        }
    }
}

/// One gateway telemetry snapshot as reported by the remote service.
///
/// Every field is optional on the wire; aliases cover the two field-name
/// spellings that appear across deployed gateway revisions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryRecord {
    pub time: Option<WireNumber>,
    pub node_id: Option<WireNumber>,
    #[serde(alias = "temperature")]
    pub temperature_c: Option<WireNumber>,
    #[serde(alias = "humidity")]
    pub humidity_pct: Option<WireNumber>,
    pub lux: Option<WireNumber>,
    #[serde(alias = "soil_moisture")]
    pub soil_moisture_pct: Option<WireNumber>,
    pub tank_pump: Option<WireBool>,
    pub irrigation_pump: Option<WireBool>,
    pub auto_mode: Option<WireBool>,
    pub soil_threshold: Option<WireNumber>,
    #[serde(alias = "poll_interval")]
    pub poll_interval_s: Option<WireNumber>,
    pub tank_status: Option<String>,
    pub firmware_version: Option<String>,
    pub lat: Option<WireNumber>,
    pub lon: Option<WireNumber>,
    pub irrigation_enabled: Option<WireBool>,
    pub irrigation_start_time: Option<String>,
    pub irrigation_duration_min: Option<WireNumber>,
    pub irrigation_repeat: Option<String>,
}

impl TelemetryRecord {
    /// Packet time as epoch milliseconds. Numeric values are taken as millis
    /// verbatim; strings are parsed as RFC 3339, then as a numeric literal.
    pub fn timestamp_ms(&self) -> Option<i64> {
        match self.time.as_ref()? {
            WireNumber::Num(ms) => Some(*ms as i64),
            WireNumber::Text(raw) => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.timestamp_millis())
                .or_else(|| raw.trim().parse::<i64>().ok()),
        }
    }
}
