use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::Value;

use agridash_common::shadow::{
    FALLBACK_DURATION_MIN, FALLBACK_POLL_INTERVAL_S, FALLBACK_SOIL_THRESHOLD,
};
use agridash_common::{
    build_desired_state, coerce_interval, coerce_number, flag_is_true, normalize_controls,
    parse_start_time, value_to_bool, BoolCoercion, ChartSeries, ControlState,
    DesiredStateDocument, RepeatMode, TelemetryRecord, WireNumber,
};

pub const SUCCESS_BANNER_SECS: u64 = 3;
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch sensor data";
pub const NO_TELEMETRY_MESSAGE: &str = "No telemetry data available";

/// The dashboard's single mutable document: last telemetry, the operator's
/// control state, chart history, and transient UI flags. Owned behind a
/// mutex by the web layer and the poller.
pub struct DashboardState {
    coercion: BoolCoercion,
    telemetry: Option<TelemetryRecord>,
    controls: ControlState,
    controls_initialized: bool,
    chart: ChartSeries,
    error: Option<String>,
    success_until: Option<Instant>,
    show_charts: bool,
}

impl DashboardState {
    pub fn new(coercion: BoolCoercion) -> Self {
        Self {
            coercion,
            telemetry: None,
            controls: ControlState::default(),
            controls_initialized: false,
            chart: ChartSeries::default(),
            error: None,
            success_until: None,
            show_charts: false,
        }
    }

    /// Stores a freshly polled record and clears any page-level error.
    /// Control state is seeded from telemetry exactly once per process
    /// lifetime so a slow operator edit is never clobbered by the timer.
    pub fn apply_latest(&mut self, record: TelemetryRecord) {
        if !self.controls_initialized {
            self.controls = normalize_controls(&record, self.coercion);
            self.controls_initialized = true;
        }
        self.telemetry = Some(record);
        self.error = None;
    }

    pub fn apply_history(&mut self, series: ChartSeries) {
        self.chart = series;
    }

    pub fn mark_poll_failed(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn toggle(&mut self, key: &str) -> Result<(), &'static str> {
        match key {
            "auto_mode" => self.controls.auto_mode = !self.controls.auto_mode,
            "tank_pump" => self.controls.tank_pump = !self.controls.tank_pump,
            "irr_pump" => self.controls.irrigation_pump = !self.controls.irrigation_pump,
            _ => return Err("Unknown toggle key"),
        }
        Ok(())
    }

    pub fn set_field(&mut self, key: &str, value: &Value) -> Result<(), &'static str> {
        match key {
            "soil_threshold" => {
                self.controls.soil_threshold = coerce_number(value, FALLBACK_SOIL_THRESHOLD);
            }
            "poll_interval" => {
                self.controls.poll_interval_s = coerce_interval(value, FALLBACK_POLL_INTERVAL_S);
            }
            _ => return Err("Unknown control field"),
        }
        Ok(())
    }

    pub fn set_schedule_field(&mut self, field: &str, value: &Value) -> Result<(), &'static str> {
        let schedule = &mut self.controls.irrigation_schedule;
        match field {
            "enabled" => {
                schedule.enabled = value_to_bool(value).ok_or("'enabled' must be a boolean")?;
            }
            "start_time" => {
                let raw = value.as_str().ok_or("'start_time' must be a string")?;
                if parse_start_time(raw).is_none() {
                    return Err("'start_time' must be HH:MM");
                }
                schedule.start_time = raw.to_string();
            }
            "duration_min" => {
                schedule.duration_min = coerce_number(value, FALLBACK_DURATION_MIN);
            }
            "repeat" => {
                let raw = value.as_str().ok_or("'repeat' must be a string")?;
                schedule.repeat =
                    RepeatMode::parse(raw).ok_or("'repeat' must be daily, weekly, or none")?;
            }
            _ => return Err("Unknown schedule field"),
        }
        Ok(())
    }

    pub fn toggle_charts(&mut self) {
        self.show_charts = !self.show_charts;
    }

    pub fn mark_submit_success(&mut self, now: Instant) {
        self.success_until = Some(now + Duration::from_secs(SUCCESS_BANNER_SECS));
    }

    pub fn desired_state(&self) -> DesiredStateDocument {
        build_desired_state(&self.controls)
    }

    pub fn view(&self, now: Instant, local_now: Option<DateTime<FixedOffset>>) -> DashboardView {
        DashboardView {
            loading: self.telemetry.is_none(),
            error: self.error.clone(),
            success: self.success_until.map(|until| now < until).unwrap_or(false),
            show_charts: self.show_charts,
            snapshot: self
                .telemetry
                .as_ref()
                .map(|record| SnapshotView::from_record(record, self.coercion)),
            controls: self.controls.clone(),
            next_run_epoch: local_now
                .and_then(|now| self.controls.irrigation_schedule.next_run_epoch(now)),
            chart: self.show_charts.then(|| self.chart.clone()),
            telemetry: self.telemetry.clone(),
        }
    }
}

/// Gateway snapshot rendered for display: readings decoded to numbers, pump
/// and mode flags resolved through the same coercion rule the reconciler
/// uses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotView {
    pub time_ms: Option<i64>,
    pub node_id: Option<f64>,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub lux: Option<f64>,
    pub soil_moisture_pct: Option<f64>,
    pub tank_pump_on: bool,
    pub irrigation_pump_on: bool,
    pub auto_mode_on: bool,
    pub soil_threshold: Option<f64>,
    pub tank_status: Option<String>,
    pub poll_interval_s: Option<f64>,
    pub firmware_version: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub schedule_on: bool,
    pub schedule_start_time: Option<String>,
}

impl SnapshotView {
    pub fn from_record(record: &TelemetryRecord, coercion: BoolCoercion) -> Self {
        let number = |field: Option<&WireNumber>| field.and_then(WireNumber::as_f64);
        Self {
            time_ms: record.timestamp_ms(),
            node_id: number(record.node_id.as_ref()),
            temperature_c: number(record.temperature_c.as_ref()),
            humidity_pct: number(record.humidity_pct.as_ref()),
            lux: number(record.lux.as_ref()),
            soil_moisture_pct: number(record.soil_moisture_pct.as_ref()),
            tank_pump_on: flag_is_true(record.tank_pump.as_ref(), coercion),
            irrigation_pump_on: flag_is_true(record.irrigation_pump.as_ref(), coercion),
            auto_mode_on: flag_is_true(record.auto_mode.as_ref(), coercion),
            soil_threshold: number(record.soil_threshold.as_ref()),
            tank_status: record.tank_status.clone(),
            poll_interval_s: number(record.poll_interval_s.as_ref()),
            firmware_version: record.firmware_version.clone(),
            lat: number(record.lat.as_ref()),
            lon: number(record.lon.as_ref()),
            schedule_on: flag_is_true(record.irrigation_enabled.as_ref(), coercion),
            schedule_start_time: record.irrigation_start_time.clone(),
        }
    }
}

/// Pure projection of the dashboard for rendering; never mutated by the
/// presentation side.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub loading: bool,
    pub error: Option<String>,
    pub success: bool,
    pub show_charts: bool,
    pub snapshot: Option<SnapshotView>,
    pub controls: ControlState,
    pub next_run_epoch: Option<i64>,
    pub chart: Option<ChartSeries>,
    pub telemetry: Option<TelemetryRecord>,
}
