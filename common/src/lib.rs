pub mod chart;
pub mod config;
pub mod schedule;
pub mod shadow;
pub mod telemetry;

pub use chart::{ChartPoint, ChartSeries};
pub use config::DashboardConfig;
pub use schedule::{parse_start_time, IrrigationSchedule, RepeatMode};
pub use shadow::{
    build_desired_state, coerce_interval, coerce_number, flag_is_true, normalize_controls,
    value_to_bool, BoolCoercion, ControlState, DesiredStateDocument,
};
pub use telemetry::{TelemetryRecord, WireBool, WireNumber};
