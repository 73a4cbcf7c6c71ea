use chrono::{DateTime, Duration, FixedOffset, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

pub const DEFAULT_START_TIME: &str = "06:30";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    Daily,
    Weekly,
    None,
}

impl RepeatMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "none" => Some(Self::None),
            _ => Option::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::None => "none",
        }
    }
}

/// Parses an "HH:MM" clock time into minutes since midnight.
pub fn parse_start_time(raw: &str) -> Option<u16> {
    let (hours, minutes) = raw.split_once(':')?;
    let hours: u16 = hours.parse().ok()?;
    let minutes: u16 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationSchedule {
    pub enabled: bool,
    pub start_time: String,
    pub duration_min: f64,
    pub repeat: RepeatMode,
}

impl Default for IrrigationSchedule {
    fn default() -> Self {
        Self {
            enabled: false,
            start_time: DEFAULT_START_TIME.to_string(),
            duration_min: 15.0,
            repeat: RepeatMode::Daily,
        }
    }
}

impl IrrigationSchedule {
    pub fn start_minutes(&self) -> Option<u16> {
        parse_start_time(&self.start_time)
    }

    /// Epoch seconds of the next scheduled run, or None when the schedule is
    /// disabled, the start time is unparseable, or a one-shot has passed.
    pub fn next_run_epoch(&self, now: DateTime<FixedOffset>) -> Option<i64> {
        if !self.enabled {
            return None;
        }

        let start = self.start_minutes()? as i64;
        let now_minutes = now.hour() as i64 * 60 + now.minute() as i64;
        let still_ahead_today = start > now_minutes;

        let day_offset = match self.repeat {
            RepeatMode::Daily if still_ahead_today => 0,
            RepeatMode::Daily => 1,
            RepeatMode::Weekly if still_ahead_today => 0,
            RepeatMode::Weekly => 7,
            RepeatMode::None if still_ahead_today => 0,
            RepeatMode::None => return Option::None,
        };

        let date = now.date_naive() + Duration::days(day_offset);
        let naive = date.and_hms_opt((start / 60) as u32, (start % 60) as u32, 0)?;
        let candidate = now.offset().from_local_datetime(&naive).single()?;
        Some(candidate.timestamp())
    }
}
