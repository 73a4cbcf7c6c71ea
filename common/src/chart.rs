use serde::Serialize;

use crate::telemetry::{TelemetryRecord, WireNumber};

/// One history sample prepared for chart axes: timestamp as epoch millis,
/// readings decoded to plain numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub time_ms: i64,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub lux: Option<f64>,
    pub soil_moisture_pct: Option<f64>,
}

impl ChartPoint {
    /// Returns None when the record carries no parseable timestamp; such
    /// samples cannot be placed on a time axis and are dropped.
    pub fn from_record(record: &TelemetryRecord) -> Option<Self> {
        Some(Self {
            time_ms: record.timestamp_ms()?,
            temperature_c: record.temperature_c.as_ref().and_then(WireNumber::as_f64),
            humidity_pct: record.humidity_pct.as_ref().and_then(WireNumber::as_f64),
            lux: record.lux.as_ref().and_then(WireNumber::as_f64),
            soil_moisture_pct: record
                .soil_moisture_pct
                .as_ref()
                .and_then(WireNumber::as_f64),
        })
    }
}

/// Ordered history series, replaced wholesale on every fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChartSeries {
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn from_records(records: &[TelemetryRecord]) -> Self {
        Self {
            points: records.iter().filter_map(ChartPoint::from_record).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn series_normalizes_timestamps_and_drops_unplottable_samples() {
        let records: Vec<TelemetryRecord> = serde_json::from_value(json!([
            { "time": "2026-03-14T00:00:00Z", "temperature_c": "21.5", "lux": 800 },
            { "time": 1773446460000i64, "humidity_pct": 51 },
            { "temperature_c": 19.0 },
            { "time": "not a time" }
        ]))
        .unwrap();

        let series = ChartSeries::from_records(&records);

        assert_eq!(series.len(), 2);
        assert_eq!(series.points[0].time_ms, 1_773_446_400_000);
        assert_eq!(series.points[0].temperature_c, Some(21.5));
        assert_eq!(series.points[0].lux, Some(800.0));
        assert_eq!(series.points[1].time_ms, 1_773_446_460_000);
        assert_eq!(series.points[1].humidity_pct, Some(51.0));
    }

    #[test]
    fn series_serializes_as_a_plain_array() {
        let series = ChartSeries::from_records(&[]);
        assert_eq!(serde_json::to_value(&series).unwrap(), json!([]));
    }
}
