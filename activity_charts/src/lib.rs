//! Chart data preparation for fitness activity history.
//!
//! Turns a sparse list of activity summaries into chart-ready geometry:
//! axis bounds, tick sequences, least-squares trend lines clipped to a
//! viewport, and unit conversions.

use thiserror::Error;
use tracing::{debug, warn};

pub mod activity;
pub mod bounds;
pub mod chart;
pub mod ticks;
pub mod trend;
pub mod units;

pub use activity::{heartrate_points, Activity, ActivityField, ScatterPoint};
pub use bounds::{data_bounds, Bounds, Viewport};
pub use chart::{
    heartrate_vs_speed, start_times, ChartParams, HourBucket, ReferenceViewport, ScatterChart,
};
pub use ticks::{calculate_ticks, TickSet};
pub use trend::{
    calculate_trend_line, calculate_trend_line_points, degenerate_segment, Point, Segment,
    TrendLine,
};
pub use units::{
    convert_distance, convert_elevation, convert_speed, convert_time, round_to, TimeUnit,
    UnitLabels, UnitSystem,
};

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("unsupported unit type: {0}")]
    InvalidUnit(String),
    #[error("unknown activity field: {0}")]
    InvalidField(String),
    #[error("failed to parse activity JSON: {0}")]
    ActivityParse(String),
}

pub type Result<T> = std::result::Result<T, ChartError>;

/// Parse a JSON array of activity summaries as exported by the activity API.
///
/// A single object is accepted as a one-element list. Unknown fields are
/// ignored and every known field is optional. Records that do not match the
/// activity shape are skipped with a warning; only a top level that is
/// neither an array nor an object is an error.
pub fn parse_activities(input: &[u8]) -> Result<Vec<Activity>> {
    let value: serde_json::Value =
        serde_json::from_slice(input).map_err(|e| ChartError::ActivityParse(e.to_string()))?;
    let records = match value {
        serde_json::Value::Array(records) => records,
        object @ serde_json::Value::Object(_) => vec![object],
        other => {
            return Err(ChartError::ActivityParse(format!(
                "expected an array of activities, found {}",
                json_kind(&other)
            )))
        }
    };
    let total = records.len();
    let activities: Vec<Activity> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(activity) => Some(activity),
            Err(e) => {
                warn!(index, error = %e, "skipping malformed activity record");
                None
            }
        })
        .collect();
    if activities.len() < total {
        debug!(total, kept = activities.len(), "parsed activities");
    }
    Ok(activities)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_activities_array() {
        let json = br#"[
            {"id": 1, "average_speed": 3.2, "average_heartrate": 150.0, "sport_type": "Run"},
            {"id": 2, "name": "Lunch Ride", "unknown_field": true}
        ]"#;
        let activities = parse_activities(json).unwrap();
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0].average_speed, Some(3.2));
        assert_eq!(activities[1].name.as_deref(), Some("Lunch Ride"));
        assert_eq!(activities[1].average_speed, None);
    }

    #[test]
    fn test_parse_activities_single_object() {
        let activities = parse_activities(br#"{"id": 7}"#).unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].id, Some(7));
    }

    #[test]
    fn test_malformed_record_is_skipped() {
        let json = br#"[
            {"id": 1, "average_speed": 3.2, "average_heartrate": 150.0, "sport_type": "Run"},
            {"id": 2, "average_speed": "n/a"},
            "not an activity",
            {"id": 3}
        ]"#;
        let activities = parse_activities(json).unwrap();
        let ids: Vec<Option<u64>> = activities.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![Some(1), Some(3)]);

        assert!(parse_activities(br#"{"id": "seven"}"#).unwrap().is_empty());
    }

    #[test]
    fn test_degenerate_segment_is_exported_with_its_siblings() {
        let segment: Segment = degenerate_segment();
        assert_eq!(segment, [Point::default(), Point::default()]);
    }

    #[test]
    fn test_parse_activities_rejects_scalars() {
        let err = parse_activities(b"42").unwrap_err();
        assert!(matches!(err, ChartError::ActivityParse(msg) if msg.contains("a number")));
        assert!(parse_activities(b"not json").is_err());
    }
}
