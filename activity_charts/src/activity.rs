//! Activity summaries as delivered by the activity API, plus the shaping
//! steps that pick chartable records out of them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ChartError;

const ACTIVITY_URL_BASE: &str = "https://www.strava.com/activities";

/// One activity summary. Every field is optional; upstream records are
/// frequently sparse (manual entries, no heart-rate strap, trainer rides).
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Activity {
    pub id: Option<u64>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub sport_type: Option<String>,
    pub start_date: Option<String>,
    pub start_date_local: Option<String>,
    pub timezone: Option<String>,
    pub utc_offset: Option<f64>,
    pub distance: Option<f64>,
    pub moving_time: Option<f64>,
    pub elapsed_time: Option<f64>,
    pub total_elevation_gain: Option<f64>,
    pub elev_high: Option<f64>,
    pub elev_low: Option<f64>,
    pub average_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub average_heartrate: Option<f64>,
    pub max_heartrate: Option<f64>,
    pub average_cadence: Option<f64>,
    pub average_watts: Option<f64>,
    pub kilojoules: Option<f64>,
    pub average_temp: Option<f64>,
    pub kudos_count: Option<f64>,
    pub trainer: Option<bool>,
    pub commute: Option<bool>,
    pub manual: Option<bool>,
}

impl Activity {
    pub fn url(&self) -> Option<String> {
        self.id.map(|id| format!("{}/{}", ACTIVITY_URL_BASE, id))
    }

    /// Hour of day (0..=23) the activity started.
    ///
    /// Prefers the athlete's local wall clock (`start_date_local`) and falls
    /// back to `start_date` in UTC.
    pub fn start_hour(&self) -> Option<u32> {
        if let Some(local) = self.start_date_local.as_deref() {
            if let Some(hour) = wall_clock_hour(local) {
                return Some(hour);
            }
            warn!(id = ?self.id, value = local, "unparseable start_date_local");
        }
        let utc = self.start_date.as_deref()?;
        match DateTime::parse_from_rfc3339(utc) {
            Ok(ts) => Some(ts.with_timezone(&Utc).hour()),
            Err(_) => match parse_naive(utc) {
                Some(naive) => Some(naive.hour()),
                None => {
                    warn!(id = ?self.id, value = utc, "unparseable start_date");
                    None
                }
            },
        }
    }
}

/// The time-of-day printed in the string, ignoring any offset suffix.
fn wall_clock_hour(value: &str) -> Option<u32> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_local().hour());
    }
    parse_naive(value).map(|naive| naive.hour())
}

fn parse_naive(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

/// Named numeric field of an [`Activity`], usable as a chart axis selector.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityField {
    Distance,
    MovingTime,
    ElapsedTime,
    TotalElevationGain,
    ElevHigh,
    ElevLow,
    AverageSpeed,
    MaxSpeed,
    AverageHeartrate,
    MaxHeartrate,
    AverageCadence,
    AverageWatts,
    Kilojoules,
    AverageTemp,
    KudosCount,
}

impl ActivityField {
    pub fn all() -> &'static [ActivityField] {
        &[
            ActivityField::Distance,
            ActivityField::MovingTime,
            ActivityField::ElapsedTime,
            ActivityField::TotalElevationGain,
            ActivityField::ElevHigh,
            ActivityField::ElevLow,
            ActivityField::AverageSpeed,
            ActivityField::MaxSpeed,
            ActivityField::AverageHeartrate,
            ActivityField::MaxHeartrate,
            ActivityField::AverageCadence,
            ActivityField::AverageWatts,
            ActivityField::Kilojoules,
            ActivityField::AverageTemp,
            ActivityField::KudosCount,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActivityField::Distance => "distance",
            ActivityField::MovingTime => "moving_time",
            ActivityField::ElapsedTime => "elapsed_time",
            ActivityField::TotalElevationGain => "total_elevation_gain",
            ActivityField::ElevHigh => "elev_high",
            ActivityField::ElevLow => "elev_low",
            ActivityField::AverageSpeed => "average_speed",
            ActivityField::MaxSpeed => "max_speed",
            ActivityField::AverageHeartrate => "average_heartrate",
            ActivityField::MaxHeartrate => "max_heartrate",
            ActivityField::AverageCadence => "average_cadence",
            ActivityField::AverageWatts => "average_watts",
            ActivityField::Kilojoules => "kilojoules",
            ActivityField::AverageTemp => "average_temp",
            ActivityField::KudosCount => "kudos_count",
        }
    }

    pub fn value(&self, activity: &Activity) -> Option<f64> {
        match self {
            ActivityField::Distance => activity.distance,
            ActivityField::MovingTime => activity.moving_time,
            ActivityField::ElapsedTime => activity.elapsed_time,
            ActivityField::TotalElevationGain => activity.total_elevation_gain,
            ActivityField::ElevHigh => activity.elev_high,
            ActivityField::ElevLow => activity.elev_low,
            ActivityField::AverageSpeed => activity.average_speed,
            ActivityField::MaxSpeed => activity.max_speed,
            ActivityField::AverageHeartrate => activity.average_heartrate,
            ActivityField::MaxHeartrate => activity.max_heartrate,
            ActivityField::AverageCadence => activity.average_cadence,
            ActivityField::AverageWatts => activity.average_watts,
            ActivityField::Kilojoules => activity.kilojoules,
            ActivityField::AverageTemp => activity.average_temp,
            ActivityField::KudosCount => activity.kudos_count,
        }
    }

    /// Returns a selector closure for the bounds and trend functions.
    pub fn selector(self) -> impl Fn(&Activity) -> Option<f64> + Copy {
        move |activity: &Activity| self.value(activity)
    }
}

impl FromStr for ActivityField {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        ActivityField::all()
            .iter()
            .copied()
            .find(|field| field.name().eq_ignore_ascii_case(token))
            .ok_or_else(|| ChartError::InvalidField(s.to_string()))
    }
}

impl fmt::Display for ActivityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One dot on the heart rate vs. speed scatter plot.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScatterPoint {
    pub heartrate: f64,
    /// Meters per second until a unit system is applied.
    pub speed: f64,
    pub url: Option<String>,
    pub name: String,
    pub sport_type: String,
}

impl ScatterPoint {
    pub fn heartrate_field(&self) -> Option<f64> {
        Some(self.heartrate)
    }

    pub fn speed_field(&self) -> Option<f64> {
        Some(self.speed)
    }
}

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}

/// Activities with a recorded average heart rate, average speed and sport.
///
/// Zero readings count as missing: they come from activities where the
/// sensor was absent rather than from a real measurement.
pub fn heartrate_points(activities: &[Activity]) -> Vec<ScatterPoint> {
    let points: Vec<ScatterPoint> = activities
        .iter()
        .filter_map(|activity| {
            let heartrate = present(activity.average_heartrate)?;
            let speed = present(activity.average_speed)?;
            let sport_type = activity
                .sport_type
                .as_deref()
                .filter(|s| !s.is_empty())?;
            Some(ScatterPoint {
                heartrate,
                speed,
                url: activity.url(),
                name: activity.name.clone().unwrap_or_default(),
                sport_type: sport_type.to_string(),
            })
        })
        .collect();
    debug!(
        total = activities.len(),
        kept = points.len(),
        "selected heart rate points"
    );
    points
}
