//! Conversions from stored SI values (meters, seconds, m/s) to display units.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ChartError;

const METERS_TO_KILOMETERS: f64 = 0.001;
const METERS_TO_MILES: f64 = 0.000621371;
const METERS_TO_FEET: f64 = 3.28084;
const MPS_TO_KPH: f64 = 3.6;
const MPS_TO_MPH: f64 = 2.23694;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum UnitSystem {
    Metric,
    Imperial,
}

impl Default for UnitSystem {
    fn default() -> Self {
        UnitSystem::Metric
    }
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub fn labels(&self) -> UnitLabels {
        match self {
            UnitSystem::Metric => UnitLabels {
                distance: "km",
                elevation: "m",
                speed: "km/h",
            },
            UnitSystem::Imperial => UnitLabels {
                distance: "mi",
                elevation: "ft",
                speed: "mph",
            },
        }
    }
}

impl FromStr for UnitSystem {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            _ => Err(ChartError::InvalidUnit(s.to_string())),
        }
    }
}

impl TryFrom<String> for UnitSystem {
    type Error = ChartError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum TimeUnit {
    Minutes,
    Hours,
}

impl FromStr for TimeUnit {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minutes" => Ok(TimeUnit::Minutes),
            "hours" => Ok(TimeUnit::Hours),
            _ => Err(ChartError::InvalidUnit(s.to_string())),
        }
    }
}

impl TryFrom<String> for TimeUnit {
    type Error = ChartError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Axis captions for each converted quantity.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct UnitLabels {
    pub distance: &'static str,
    pub elevation: &'static str,
    pub speed: &'static str,
}

/// Meters to kilometers or miles.
pub fn convert_distance(value: f64, to: UnitSystem) -> f64 {
    match to {
        UnitSystem::Metric => value * METERS_TO_KILOMETERS,
        UnitSystem::Imperial => value * METERS_TO_MILES,
    }
}

/// Meters stay meters for metric; feet for imperial.
pub fn convert_elevation(value: f64, to: UnitSystem) -> f64 {
    match to {
        UnitSystem::Metric => value,
        UnitSystem::Imperial => value * METERS_TO_FEET,
    }
}

/// Seconds to minutes or hours.
pub fn convert_time(value: f64, to: TimeUnit) -> f64 {
    match to {
        TimeUnit::Minutes => value / 60.0,
        TimeUnit::Hours => value / 3600.0,
    }
}

/// Meters per second to km/h or mph.
pub fn convert_speed(value: f64, to: UnitSystem) -> f64 {
    match to {
        UnitSystem::Metric => value * MPS_TO_KPH,
        UnitSystem::Imperial => value * MPS_TO_MPH,
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_convert_speed() {
        assert!(approx(convert_speed(1.0, UnitSystem::Metric), 3.6));
        assert!(approx(convert_speed(1.0, UnitSystem::Imperial), 2.23694));
    }

    #[test]
    fn test_bogus_unit_token_is_rejected() {
        let err = "bogus".parse::<UnitSystem>().unwrap_err();
        assert!(matches!(err, ChartError::InvalidUnit(ref t) if t == "bogus"));
        assert!("days".parse::<TimeUnit>().is_err());
    }

    #[test]
    fn test_unit_tokens() {
        assert_eq!("metric".parse::<UnitSystem>().unwrap(), UnitSystem::Metric);
        assert_eq!(" Imperial ".parse::<UnitSystem>().unwrap(), UnitSystem::Imperial);
        assert_eq!("hours".parse::<TimeUnit>().unwrap(), TimeUnit::Hours);
        assert_eq!(UnitSystem::Imperial.to_string(), "imperial");
    }

    #[test]
    fn test_deserialize_goes_through_token_parsing() {
        let units: UnitSystem = serde_json::from_str(r#"" Imperial""#).unwrap();
        assert_eq!(units, UnitSystem::Imperial);
        let hours: TimeUnit = serde_json::from_str(r#""HOURS""#).unwrap();
        assert_eq!(hours, TimeUnit::Hours);

        let err = serde_json::from_str::<UnitSystem>(r#""bogus""#).unwrap_err();
        assert!(err.to_string().contains("unsupported unit type: bogus"));
        assert_eq!(serde_json::to_string(&UnitSystem::Metric).unwrap(), r#""metric""#);
    }

    #[test]
    fn test_convert_distance_and_elevation() {
        assert!(approx(convert_distance(10_000.0, UnitSystem::Metric), 10.0));
        assert!(approx(convert_distance(1000.0, UnitSystem::Imperial), 0.621371));
        assert!(approx(convert_elevation(100.0, UnitSystem::Metric), 100.0));
        assert!(approx(convert_elevation(100.0, UnitSystem::Imperial), 328.084));
    }

    #[test]
    fn test_convert_time() {
        assert!(approx(convert_time(5400.0, TimeUnit::Minutes), 90.0));
        assert!(approx(convert_time(5400.0, TimeUnit::Hours), 1.5));
    }

    #[test]
    fn test_labels() {
        assert_eq!(UnitSystem::Metric.labels().speed, "km/h");
        assert_eq!(UnitSystem::Imperial.labels().elevation, "ft");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(11.523, 2), 11.52);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(f64::MAX, 2), f64::MAX);
    }
}
