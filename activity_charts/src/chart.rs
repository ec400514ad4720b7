//! Chart geometry for the activity dashboard.
//!
//! Each builder runs the engine steps in dependency order: shape records,
//! then bounds and trend, then ticks and the clipped reference line.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::activity::{heartrate_points, Activity, ScatterPoint};
use crate::bounds::{data_bounds, Bounds, Viewport};
use crate::ticks::{calculate_ticks, TickSet};
use crate::trend::{
    calculate_trend_line, calculate_trend_line_points, degenerate_segment, Segment, TrendLine,
};
use crate::units::{convert_speed, round_to, UnitSystem};

const HOURS_PER_DAY: u32 = 24;

/// Viewport used to clip the reference line, derived from the data bounds.
///
/// The maxima are scaled far past the data so the clipped line runs across
/// the whole plot once the renderer extends its domain to the reference line.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReferenceViewport {
    pub x_min: f64,
    pub x_scale: f64,
    pub y_scale: f64,
    pub y_min_offset: f64,
}

impl Default for ReferenceViewport {
    fn default() -> Self {
        Self {
            x_min: 0.0,
            x_scale: 10.0,
            y_scale: 10.0,
            y_min_offset: 5.0,
        }
    }
}

impl ReferenceViewport {
    pub fn viewport(&self, bounds: &Bounds) -> Viewport {
        Viewport::new(
            self.x_min,
            bounds.x_max * self.x_scale,
            bounds.y_min - self.y_min_offset,
            bounds.y_max * self.y_scale,
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartParams {
    pub units: UnitSystem,
    pub tick_count: usize,
    /// Padding added on both sides of the x axis domain.
    pub x_offset: f64,
    /// Padding added on both sides of the y axis domain.
    pub y_offset: f64,
    pub reference_viewport: ReferenceViewport,
}

impl Default for ChartParams {
    fn default() -> Self {
        Self {
            units: UnitSystem::Metric,
            tick_count: 5,
            x_offset: 2.0,
            y_offset: 5.0,
            reference_viewport: ReferenceViewport::default(),
        }
    }
}

/// Heart rate against speed, with a least-squares reference line.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScatterChart {
    pub units: UnitSystem,
    pub speed_unit: String,
    pub points: Vec<ScatterPoint>,
    pub bounds: Bounds,
    pub x_domain: (f64, f64),
    pub y_domain: (f64, f64),
    pub x_ticks: TickSet,
    pub y_ticks: TickSet,
    pub trend: TrendLine,
    pub reference_line: Segment,
}

impl ScatterChart {
    pub fn empty(units: UnitSystem) -> Self {
        Self {
            units,
            speed_unit: units.labels().speed.to_string(),
            points: Vec::new(),
            bounds: Bounds::default(),
            x_domain: (0.0, 0.0),
            y_domain: (0.0, 0.0),
            x_ticks: Vec::new(),
            y_ticks: Vec::new(),
            trend: TrendLine::default(),
            reference_line: degenerate_segment(),
        }
    }

    /// False means the consumer should show a "no data" placeholder.
    pub fn has_data(&self) -> bool {
        !self.points.is_empty()
    }
}

pub fn heartrate_vs_speed(activities: &[Activity], params: &ChartParams) -> ScatterChart {
    let points: Vec<ScatterPoint> = heartrate_points(activities)
        .into_iter()
        .map(|mut point| {
            point.speed = round_to(convert_speed(point.speed, params.units), 2);
            point
        })
        .collect();
    if points.is_empty() {
        return ScatterChart::empty(params.units);
    }

    let bounds = data_bounds(&points, ScatterPoint::speed_field, ScatterPoint::heartrate_field);
    let x_ticks = calculate_ticks(0.0, bounds.x_max.round(), params.tick_count);
    let y_ticks = calculate_ticks(
        bounds.y_min.round(),
        bounds.y_max.round(),
        params.tick_count,
    );
    let trend =
        calculate_trend_line(&points, ScatterPoint::speed_field, ScatterPoint::heartrate_field);
    let reference_line = if trend.can_show_line {
        calculate_trend_line_points(&trend, &params.reference_viewport.viewport(&bounds))
    } else {
        degenerate_segment()
    };
    let domain = bounds.padded(params.x_offset, params.y_offset);

    debug!(
        points = points.len(),
        slope = trend.slope,
        intercept = trend.intercept,
        can_show_line = trend.can_show_line,
        "built heart rate vs speed chart"
    );

    ScatterChart {
        units: params.units,
        speed_unit: params.units.labels().speed.to_string(),
        points,
        bounds,
        x_domain: domain.x_domain(),
        y_domain: domain.y_domain(),
        x_ticks,
        y_ticks,
        trend,
        reference_line,
    }
}

/// Number of activities that started in one hour of the day.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HourBucket {
    pub hour: u32,
    pub activities: usize,
}

/// Activity counts per start hour, always 24 rows ordered 0..=23.
pub fn start_times(activities: &[Activity]) -> Vec<HourBucket> {
    let mut buckets: Vec<HourBucket> = (0..HOURS_PER_DAY)
        .map(|hour| HourBucket {
            hour,
            activities: 0,
        })
        .collect();
    let mut skipped = 0usize;
    for activity in activities {
        match activity.start_hour() {
            Some(hour) if hour < HOURS_PER_DAY => buckets[hour as usize].activities += 1,
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!(skipped, "activities without a usable start time");
    }
    buckets
}
