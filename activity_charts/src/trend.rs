//! Least-squares trend lines and their clipped, renderable segments.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bounds::{valid_pair, Viewport};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
    /// When false, `slope` and `intercept` are zero and must not be drawn.
    pub can_show_line: bool,
}

impl TrendLine {
    pub fn y_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn x_at(&self, y: f64) -> Option<f64> {
        if self.slope == 0.0 {
            None
        } else {
            Some((y - self.intercept) / self.slope)
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Start and end of a trend line inside a viewport.
pub type Segment = [Point; 2];

pub fn degenerate_segment() -> Segment {
    [Point::default(), Point::default()]
}

/// Ordinary least-squares fit of `y` against `x`.
///
/// Only records where both fields are finite take part. Fewer than two such
/// records, zero variance in `x`, or a non-finite result yield a line with
/// `can_show_line == false`.
pub fn calculate_trend_line<T, X, Y>(data: &[T], x: X, y: Y) -> TrendLine
where
    X: Fn(&T) -> Option<f64>,
    Y: Fn(&T) -> Option<f64>,
{
    let points: Vec<(f64, f64)> = data
        .iter()
        .filter_map(|item| valid_pair(item, &x, &y))
        .collect();
    if points.len() < 2 {
        debug!(valid = points.len(), "too few points for a trend line");
        return TrendLine::default();
    }

    let n = points.len() as f64;
    let x_mean = points.iter().map(|p| p.0).sum::<f64>() / n;
    let y_mean = points.iter().map(|p| p.1).sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for &(px, py) in &points {
        let dx = px - x_mean;
        sxy += dx * (py - y_mean);
        sxx += dx * dx;
    }

    if sxx == 0.0 {
        debug!(x = x_mean, "all x values equal, trend line is vertical");
        return TrendLine::default();
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    if !slope.is_finite() || !intercept.is_finite() {
        debug!(slope, intercept, "trend fit overflowed");
        return TrendLine::default();
    }

    TrendLine {
        slope,
        intercept,
        can_show_line: true,
    }
}

/// Clip the infinite trend line to `viewport`.
///
/// The line is evaluated at both horizontal edges; an endpoint that falls
/// above or below the viewport slides along the line to the crossed edge.
/// Must only be called for lines with `can_show_line`; other lines, lines
/// that never enter the viewport, and non-finite or inverted viewports yield
/// the `{0,0}-{0,0}` segment.
pub fn calculate_trend_line_points(trend: &TrendLine, viewport: &Viewport) -> Segment {
    if !trend.can_show_line {
        return degenerate_segment();
    }
    if !is_usable(viewport) {
        debug!(?viewport, "viewport is inverted or not finite");
        return degenerate_segment();
    }
    let start = clip_endpoint(trend, viewport, viewport.x_min);
    let end = clip_endpoint(trend, viewport, viewport.x_max);
    match (start, end) {
        (Some(start), Some(end)) => [start, end],
        _ => {
            debug!(
                slope = trend.slope,
                intercept = trend.intercept,
                "trend line misses viewport"
            );
            degenerate_segment()
        }
    }
}

fn is_usable(viewport: &Viewport) -> bool {
    let finite = viewport.x_min.is_finite()
        && viewport.x_max.is_finite()
        && viewport.y_min.is_finite()
        && viewport.y_max.is_finite();
    finite && viewport.x_min <= viewport.x_max && viewport.y_min <= viewport.y_max
}

fn clip_endpoint(trend: &TrendLine, viewport: &Viewport, edge_x: f64) -> Option<Point> {
    let y = trend.y_at(edge_x);
    if y >= viewport.y_min && y <= viewport.y_max {
        return Some(Point::new(edge_x, y));
    }
    let edge_y = if y < viewport.y_min {
        viewport.y_min
    } else {
        viewport.y_max
    };
    let x = trend.x_at(edge_y)?;
    let tolerance = (viewport.x_max - viewport.x_min) * 1e-12;
    if !(x >= viewport.x_min - tolerance && x <= viewport.x_max + tolerance) {
        return None;
    }
    Some(Point::new(x.max(viewport.x_min).min(viewport.x_max), edge_y))
}
