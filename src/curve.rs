//! # Tide Curve Engine
//!
//! Turns sparse high/low water events into a dense, smooth curve and computes the
//! scaling needed to project that curve onto a fixed-size drawing surface.
//!
//! ## Interpolation
//! Each segment between consecutive events is filled with a uniform-parameter cubic
//! blend of four control heights (Catmull-Rom style):
//! ```text
//! a0 = p3 - p2 - p0 + p1
//! a1 = p0 - p1 - a0
//! a2 = p2 - p0
//! a3 = p1
//! h(mu) = a0*mu^3 + a1*mu^2 + a2*mu + a3
//! ```
//! `p1`/`p2` are the segment's own heights; `p0`/`p3` are the neighbouring events,
//! clamped to the segment ends at the first and last segment. Time advances linearly
//! with `mu`. The blend ignores the uneven spacing of real tide events; this keeps the
//! chart identical to the dashboard it replaces.
//!
//! Segment start points and the final point are copied from the input events, so the
//! curve always passes exactly through every real event.
//!
//! Everything here is pure: no I/O, no shared state, identical output for identical input.

use crate::TideEvent;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Padding added below the lowest and above the highest event, in height units.
pub const HEIGHT_MARGIN: f64 = 1.0;

/// Upper bound on interpolated points per segment. Larger requests are clamped.
pub const MAX_STEPS_PER_SEGMENT: usize = 1000;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CurveError {
    /// Axis scaling needs at least one event to take extremes from
    #[error("cannot scale an axis without tide events")]
    NoEvents,
}

/// One point on the interpolated tide curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub time: DateTime<Utc>,
    pub height: f64,
}

impl From<&TideEvent> for CurvePoint {
    fn from(event: &TideEvent) -> Self {
        CurvePoint {
            time: event.timestamp,
            height: event.height,
        }
    }
}

/// Bounding box in data space used to map (time, height) onto a drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisScale {
    pub min_height: f64,
    pub max_height: f64,
    pub time_start: DateTime<Utc>,
    pub time_end: DateTime<Utc>,
}

impl AxisScale {
    /// Height span, falling back to 1 when every event has the same height.
    pub fn height_range(&self) -> f64 {
        non_zero(self.max_height - self.min_height)
    }

    /// Time span in milliseconds, falling back to 1 for an empty window.
    pub fn time_range_ms(&self) -> f64 {
        non_zero((self.time_end - self.time_start).num_milliseconds() as f64)
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.time_start <= time && time <= self.time_end
    }
}

/// Size and padding of the drawing surface, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartBounds {
    pub width: f64,
    pub height: f64,
    pub padding_left: f64,
    pub padding_right: f64,
    pub padding_top: f64,
    pub padding_bottom: f64,
}

impl ChartBounds {
    pub fn inner_width(&self) -> f64 {
        self.width - self.padding_left - self.padding_right
    }

    pub fn inner_height(&self) -> f64 {
        self.height - self.padding_top - self.padding_bottom
    }
}

/// A projected point in drawing-surface coordinates (y grows downwards).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

/// Interpolate a smooth curve through sorted tide events.
///
/// `events` must already be sorted ascending by timestamp; that is the caller's job
/// (see [`TideSeries::sort_events`](crate::TideSeries::sort_events)). Fewer than two
/// events is a "not enough data" case and yields an empty curve.
///
/// Output length is `1 + (events.len() - 1) * steps_per_segment`. A step count of 0 is
/// treated as 1, and counts above [`MAX_STEPS_PER_SEGMENT`] are clamped to it.
///
/// # Example
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use hood_canal_tides::{curve::interpolate, TideEvent, TideKind};
///
/// let t0 = Utc.with_ymd_and_hms(2025, 7, 24, 0, 0, 0).unwrap();
/// let events = [
///     TideEvent::new(TideKind::Low, t0, 1.0),
///     TideEvent::new(TideKind::High, t0 + Duration::hours(6), 11.0),
/// ];
/// let curve = interpolate(&events, 20);
/// assert_eq!(curve.len(), 21);
/// assert_eq!(curve[20].height, 11.0);
/// ```
pub fn interpolate(events: &[TideEvent], steps_per_segment: usize) -> Vec<CurvePoint> {
    if events.len() < 2 {
        return Vec::new();
    }
    debug_assert!(
        events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp),
        "tide events must be sorted by timestamp"
    );

    let steps = steps_per_segment.clamp(1, MAX_STEPS_PER_SEGMENT);
    let mut points = Vec::with_capacity(1 + (events.len() - 1) * steps);

    for (i, pair) in events.windows(2).enumerate() {
        let (a, b) = (&pair[0], &pair[1]);

        // Clamp control points at the ends: no extrapolation past the data
        let p0 = if i > 0 { events[i - 1].height } else { a.height };
        let p1 = a.height;
        let p2 = b.height;
        let p3 = events.get(i + 2).map_or(b.height, |e| e.height);

        points.push(CurvePoint::from(a));

        let span_ms = (b.timestamp - a.timestamp).num_milliseconds() as f64;
        for step in 1..steps {
            let mu = step as f64 / steps as f64;
            let offset = Duration::milliseconds((mu * span_ms).round() as i64);
            points.push(CurvePoint {
                time: a.timestamp + offset,
                height: cubic_blend(p0, p1, p2, p3, mu),
            });
        }
    }

    if let Some(last) = events.last() {
        points.push(CurvePoint::from(last));
    }

    points
}

/// Compute the padded axis scale for a set of events and a display window.
///
/// Heights are padded to whole units: `floor(min) - 1` and `ceil(max) + 1`. The time
/// axis is the caller's display window, independent of the event timestamps; events
/// outside it are tolerated and not filtered.
pub fn compute_axis_scale(
    events: &[TideEvent],
    time_start: DateTime<Utc>,
    time_end: DateTime<Utc>,
) -> Result<AxisScale, CurveError> {
    if events.is_empty() {
        return Err(CurveError::NoEvents);
    }

    let (min, max) = events
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), event| {
            (min.min(event.height), max.max(event.height))
        });

    Ok(AxisScale {
        min_height: min.floor() - HEIGHT_MARGIN,
        max_height: max.ceil() + HEIGHT_MARGIN,
        time_start,
        time_end,
    })
}

/// Project a curve point into drawing-surface coordinates.
///
/// A degenerate height range (or an empty time window) divides by 1 instead of 0, so
/// the result is always finite: a flat line instead of NaN.
pub fn project_to_pixels(point: &CurvePoint, scale: &AxisScale, bounds: &ChartBounds) -> PixelPoint {
    let elapsed_ms = (point.time - scale.time_start).num_milliseconds() as f64;
    let inner_height = bounds.inner_height();

    let x = bounds.padding_left + (elapsed_ms / scale.time_range_ms()) * bounds.inner_width();
    let y = bounds.padding_top + inner_height
        - ((point.height - scale.min_height) / scale.height_range()) * inner_height;

    PixelPoint { x, y }
}

fn cubic_blend(p0: f64, p1: f64, p2: f64, p3: f64, mu: f64) -> f64 {
    let mu2 = mu * mu;
    let a0 = p3 - p2 - p0 + p1;
    let a1 = p0 - p1 - a0;
    let a2 = p2 - p0;
    let a3 = p1;
    a0 * mu * mu2 + a1 * mu2 + a2 * mu + a3
}

fn non_zero(range: f64) -> f64 {
    if range == 0.0 {
        1.0
    } else {
        range
    }
}
