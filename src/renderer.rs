//! # Tide Chart Rendering
//!
//! Consumers of the curve engine. A [`TideChart`] bundles the interpolated curve, its
//! axis scale and the drawing bounds; the functions below turn it into:
//! - an SVG path / complete SVG document for the web dashboard
//! - an ASCII chart for the terminal (development mode)
//! - pixels on any `embedded-graphics` monochrome draw target

use crate::config::{Config, Units};
use crate::curve::{self, AxisScale, ChartBounds, CurveError, CurvePoint, PixelPoint};
use crate::window::DisplayWindow;
use crate::{TideKind, TideSeries};
use chrono::{DateTime, TimeZone, Timelike, Utc};
use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle},
};
use std::fmt::Display;

const HIGH_COLOR: &str = "#0891b2";
const LOW_COLOR: &str = "#3b82f6";
const GRID_COLOR: &str = "#e5e7eb";
const MIDNIGHT_COLOR: &str = "#9ca3af";
const NOW_COLOR: &str = "#e11d48";

/// Hours between vertical grid lines.
const TICK_HOURS: u32 = 6;

/// Engine output for one series, ready to draw.
#[derive(Clone, Debug)]
pub struct TideChart {
    pub curve: Vec<CurvePoint>,
    pub scale: AxisScale,
    pub bounds: ChartBounds,
}

impl TideChart {
    /// Run the curve engine over a series (events must be sorted).
    pub fn build(
        series: &TideSeries,
        window: &DisplayWindow,
        bounds: ChartBounds,
        steps_per_segment: usize,
    ) -> Result<Self, CurveError> {
        let scale = curve::compute_axis_scale(&series.events, window.start, window.end)?;
        Ok(Self {
            curve: curve::interpolate(&series.events, steps_per_segment),
            scale,
            bounds,
        })
    }

    /// [`TideChart::build`] using the configured geometry and curve density.
    pub fn from_config(
        series: &TideSeries,
        window: &DisplayWindow,
        config: &Config,
    ) -> Result<Self, CurveError> {
        Self::build(
            series,
            window,
            config.chart.bounds(),
            config.chart.steps_per_segment,
        )
    }

    pub fn project(&self, point: &CurvePoint) -> PixelPoint {
        curve::project_to_pixels(point, &self.scale, &self.bounds)
    }

    fn project_time(&self, time: DateTime<Utc>) -> f64 {
        self.project(&CurvePoint {
            time,
            height: self.scale.min_height,
        })
        .x
    }

    /// Whole height units spanned by the axis (at least 1).
    fn height_steps(&self) -> u32 {
        self.scale.height_range().round().max(1.0) as u32
    }
}

/// Format a tide height with two decimals and the unit suffix, e.g. `"11.87 ft"`.
pub fn format_height(height: f64, units: Units) -> String {
    format!("{:.2} {}", height, units.suffix())
}

fn format_time<Tz: TimeZone>(time: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    time.with_timezone(tz).format("%-I:%M %p").to_string()
}

/// Build an SVG path description (`M x y L x y ...`) for the curve.
pub fn svg_path(points: &[CurvePoint], scale: &AxisScale, bounds: &ChartBounds) -> String {
    points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let p = curve::project_to_pixels(point, scale, bounds);
            let command = if index == 0 { 'M' } else { 'L' };
            format!("{} {:.2} {:.2}", command, p.x, p.y)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a complete SVG tide chart.
///
/// Labels use `tz`; `now` draws a marker line when it falls inside the window.
pub fn render_svg<Tz: TimeZone>(
    chart: &TideChart,
    series: &TideSeries,
    window: &DisplayWindow,
    tz: &Tz,
    now: DateTime<Utc>,
    units: Units,
) -> String
where
    Tz::Offset: Display,
{
    let b = &chart.bounds;
    let (left, right) = (b.padding_left, b.width - b.padding_right);
    let (top, bottom) = (b.padding_top, b.height - b.padding_bottom);
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = b.width,
        h = b.height
    );
    svg.push('\n');

    // Horizontal grid, one line per height unit
    let steps = chart.height_steps();
    let row_height = b.inner_height() / f64::from(steps);
    for i in 0..=steps {
        let y = top + row_height * f64::from(i);
        let label = chart.scale.max_height - f64::from(i);
        svg.push_str(&format!(
            r#"<line x1="{left:.2}" y1="{y:.2}" x2="{right:.2}" y2="{y:.2}" stroke="{GRID_COLOR}" stroke-width="1"/>"#
        ));
        svg.push_str(&format!(
            r##"<text x="{:.2}" y="{y:.2}" text-anchor="end" dominant-baseline="middle" font-size="12" fill="#6b7280">{label:.1}</text>"##,
            left - 15.0
        ));
        svg.push('\n');
    }

    // Vertical grid every six hours, solid at midnight
    for tick in window.ticks(TICK_HOURS, tz) {
        let x = chart.project_time(tick);
        let midnight = tick.with_timezone(tz).hour() == 0;
        let (color, width, dash) = if midnight {
            (MIDNIGHT_COLOR, "1.5", "")
        } else {
            (GRID_COLOR, "1", r#" stroke-dasharray="5,5""#)
        };
        svg.push_str(&format!(
            r#"<line x1="{x:.2}" y1="{top:.2}" x2="{x:.2}" y2="{bottom:.2}" stroke="{color}" stroke-width="{width}"{dash}/>"#
        ));
        svg.push('\n');
    }

    if window.contains(now) {
        let x = chart.project_time(now);
        svg.push_str(&format!(
            r#"<line x1="{x:.2}" y1="{top:.2}" x2="{x:.2}" y2="{bottom:.2}" stroke="{NOW_COLOR}" stroke-width="2.5" stroke-dasharray="4,2"/>"#
        ));
        svg.push('\n');
    }

    svg.push_str(&format!(
        r#"<path d="{}" fill="none" stroke="{LOW_COLOR}" stroke-width="4" stroke-linejoin="round"/>"#,
        svg_path(&chart.curve, &chart.scale, &chart.bounds)
    ));
    svg.push('\n');

    for event in &series.events {
        let p = chart.project(&CurvePoint::from(event));
        let (color, height_y, time_y) = match event.kind {
            TideKind::High => (HIGH_COLOR, p.y - 30.0, p.y - 15.0),
            TideKind::Low => (LOW_COLOR, p.y + 28.0, p.y + 43.0),
        };
        svg.push_str(&format!(
            r#"<circle cx="{:.2}" cy="{:.2}" r="8" fill="{color}" stroke="white" stroke-width="3"/>"#,
            p.x, p.y
        ));
        svg.push_str(&format!(
            r##"<text x="{:.2}" y="{height_y:.2}" text-anchor="middle" font-size="12" font-weight="bold" fill="#1e3a8a">{}</text>"##,
            p.x,
            format_height(event.height, units)
        ));
        svg.push_str(&format!(
            r##"<text x="{:.2}" y="{time_y:.2}" text-anchor="middle" font-size="12" fill="#4b5563">{}</text>"##,
            p.x,
            format_time(event.timestamp, tz)
        ));
        svg.push('\n');
    }

    if series.offline {
        svg.push_str(&format!(
            r##"<text x="{:.2}" y="14" text-anchor="end" font-size="12" font-weight="bold" fill="#dc2626">MOCK</text>"##,
            b.width - 4.0
        ));
        svg.push('\n');
    }

    svg.push_str("</svg>\n");
    svg
}

/// Render the chart as ASCII art, `columns` wide and `rows` tall plus axis labels.
pub fn ascii_chart<Tz: TimeZone>(
    chart: &TideChart,
    series: &TideSeries,
    window: &DisplayWindow,
    tz: &Tz,
    now: DateTime<Utc>,
    (columns, rows): (usize, usize),
) -> String
where
    Tz::Offset: Display,
{
    const Y_AXIS_WIDTH: usize = 5;
    let columns = columns.max(2);
    let rows = rows.max(2);

    // Character cells: one pixel per cell, no padding
    let cells = ChartBounds {
        width: (columns - 1) as f64,
        height: (rows - 1) as f64,
        padding_left: 0.0,
        padding_right: 0.0,
        padding_top: 0.0,
        padding_bottom: 0.0,
    };
    let cell = |point: &CurvePoint| -> Option<(usize, usize)> {
        let p = curve::project_to_pixels(point, &chart.scale, &cells);
        let (x, y) = (p.x.round(), p.y.round());
        let inside = (0.0..columns as f64).contains(&x) && (0.0..rows as f64).contains(&y);
        inside.then_some((x as usize, y as usize))
    };

    let mut grid = vec![vec![' '; columns + Y_AXIS_WIDTH]; rows];

    // Y-axis labels at whole height units, thinned to roughly one per row
    let steps = chart.height_steps();
    let stride = (steps / rows as u32).max(1);
    for i in (0..=steps).step_by(stride as usize) {
        let height = chart.scale.max_height - f64::from(i);
        let mark = CurvePoint {
            time: chart.scale.time_start,
            height,
        };
        if let Some((_, row)) = cell(&mark) {
            let label = format!("{:>4.0}", height);
            for (i, ch) in label.chars().take(Y_AXIS_WIDTH - 1).enumerate() {
                grid[row][i] = ch;
            }
        }
    }
    for row in grid.iter_mut() {
        row[Y_AXIS_WIDTH - 1] = '│';
    }

    for point in &chart.curve {
        if let Some((x, y)) = cell(point) {
            grid[y][x + Y_AXIS_WIDTH] = '•';
        }
    }

    for event in &series.events {
        if let Some((x, y)) = cell(&CurvePoint::from(event)) {
            grid[y][x + Y_AXIS_WIDTH] = match event.kind {
                TideKind::High => 'H',
                TideKind::Low => 'L',
            };
        }
    }

    // Mark "now" on the curve point closest in time
    if window.contains(now) {
        let nearest = chart
            .curve
            .iter()
            .min_by_key(|point| (point.time - now).num_milliseconds().abs());
        if let Some((x, y)) = nearest.and_then(|point| cell(point)) {
            grid[y][x + Y_AXIS_WIDTH] = 'X';
        }
    }

    let mut out = String::new();
    if series.offline {
        out.push_str("⚠ MOCK DATA\n\n");
    }
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    // Day labels under each local midnight
    let mut labels = vec![' '; columns + Y_AXIS_WIDTH];
    let mut day_starts = vec![window.start];
    day_starts.extend(window.day_starts(tz));
    for start in day_starts {
        let probe = CurvePoint {
            time: start,
            height: chart.scale.min_height,
        };
        if let Some((x, _)) = cell(&probe) {
            let label = start.with_timezone(tz).format("%a %-m/%-d").to_string();
            for (i, ch) in label.chars().enumerate() {
                if let Some(slot) = labels.get_mut(x + Y_AXIS_WIDTH + i) {
                    *slot = ch;
                }
            }
        }
    }
    out.push_str(labels.into_iter().collect::<String>().trim_end());
    out.push('\n');
    out
}

/// Render the chart to stdout in development mode.
pub fn draw_ascii<Tz: TimeZone>(
    chart: &TideChart,
    series: &TideSeries,
    window: &DisplayWindow,
    tz: &Tz,
    now: DateTime<Utc>,
) where
    Tz::Offset: Display,
{
    print!("{}", ascii_chart(chart, series, window, tz, now, (96, 20)));
}

/// Draw the chart onto a monochrome `embedded-graphics` target sized like
/// `chart.bounds`.
pub fn draw_chart<D>(chart: &TideChart, series: &TideSeries, display: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let axis = PrimitiveStyle::with_stroke(BinaryColor::On, 1);
    let stroke = PrimitiveStyle::with_stroke(BinaryColor::On, 2);
    let b = &chart.bounds;
    let to_point = |p: PixelPoint| Point::new(p.x.round() as i32, p.y.round() as i32);

    let origin = Point::new(b.padding_left as i32, (b.height - b.padding_bottom) as i32);
    Line::new(origin, Point::new(origin.x, b.padding_top as i32))
        .into_styled(axis)
        .draw(display)?;
    Line::new(origin, Point::new((b.width - b.padding_right) as i32, origin.y))
        .into_styled(axis)
        .draw(display)?;

    let mut previous: Option<Point> = None;
    for point in &chart.curve {
        let current = to_point(chart.project(point));
        if let Some(prev) = previous {
            if prev != current {
                Line::new(prev, current).into_styled(stroke).draw(display)?;
            }
        }
        previous = Some(current);
    }

    for event in &series.events {
        let center = to_point(chart.project(&CurvePoint::from(event)));
        let style = match event.kind {
            TideKind::High => PrimitiveStyle::with_fill(BinaryColor::On),
            TideKind::Low => PrimitiveStyle::with_stroke(BinaryColor::On, 1),
        };
        Circle::with_center(center, 5).into_styled(style).draw(display)?;
    }

    Ok(())
}
