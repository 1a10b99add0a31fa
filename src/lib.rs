//! # Hood Canal Tides Core Library
//!
//! Tide data structures and the curve engine behind the Hood Canal information hub's
//! tide chart. NOAA publishes only the extremes of the tide (a handful of high and low
//! water events per day); this crate turns those sparse events into a smooth curve and
//! works out the scaling needed to draw it on a fixed-size surface.
//!
//! ## Data Flow
//! 1. **Online**: fetch high/low predictions from NOAA CO-OPS → [`TideSeries`]
//! 2. **Offline**: substitute synthetic events from [`fallback::SyntheticSource`] → mark offline
//! 3. **Engine**: [`curve::interpolate`] → [`curve::compute_axis_scale`] → [`curve::project_to_pixels`]
//! 4. **Render**: SVG path, ASCII chart or an `embedded-graphics` draw target
//!
//! Every fetch cycle recomputes everything from scratch; nothing is persisted.
//!
//! ## Core Types
//! - [`TideKind`]: high or low water
//! - [`TideEvent`]: one predicted extremum
//! - [`TideSeries`]: the events of one fetch cycle plus station and offline metadata

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub mod config;
pub mod curve;
pub mod fallback;
pub mod lunar;
pub mod renderer;
pub mod tide_data;
pub mod window;

#[cfg(test)]
mod tests;

/// Whether an extremum is high or low water.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TideKind {
    High,
    Low,
}

impl fmt::Display for TideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TideKind::High => f.write_str("High"),
            TideKind::Low => f.write_str("Low"),
        }
    }
}

impl FromStr for TideKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "H" | "HH" | "High" | "high" => Ok(TideKind::High),
            "L" | "LL" | "Low" | "low" => Ok(TideKind::Low),
            other => Err(format!("unknown tide type {other:?}")),
        }
    }
}

/// A predicted (or observed) high or low water event.
///
/// Height units are a system-wide setting (see [`config::Units`]), never per record.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use hood_canal_tides::{TideEvent, TideKind};
///
/// let high = TideEvent::new(TideKind::High, Utc.with_ymd_and_hms(2025, 7, 24, 9, 12, 0).unwrap(), 11.4);
/// assert_eq!(high.kind.to_string(), "High");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TideEvent {
    pub kind: TideKind,
    pub timestamp: DateTime<Utc>,
    pub height: f64,
}

impl TideEvent {
    pub fn new(kind: TideKind, timestamp: DateTime<Utc>, height: f64) -> Self {
        Self {
            kind,
            timestamp,
            height,
        }
    }
}

/// All tide events produced by one fetch cycle.
///
/// # Offline Behavior
/// When `offline = true` the events come from the synthetic provider rather than
/// NOAA. Renderers show a `MOCK` badge so nobody plans a beach walk around them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TideSeries {
    pub station_id: String,
    pub station_name: String,
    /// Events sorted ascending by timestamp
    pub events: Vec<TideEvent>,
    /// True if the events are synthetic rather than NOAA predictions
    pub offline: bool,
}

impl TideSeries {
    /// Sort events ascending by timestamp.
    ///
    /// The curve engine requires sorted input and never sorts on its own.
    pub fn sort_events(&mut self) {
        self.events.sort_by_key(|event| event.timestamp);
    }

    /// First event strictly after `now`.
    pub fn next_event(&self, now: DateTime<Utc>) -> Option<&TideEvent> {
        self.events.iter().find(|event| event.timestamp > now)
    }

    /// Group events by calendar day in the display time zone, days ascending.
    pub fn events_by_day<Tz: TimeZone>(&self, tz: &Tz) -> BTreeMap<NaiveDate, Vec<&TideEvent>> {
        let mut days: BTreeMap<NaiveDate, Vec<&TideEvent>> = BTreeMap::new();
        for event in &self.events {
            let day = event.timestamp.with_timezone(tz).date_naive();
            days.entry(day).or_default().push(event);
        }
        days
    }
}
