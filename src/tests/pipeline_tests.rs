//! # Fetch → Engine → Render Pipeline
//!
//! Source substitution and the end-to-end path the binary takes, without the network.

use crate::config::{Config, Units};
use crate::fallback::SyntheticSource;
use crate::renderer::{ascii_chart, render_svg, TideChart};
use crate::tide_data::{fetch_or_fallback, parse_predictions, TideError, TideSource};
use crate::window::DisplayWindow;
use crate::TideSeries;
use chrono::{Duration, NaiveDate, Utc};

/// Source that always fails, standing in for an unreachable NOAA.
struct UnreachableSource;

impl TideSource for UnreachableSource {
    fn name(&self) -> &str {
        "unreachable"
    }

    fn station(&self) -> (&str, &str) {
        ("9445478", "Union, Hood Canal")
    }

    async fn fetch(&self, _window: &DisplayWindow) -> Result<TideSeries, TideError> {
        Err(TideError::Provider("connection refused".to_string()))
    }
}

/// Source replaying a canned NOAA body.
struct CannedSource(&'static str);

impl TideSource for CannedSource {
    fn name(&self) -> &str {
        "canned"
    }

    fn station(&self) -> (&str, &str) {
        ("9445478", "Union, Hood Canal")
    }

    async fn fetch(&self, _window: &DisplayWindow) -> Result<TideSeries, TideError> {
        Ok(TideSeries {
            station_id: "9445478".to_string(),
            station_name: "Union, Hood Canal".to_string(),
            events: parse_predictions(self.0)?,
            offline: false,
        })
    }
}

const NOAA_DAY: &str = r#"{"predictions":[
    {"t":"2025-07-24 02:31","v":"11.204","type":"H"},
    {"t":"2025-07-24 08:47","v":"4.871","type":"L"},
    {"t":"2025-07-24 13:55","v":"9.690","type":"H"},
    {"t":"2025-07-24 21:10","v":"-1.102","type":"L"}
]}"#;

fn window() -> DisplayWindow {
    DisplayWindow::days(NaiveDate::from_ymd_opt(2025, 7, 24).unwrap(), 1, &Utc)
}

fn synthetic() -> SyntheticSource<Utc> {
    SyntheticSource::new("9445478", "Union, Hood Canal", Utc).with_seed(3)
}

#[tokio::test]
async fn falls_back_to_synthetic_when_primary_fails() {
    let series = fetch_or_fallback(&UnreachableSource, &synthetic(), &window()).await;
    assert!(series.offline);
    assert_eq!(series.events.len(), 4);
}

#[tokio::test]
async fn total_failure_keeps_station_identity() {
    let series = fetch_or_fallback(&UnreachableSource, &UnreachableSource, &window()).await;
    assert!(series.offline);
    assert!(series.events.is_empty());
    assert_eq!(series.station_id, "9445478");
    assert_eq!(series.station_name, "Union, Hood Canal");
}

#[tokio::test]
async fn primary_data_is_not_marked_offline() {
    let series = fetch_or_fallback(&CannedSource(NOAA_DAY), &synthetic(), &window()).await;
    assert!(!series.offline);
    assert_eq!(series.events[3].height, -1.102);
}

#[tokio::test]
async fn bad_payload_falls_back() {
    let series = fetch_or_fallback(&CannedSource(r#"{"predictions":[]}"#), &synthetic(), &window()).await;
    assert!(series.offline);
    assert!(!series.events.is_empty());
}

#[tokio::test]
async fn noaa_day_renders_end_to_end() {
    let config = Config::default();
    let series = fetch_or_fallback(&CannedSource(NOAA_DAY), &synthetic(), &window()).await;
    let chart = TideChart::from_config(&series, &window(), &config).unwrap();

    assert_eq!(chart.curve.len(), 1 + 3 * config.chart.steps_per_segment);
    assert_eq!(chart.scale.min_height, -3.0);
    assert_eq!(chart.scale.max_height, 13.0);

    let now = window().start + Duration::hours(10);
    let svg = render_svg(&chart, &series, &window(), &Utc, now, Units::English);
    assert!(svg.contains("-1.10 ft"));
    assert!(svg.contains("9:10 PM"));

    let text = ascii_chart(&chart, &series, &window(), &Utc, now, (60, 16));
    assert_eq!(text.matches('H').count(), 2);
}

#[test]
fn next_event_and_daily_groups() {
    let series = synthetic().generate(&DisplayWindow::days(
        NaiveDate::from_ymd_opt(2025, 7, 24).unwrap(),
        3,
        &Utc,
    ));
    let noon = window().start + Duration::hours(12);

    let next = series.next_event(noon).unwrap();
    assert_eq!(next.timestamp, window().start + Duration::hours(15));

    let days = series.events_by_day(&Utc);
    assert_eq!(days.len(), 3);
    assert!(days.values().all(|events| events.len() == 4));
}

#[test]
fn empty_series_cannot_be_charted() {
    let series = TideSeries {
        station_id: String::new(),
        station_name: String::new(),
        events: Vec::new(),
        offline: true,
    };
    assert!(TideChart::from_config(&series, &window(), &Config::default()).is_err());
}

#[test]
fn sort_events_orders_by_time() {
    let mut series = synthetic().generate(&window());
    series.events.reverse();
    series.sort_events();
    assert!(series.events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert_eq!(crate::curve::interpolate(&series.events, 10).len(), 31);
}
