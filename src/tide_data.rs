//! # NOAA Tide Prediction Fetching
//!
//! Fetches high/low water predictions from the NOAA CO-OPS data API and turns them into
//! sorted [`TideEvent`]s for the curve engine.
//!
//! ## Data Source
//! - **URL**: `https://api.tidesandcurrents.noaa.gov/api/prod/datagetter`
//! - **Product**: `predictions` with `interval=hilo` (extremes only, ~4 per day)
//! - **Station**: 9445478 (Union, Hood Canal) - configurable in `tide-config.toml`
//! - **Time zone**: requested as GMT so timestamps parse to instants without guessing DST
//!
//! A typical response:
//! ```json
//! {"predictions":[{"t":"2025-07-24 03:12","v":"1.234","type":"L"}, ...]}
//! ```
//! NOAA reports problems with HTTP 200 and an `{"error":{"message":...}}` body, so the
//! payload is checked for that before predictions are read.
//!
//! ## Error Handling
//! Every failure surfaces as [`TideError`]. Callers are expected to substitute synthetic
//! data (see [`fetch_or_fallback`]); the curve engine only ever sees usable events.

use crate::config::StationConfig;
use crate::window::DisplayWindow;
use crate::{TideEvent, TideKind, TideSeries};
use chrono::{Duration, NaiveDateTime, TimeZone, Utc};
use log::{debug, info, warn};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration as StdDuration;
use thiserror::Error;

pub const NOAA_API_URL: &str = "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter";

/// Name NOAA asks API consumers to identify themselves with.
const APPLICATION: &str = "HoodCanalInfo";

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(20);

/// Errors that can occur while fetching and parsing tide predictions.
#[derive(Error, Debug)]
pub enum TideError {
    /// HTTP request failed (network, server, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Body was not the JSON shape NOAA documents
    #[error("malformed NOAA payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// NOAA answered with an error message instead of predictions
    #[error("NOAA error: {0}")]
    Provider(String),

    #[error("no tide prediction data available")]
    NoPredictions,

    /// A prediction row had an unparsable time, height or type
    #[error("bad prediction row {row}: {reason}")]
    Row { row: usize, reason: String },
}

/// Anything that can produce the tide events for a display window.
///
/// NOAA and the synthetic generator both implement this, so the caller can swap one
/// for the other without the curve engine noticing.
pub trait TideSource {
    fn name(&self) -> &str;

    /// Station the events are for, as `(id, name)`.
    fn station(&self) -> (&str, &str);

    fn fetch(
        &self,
        window: &DisplayWindow,
    ) -> impl Future<Output = Result<TideSeries, TideError>> + Send;
}

/// NOAA CO-OPS prediction source for one station.
#[derive(Clone, Debug)]
pub struct NoaaSource {
    client: reqwest::Client,
    base_url: String,
    station: StationConfig,
}

impl NoaaSource {
    pub fn new(station: StationConfig) -> Result<Self, TideError> {
        Self::with_base_url(station, NOAA_API_URL)
    }

    pub fn with_base_url(station: StationConfig, base_url: &str) -> Result<Self, TideError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            station,
        })
    }

    /// Query parameters for a window. `end_date` is the day after the window's last
    /// day so the final evening's tides are included.
    pub fn query(&self, window: &DisplayWindow) -> Vec<(&'static str, String)> {
        let begin = window.start.date_naive();
        let end = window.end.date_naive() + Duration::days(1);
        vec![
            ("product", "predictions".to_string()),
            ("application", APPLICATION.to_string()),
            ("begin_date", begin.format("%Y%m%d").to_string()),
            ("end_date", end.format("%Y%m%d").to_string()),
            ("datum", self.station.datum.clone()),
            ("station", self.station.id.clone()),
            ("time_zone", "gmt".to_string()),
            ("units", self.station.units.as_query().to_string()),
            ("interval", "hilo".to_string()),
            ("format", "json".to_string()),
        ]
    }
}

impl TideSource for NoaaSource {
    fn name(&self) -> &str {
        "NOAA CO-OPS"
    }

    fn station(&self) -> (&str, &str) {
        (&self.station.id, &self.station.name)
    }

    async fn fetch(&self, window: &DisplayWindow) -> Result<TideSeries, TideError> {
        info!(
            "Fetching tide predictions for station {} ({})",
            self.station.id, self.station.name
        );

        let body = self
            .client
            .get(&self.base_url)
            .query(&self.query(window))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let events = parse_predictions(&body)?;
        debug!("NOAA returned {} tide events", events.len());

        Ok(TideSeries {
            station_id: self.station.id.clone(),
            station_name: self.station.name.clone(),
            events,
            offline: false,
        })
    }
}

#[derive(Deserialize)]
struct NoaaResponse {
    #[serde(default)]
    predictions: Option<Vec<NoaaPrediction>>,
    #[serde(default)]
    error: Option<NoaaErrorBody>,
}

#[derive(Deserialize)]
struct NoaaPrediction {
    t: String,
    v: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct NoaaErrorBody {
    message: String,
}

/// Parse a NOAA `hilo` predictions body (GMT timestamps) into sorted events.
pub fn parse_predictions(body: &str) -> Result<Vec<TideEvent>, TideError> {
    let response: NoaaResponse = serde_json::from_str(body)?;

    if let Some(error) = response.error {
        return Err(TideError::Provider(error.message.trim().to_string()));
    }

    let predictions = response.predictions.unwrap_or_default();
    if predictions.is_empty() {
        return Err(TideError::NoPredictions);
    }

    let mut events = predictions
        .iter()
        .enumerate()
        .map(|(row, prediction)| parse_row(row, prediction))
        .collect::<Result<Vec<_>, _>>()?;

    events.sort_by_key(|event| event.timestamp);
    Ok(events)
}

fn parse_row(row: usize, prediction: &NoaaPrediction) -> Result<TideEvent, TideError> {
    let bad = |reason: String| TideError::Row { row, reason };

    let naive = NaiveDateTime::parse_from_str(prediction.t.trim(), "%Y-%m-%d %H:%M")
        .map_err(|e| bad(format!("time {:?}: {e}", prediction.t)))?;

    // Heights may carry a unit suffix in hand-edited payloads ("3.21 ft")
    let height: f64 = prediction
        .v
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_alphabetic() || c.is_whitespace())
        .parse()
        .map_err(|e| bad(format!("height {:?}: {e}", prediction.v)))?;

    let kind: TideKind = prediction.kind.parse().map_err(bad)?;

    Ok(TideEvent::new(kind, Utc.from_utc_datetime(&naive), height))
}

/// Fetch from `primary`, substituting `fallback` data on any failure.
///
/// The fallback result is always marked offline so renderers can flag it.
pub async fn fetch_or_fallback<P, F>(primary: &P, fallback: &F, window: &DisplayWindow) -> TideSeries
where
    P: TideSource,
    F: TideSource,
{
    match primary.fetch(window).await {
        Ok(series) => series,
        Err(error) => {
            warn!("{} fetch failed: {}", primary.name(), error);
            warn!("Falling back to {}", fallback.name());
            match fallback.fetch(window).await {
                Ok(mut series) => {
                    series.offline = true;
                    series
                }
                Err(error) => {
                    warn!("{} failed as well: {}", fallback.name(), error);
                    let (id, name) = primary.station();
                    TideSeries {
                        station_id: id.to_string(),
                        station_name: name.to_string(),
                        events: Vec::new(),
                        offline: true,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = r#"{"predictions":[
        {"t":"2025-07-24 09:41","v":"11.873","type":"H"},
        {"t":"2025-07-24 03:12","v":"1.234","type":"L"},
        {"t":"2025-07-24 16:02","v":"-0.412","type":"L"}
    ]}"#;

    #[test]
    fn test_parse_sorts_and_converts() {
        let events = parse_predictions(SAMPLE).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].kind, TideKind::Low);
        assert_eq!(events[0].height, 1.234);
        assert_eq!(
            events[0].timestamp,
            Utc.with_ymd_and_hms(2025, 7, 24, 3, 12, 0).unwrap()
        );
        assert_eq!(events[1].kind, TideKind::High);
        assert_eq!(events[2].height, -0.412);
    }

    #[test]
    fn test_provider_error_message() {
        let body = r#"{"error": {"message":"No Predictions data was found. Please make sure the Datum input is valid."}}"#;
        match parse_predictions(body) {
            Err(TideError::Provider(message)) => assert!(message.starts_with("No Predictions")),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_predictions() {
        assert!(matches!(
            parse_predictions(r#"{"predictions":[]}"#),
            Err(TideError::NoPredictions)
        ));
        assert!(matches!(parse_predictions("{}"), Err(TideError::NoPredictions)));
    }

    #[test]
    fn test_bad_rows_are_reported() {
        let body = r#"{"predictions":[{"t":"2025-07-24 03:12","v":"1.2","type":"X"}]}"#;
        assert!(matches!(parse_predictions(body), Err(TideError::Row { row: 0, .. })));

        let body = r#"{"predictions":[{"t":"yesterday","v":"1.2","type":"L"}]}"#;
        assert!(matches!(parse_predictions(body), Err(TideError::Row { .. })));
    }

    #[test]
    fn test_height_unit_suffix() {
        let body = r#"{"predictions":[{"t":"2025-07-24 03:12","v":"3.21 ft","type":"H"}]}"#;
        assert_eq!(parse_predictions(body).unwrap()[0].height, 3.21);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(parse_predictions("<html>"), Err(TideError::Payload(_))));
    }

    #[test]
    fn test_query_covers_window_plus_one_day() {
        let source = NoaaSource::new(StationConfig::default()).unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 7, 24).unwrap();
        let window = DisplayWindow::days(day, 3, &Utc);
        let query = source.query(&window);
        let get = |key: &str| {
            query
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };
        assert_eq!(get("begin_date"), "20250724");
        assert_eq!(get("end_date"), "20250727");
        assert_eq!(get("station"), "9445478");
        assert_eq!(get("interval"), "hilo");
        assert_eq!(get("units"), "english");
    }
}
