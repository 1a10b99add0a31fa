//! # Configuration Management
//!
//! Loads `tide-config.toml`: the NOAA station to chart, chart geometry and the
//! refresh interval. A missing or malformed file never stops the hub; it falls back
//! to the Union, Hood Canal defaults.

use crate::curve::{ChartBounds, MAX_STEPS_PER_SEGMENT};
use crate::window::MAX_DAYS;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_PATH: &str = "tide-config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("config serialize: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration loaded from tide-config.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub station: StationConfig,
    pub chart: ChartConfig,
    pub refresh: RefreshConfig,
}

/// NOAA CO-OPS station configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StationConfig {
    /// NOAA station ID (e.g., "9445478" for Union, Hood Canal)
    pub id: String,
    pub name: String,
    /// Tidal datum heights are reported against
    pub datum: String,
    pub units: Units,
}

/// Unit system for every height in the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    English,
    Metric,
}

impl Units {
    /// Value of NOAA's `units` query parameter
    pub fn as_query(self) -> &'static str {
        match self {
            Units::English => "english",
            Units::Metric => "metric",
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Units::English => "ft",
            Units::Metric => "m",
        }
    }
}

/// Chart geometry and curve density
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub padding_top: u32,
    pub padding_right: u32,
    pub padding_bottom: u32,
    pub padding_left: u32,
    /// Interpolated points per pair of tide events
    pub steps_per_segment: usize,
    /// Number of local days shown, starting today
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_minutes: u64,
}

impl Default for StationConfig {
    fn default() -> Self {
        StationConfig {
            id: "9445478".to_string(),
            name: "Union, Hood Canal".to_string(),
            datum: "MLLW".to_string(),
            units: Units::English,
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            width: 800,
            height: 200,
            padding_top: 20,
            padding_right: 15,
            padding_bottom: 40,
            padding_left: 35,
            steps_per_segment: 40,
            days: 3,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            interval_minutes: 60,
        }
    }
}

impl ChartConfig {
    /// Pull `days` and `steps_per_segment` into the range the chart supports.
    pub fn clamp_to_limits(&mut self) {
        let days = self.days.clamp(1, MAX_DAYS);
        if days != self.days {
            warn!("chart.days = {} out of range, using {}", self.days, days);
            self.days = days;
        }
        let steps = self.steps_per_segment.clamp(1, MAX_STEPS_PER_SEGMENT);
        if steps != self.steps_per_segment {
            warn!(
                "chart.steps_per_segment = {} out of range, using {}",
                self.steps_per_segment, steps
            );
            self.steps_per_segment = steps;
        }
    }

    pub fn bounds(&self) -> ChartBounds {
        ChartBounds {
            width: f64::from(self.width),
            height: f64::from(self.height),
            padding_left: f64::from(self.padding_left),
            padding_right: f64::from(self.padding_right),
            padding_top: f64::from(self.padding_top),
            padding_bottom: f64::from(self.padding_bottom),
        }
    }
}

impl Config {
    /// Load configuration from tide-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(DEFAULT_PATH)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(mut config) => {
                    config.chart.clamp_to_limits();
                    info!("Loaded configuration for station: {}", config.station.name);
                    config
                }
                Err(e) => {
                    warn!("Invalid config file {}: {}", path.display(), e);
                    warn!("Using default configuration (Union, Hood Canal)");
                    Self::default()
                }
            },
            Err(_) => {
                info!(
                    "No config file at {}, using default configuration (Union, Hood Canal)",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Apply `NOAA_STATION_ID` / `NOAA_STATION_NAME` overrides.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(
            std::env::var("NOAA_STATION_ID").ok(),
            std::env::var("NOAA_STATION_NAME").ok(),
        );
        self
    }

    fn apply_overrides(&mut self, id: Option<String>, name: Option<String>) {
        if let Some(id) = id.filter(|v| !v.trim().is_empty()) {
            self.station.id = id;
        }
        if let Some(name) = name.filter(|v| !v.trim().is_empty()) {
            self.station.name = name;
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.station.id, "9445478");
        assert_eq!(config.station.name, "Union, Hood Canal");
        assert_eq!(config.station.units, Units::English);
        assert_eq!(config.chart.steps_per_segment, 40);
        assert_eq!(config.chart.days, 3);
        assert_eq!(config.refresh.interval_minutes, 60);
    }

    #[test]
    fn test_config_roundtrip() {
        let temp = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.station.units = Units::Metric;
        config.save(temp.path()).unwrap();

        let loaded = Config::load_from_path(temp.path());
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"[station]\nid = \"9445719\"\nname = \"Seattle\"\n\n[chart]\nsteps_per_segment = 20\n")
            .unwrap();

        let config = Config::load_from_path(temp.path());
        assert_eq!(config.station.id, "9445719");
        assert_eq!(config.station.datum, "MLLW");
        assert_eq!(config.chart.steps_per_segment, 20);
        assert_eq!(config.chart.width, 800);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"[station\nid = ").unwrap();
        assert_eq!(Config::load_from_path(temp.path()), Config::default());
    }

    #[test]
    fn test_out_of_range_chart_values_are_clamped() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"[chart]\ndays = 100000000\nsteps_per_segment = 0\n").unwrap();

        let config = Config::load_from_path(temp.path());
        assert_eq!(config.chart.days, MAX_DAYS);
        assert_eq!(config.chart.steps_per_segment, 1);
        assert_eq!(config.station.id, "9445478");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        assert_eq!(config.station.id, "9445478");
    }

    #[test]
    fn test_blank_overrides_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(Some("  ".to_string()), Some("Hoodsport".to_string()));
        assert_eq!(config.station.id, "9445478");
        assert_eq!(config.station.name, "Hoodsport");
    }

    #[test]
    fn test_chart_bounds() {
        let bounds = Config::default().chart.bounds();
        assert_eq!(bounds.inner_width(), 750.0);
        assert_eq!(bounds.inner_height(), 140.0);
    }
}
