//! # Hood Canal Tides Entry Point
//!
//! Fetches tide predictions (or synthetic stand-ins), runs the curve engine and renders
//! the chart as ASCII on stdout or as an SVG file for the dashboard.

use anyhow::Context;
use chrono::{Local, Utc};
use clap::Parser;
use hood_canal_tides::config::{self, Config};
use hood_canal_tides::curve::MAX_STEPS_PER_SEGMENT;
use hood_canal_tides::fallback::SyntheticSource;
use hood_canal_tides::lunar::lunar_info;
use hood_canal_tides::renderer::{self, format_height, TideChart};
use hood_canal_tides::tide_data::{fetch_or_fallback, NoaaSource, TideSource};
use hood_canal_tides::window::{until_next_midnight, DisplayWindow};
use hood_canal_tides::TideSeries;
use log::{error, info};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Tide charts for the Hood Canal information hub")]
struct Args {
    /// Configuration file
    #[arg(long, default_value = config::DEFAULT_PATH)]
    config: PathBuf,
    /// Skip NOAA and chart synthetic tides
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Write the chart as SVG to this path instead of printing ASCII
    #[arg(long)]
    svg: Option<PathBuf>,
    /// Override the interpolated points per tide segment
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=MAX_STEPS_PER_SEGMENT as i64))]
    steps: Option<u16>,
    /// Seed for synthetic tides (reproducible mock data)
    #[arg(long)]
    seed: Option<u64>,
    /// Print the tide events as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Keep running, refreshing every configured interval and at local midnight
    #[arg(long, default_value_t = false)]
    watch: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = Config::load_from_path(&args.config).with_env_overrides();
    if let Some(steps) = args.steps {
        config.chart.steps_per_segment = usize::from(steps);
    }

    let mut synthetic = SyntheticSource::new(&config.station.id, &config.station.name, Local);
    if let Some(seed) = args.seed {
        synthetic = synthetic.with_seed(seed);
    }
    let noaa = NoaaSource::new(config.station.clone()).context("building NOAA client")?;

    // Create Tokio runtime for the NOAA client and the refresh timer
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(&args, &config, &noaa, &synthetic))
}

/// Fetch → engine → render, once or every refresh interval with `--watch`.
async fn run(
    args: &Args,
    config: &Config,
    noaa: &NoaaSource,
    synthetic: &SyntheticSource<Local>,
) -> anyhow::Result<()> {
    let interval = Duration::from_secs(config.refresh.interval_minutes.max(1) * 60);
    loop {
        let window = DisplayWindow::starting_today(Utc::now(), config.chart.days, &Local);
        let mut series = if args.offline {
            synthetic.fetch(&window).await?
        } else {
            fetch_or_fallback(noaa, synthetic, &window).await
        };
        series.sort_events();

        match render(args, config, &series, &window) {
            Ok(()) => {}
            // A bad cycle must not stop the refresh loop
            Err(e) if args.watch => error!("Rendering tide chart failed: {:#}", e),
            Err(e) => return Err(e),
        }

        if !args.watch {
            return Ok(());
        }
        // Wake at local midnight too, so the window rolls over with the date
        let wait = until_next_midnight(Utc::now(), &Local)
            .to_std()
            .map_or(interval, |midnight| midnight.min(interval));
        info!("Next refresh in {} minutes", wait.as_secs().div_ceil(60));
        tokio::time::sleep(wait).await;
    }
}

fn render(args: &Args, config: &Config, series: &TideSeries, window: &DisplayWindow) -> anyhow::Result<()> {
    let now = Utc::now();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&series.events)?);
    }

    let chart = TideChart::from_config(series, window, config)
        .with_context(|| format!("charting {} tide events", series.events.len()))?;

    if let Some(path) = &args.svg {
        let svg = renderer::render_svg(&chart, series, window, &Local, now, config.station.units);
        fs::write(path, svg).with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote tide chart to {}", path.display());
        return Ok(());
    }

    println!("{} ({})", series.station_name, series.station_id);
    renderer::draw_ascii(&chart, series, window, &Local, now);
    println!();

    if let Some(next) = series.next_event(now) {
        println!(
            "Next {} tide: {} at {}",
            next.kind,
            format_height(next.height, config.station.units),
            next.timestamp.with_timezone(&Local).format("%a %-I:%M %p")
        );
    }
    for (day, events) in series.events_by_day(&Local) {
        let summary: Vec<String> = events
            .iter()
            .map(|event| {
                format!(
                    "{} {} {}",
                    event.kind,
                    event.timestamp.with_timezone(&Local).format("%-I:%M %p"),
                    format_height(event.height, config.station.units)
                )
            })
            .collect();
        println!("  {}: {}", day.format("%a %b %-d"), summary.join(", "));
    }

    let moon = lunar_info(now);
    println!(
        "Moon: {} ({}% illuminated, {:.1} days), next full {}",
        moon.phase,
        moon.illumination,
        moon.age_days,
        moon.next_full_moon.with_timezone(&Local).format("%a %b %-d")
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("hood-canal-tides").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_steps_within_range() {
        assert_eq!(parse(&["--steps", "40"]).unwrap().steps, Some(40));
        assert_eq!(parse(&["--steps", "1000"]).unwrap().steps, Some(1000));
        assert_eq!(parse(&[]).unwrap().steps, None);
    }

    #[test]
    fn test_steps_out_of_range_rejected() {
        assert!(parse(&["--steps", "0"]).is_err());
        assert!(parse(&["--steps", "1001"]).is_err());
        assert!(parse(&["--steps", "9223372036854775808"]).is_err());
    }
}
