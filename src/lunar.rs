//! Moon phase for the hub's lunar panel.
//!
//! Low precision on purpose: the moon's age is the time since a known new moon
//! (2000-01-06 18:14 UTC) modulo a 29.53-day synodic month. Good to about a day,
//! which is plenty for "is it a spring tide this week".

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;
use std::fmt;

/// Mean synodic month in days, as the panel rounds it.
pub const LUNAR_CYCLE_DAYS: f64 = 29.53;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Age at which the moon is treated as full.
const FULL_MOON_AGE: f64 = 15.77;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MoonPhase {
    New,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    Full,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MoonPhase::New => "New Moon",
            MoonPhase::WaxingCrescent => "Waxing Crescent",
            MoonPhase::FirstQuarter => "First Quarter",
            MoonPhase::WaxingGibbous => "Waxing Gibbous",
            MoonPhase::Full => "Full Moon",
            MoonPhase::WaningGibbous => "Waning Gibbous",
            MoonPhase::LastQuarter => "Last Quarter",
            MoonPhase::WaningCrescent => "Waning Crescent",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LunarInfo {
    pub phase: MoonPhase,
    /// Illuminated percentage, 0-100
    pub illumination: u8,
    /// Days since new moon, to one decimal
    pub age_days: f64,
    pub next_full_moon: DateTime<Utc>,
    pub next_new_moon: DateTime<Utc>,
}

fn reference_new_moon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 6, 18, 14, 0)
        .single()
        .unwrap_or_default()
}

/// Days since the most recent new moon, in `[0, LUNAR_CYCLE_DAYS)`.
pub fn moon_age(now: DateTime<Utc>) -> f64 {
    let days = (now - reference_new_moon()).num_milliseconds() as f64 / MS_PER_DAY;
    days.rem_euclid(LUNAR_CYCLE_DAYS)
}

/// Phase name and illuminated percentage for a moon age.
pub fn classify(age: f64) -> (MoonPhase, f64) {
    if age < 1.0 {
        (MoonPhase::New, age * 50.0)
    } else if age < 7.38 {
        (MoonPhase::WaxingCrescent, 50.0 * (1.0 + (age - 1.0) / 6.38))
    } else if age < 8.38 {
        (MoonPhase::FirstQuarter, 50.0)
    } else if age < 14.77 {
        (MoonPhase::WaxingGibbous, 50.0 + 50.0 * ((age - 8.38) / 6.39))
    } else if age < FULL_MOON_AGE {
        (MoonPhase::Full, 100.0)
    } else if age < 22.15 {
        (MoonPhase::WaningGibbous, 100.0 - 50.0 * ((age - FULL_MOON_AGE) / 6.38))
    } else if age < 23.15 {
        (MoonPhase::LastQuarter, 50.0)
    } else {
        (MoonPhase::WaningCrescent, 50.0 * (1.0 - (age - 23.15) / 6.38))
    }
}

pub fn lunar_info(now: DateTime<Utc>) -> LunarInfo {
    let age = moon_age(now);
    let (phase, illumination) = classify(age);

    let to_full = (FULL_MOON_AGE - age + LUNAR_CYCLE_DAYS) % LUNAR_CYCLE_DAYS;
    let to_new = (LUNAR_CYCLE_DAYS - age) % LUNAR_CYCLE_DAYS;

    LunarInfo {
        phase,
        illumination: illumination.round().clamp(0.0, 100.0) as u8,
        age_days: (age * 10.0).round() / 10.0,
        next_full_moon: now + days(to_full),
        next_new_moon: now + days(to_new),
    }
}

fn days(value: f64) -> Duration {
    Duration::milliseconds((value * MS_PER_DAY).round() as i64)
}
