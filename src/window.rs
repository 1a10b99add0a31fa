//! Display windows for the tide chart.
//!
//! The chart shows whole local days ("today through the day after tomorrow"), chosen
//! independently of where the tide events happen to fall.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};

/// Longest window the chart will show. Larger day counts are clamped.
pub const MAX_DAYS: u32 = 366;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DisplayWindow {
    /// Window from local midnight of `first_day` through 23:59:59.999 of the
    /// `days`-th day, with `days` clamped to `1..=MAX_DAYS`.
    ///
    /// Windows running past the last representable date stop at that date.
    pub fn days<Tz: TimeZone>(first_day: NaiveDate, days: u32, tz: &Tz) -> Self {
        let span = Duration::days(i64::from(days.clamp(1, MAX_DAYS)) - 1);
        let last_day = first_day.checked_add_signed(span).unwrap_or(NaiveDate::MAX);
        let start = local_midnight(first_day, tz);
        let end = match last_day.succ_opt() {
            Some(next) => local_midnight(next, tz) - Duration::milliseconds(1),
            None => last_day
                .and_hms_milli_opt(23, 59, 59, 999)
                .map_or(start, |naive| naive.and_utc()),
        };
        Self { start, end }
    }

    /// Window starting at the local day containing `now`.
    pub fn starting_today<Tz: TimeZone>(now: DateTime<Utc>, days: u32, tz: &Tz) -> Self {
        Self::days(now.with_timezone(tz).date_naive(), days, tz)
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time <= self.end
    }

    /// Calendar days covered, in the display time zone.
    pub fn dates<Tz: TimeZone>(&self, tz: &Tz) -> Vec<NaiveDate> {
        let first = self.start.with_timezone(tz).date_naive();
        let last = self.end.with_timezone(tz).date_naive();
        first.iter_days().take_while(|day| *day <= last).collect()
    }

    /// Tick instants every `step_hours` local hours from each local midnight.
    pub fn ticks<Tz: TimeZone>(&self, step_hours: u32, tz: &Tz) -> Vec<DateTime<Utc>> {
        let step = step_hours.clamp(1, 24);
        self.dates(tz)
            .into_iter()
            .flat_map(|day| {
                (0..24).step_by(step as usize).filter_map(move |hour| {
                    NaiveTime::from_hms_opt(hour, 0, 0).map(|time| day.and_time(time))
                })
            })
            .filter_map(|naive| earliest(tz.from_local_datetime(&naive)))
            .filter(|tick| self.contains(*tick))
            .collect()
    }

    /// Local midnights strictly after the window start (day separators).
    pub fn day_starts<Tz: TimeZone>(&self, tz: &Tz) -> Vec<DateTime<Utc>> {
        self.dates(tz)
            .into_iter()
            .skip(1)
            .map(|day| local_midnight(day, tz))
            .collect()
    }
}

/// Time from `now` until the next local midnight, when the displayed days change.
pub fn until_next_midnight<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> Duration {
    let today = now.with_timezone(tz).date_naive();
    match today.succ_opt() {
        Some(tomorrow) => local_midnight(tomorrow, tz) - now,
        None => Duration::days(1),
    }
}

fn local_midnight<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let naive = day.and_time(NaiveTime::MIN);
    // Zones that skip midnight for DST land on the first valid instant after it
    earliest(tz.from_local_datetime(&naive))
        .or_else(|| earliest(tz.from_local_datetime(&(naive + Duration::hours(1)))))
        .unwrap_or_else(|| naive.and_utc())
}

fn earliest<Tz: TimeZone>(result: LocalResult<DateTime<Tz>>) -> Option<DateTime<Utc>> {
    result.earliest().map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 24).unwrap()
    }

    #[test]
    fn test_three_day_window_bounds() {
        let window = DisplayWindow::days(day(), 3, &Utc);
        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 7, 24, 0, 0, 0).unwrap());
        assert_eq!(
            window.end,
            Utc.with_ymd_and_hms(2025, 7, 27, 0, 0, 0).unwrap() - Duration::milliseconds(1)
        );
    }

    #[test]
    fn test_six_hour_ticks() {
        let window = DisplayWindow::days(day(), 3, &Utc);
        let ticks = window.ticks(6, &Utc);
        assert_eq!(ticks.len(), 12);
        assert_eq!(ticks[1], Utc.with_ymd_and_hms(2025, 7, 24, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_day_starts_skip_first_day() {
        let window = DisplayWindow::days(day(), 3, &Utc);
        let starts = window.day_starts(&Utc);
        assert_eq!(starts.len(), 2);
        assert_eq!(starts[0], Utc.with_ymd_and_hms(2025, 7, 25, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_oversized_day_count_is_clamped() {
        let window = DisplayWindow::days(day(), u32::MAX, &Utc);
        assert_eq!(window.dates(&Utc).len(), MAX_DAYS as usize);
        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 7, 24, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_window_stops_at_last_date() {
        let window = DisplayWindow::days(NaiveDate::MAX, 3, &Utc);
        assert!(window.start < window.end);
        assert_eq!(window.start.date_naive(), NaiveDate::MAX);
        assert_eq!(window.end.date_naive(), NaiveDate::MAX);
    }

    #[test]
    fn test_until_next_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 7, 24, 22, 30, 0).unwrap();
        assert_eq!(until_next_midnight(now, &Utc), Duration::minutes(90));

        let midnight = Utc.with_ymd_and_hms(2025, 7, 25, 0, 0, 0).unwrap();
        assert_eq!(until_next_midnight(midnight, &Utc), Duration::hours(24));

        // 22:30 UTC is 15:30 at UTC-7
        let pdt = FixedOffset::west_opt(7 * 3600).unwrap();
        assert_eq!(until_next_midnight(now, &pdt), Duration::hours(8) + Duration::minutes(30));
    }

    #[test]
    fn test_zero_days_is_one_day() {
        let window = DisplayWindow::days(day(), 0, &Utc);
        assert_eq!(window.dates(&Utc), vec![day()]);
    }
}
