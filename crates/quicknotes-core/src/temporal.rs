//! Calendar-day helpers.
//!
//! Notes are stored with UTC timestamps, but "today" and "created on this
//! day" are local-calendar notions. Every function takes the time zone
//! explicitly; the application passes `chrono::Local`, tests pass fixed
//! offsets.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::models::Note;

// =============================================================================
// DAY BOUNDARIES
// =============================================================================

/// Calendar day of `ts` in `tz`.
pub fn local_day<Tz: TimeZone>(ts: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    ts.with_timezone(tz).date_naive()
}

/// True when `ts` falls on `day` in `tz`.
pub fn is_same_day<Tz: TimeZone>(ts: &DateTime<Utc>, day: NaiveDate, tz: &Tz) -> bool {
    local_day(ts, tz) == day
}

/// UTC instant of local midnight starting `day`.
///
/// Where a DST transition skips midnight, the first valid local instant of
/// the day is used.
pub fn day_start<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// UTC instant of the most recent local midnight before `now`.
pub fn today_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    day_start(now.date_naive(), &now.timezone())
}

// =============================================================================
// MONTH GRID
// =============================================================================

/// One day cell of a month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// At least one note was created on this day.
    pub has_notes: bool,
}

/// A month laid out for a Sunday-first calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    /// Empty cells before the 1st (Sunday = 0).
    pub leading_blanks: u32,
    pub days: Vec<CalendarDay>,
}

impl MonthGrid {
    /// Build the grid for `year`/`month`, marking days with notes.
    ///
    /// Returns `None` for an invalid month.
    pub fn build<Tz: TimeZone>(year: i32, month: u32, notes: &[Note], tz: &Tz) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let (next_year, next_month) = next_month(year, month);
        let next_first = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;

        let note_days: HashSet<NaiveDate> = notes
            .iter()
            .map(|n| local_day(&n.created_at, tz))
            .filter(|d| d.year() == year && d.month() == month)
            .collect();

        let days = first
            .iter_days()
            .take_while(|d| *d < next_first)
            .map(|date| CalendarDay {
                date,
                has_notes: note_days.contains(&date),
            })
            .collect();

        Some(Self {
            year,
            month,
            leading_blanks: first.weekday().num_days_from_sunday(),
            days,
        })
    }

    /// Heading such as `March 2026`.
    pub fn title(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_default()
    }

    pub fn previous(&self) -> (i32, u32) {
        previous_month(self.year, self.month)
    }

    pub fn next(&self) -> (i32, u32) {
        next_month(self.year, self.month)
    }
}

/// Month after `year`/`month`, wrapping into the next year.
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// Month before `year`/`month`, wrapping into the previous year.
pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}
