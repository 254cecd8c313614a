//! Admission limits on note creation and open tabs.
//!
//! The checks are pure functions of counters the session maintains. Limits
//! come from [`quicknotes_core::defaults`] and are not configurable.

use chrono::NaiveDate;

use quicknotes_core::defaults::{DAILY_NOTE_LIMIT, MAX_OPEN_TABS};
use quicknotes_core::AdmissionDenied;

/// True iff another note may be created today.
pub fn can_create_note(daily_count: u32) -> bool {
    daily_count < DAILY_NOTE_LIMIT
}

/// True iff another tab may be opened.
pub fn can_open_tab(open_count: usize) -> bool {
    open_count < MAX_OPEN_TABS
}

pub fn check_create(daily_count: u32) -> Result<(), AdmissionDenied> {
    if can_create_note(daily_count) {
        Ok(())
    } else {
        Err(AdmissionDenied::DailyLimitExceeded {
            limit: DAILY_NOTE_LIMIT,
        })
    }
}

pub fn check_open(open_count: usize) -> Result<(), AdmissionDenied> {
    if can_open_tab(open_count) {
        Ok(())
    } else {
        Err(AdmissionDenied::TabLimitExceeded {
            limit: MAX_OPEN_TABS,
        })
    }
}

/// Notes created on one local calendar day.
///
/// Loaded from the backend and bumped locally on every creation. Reading it
/// on a later day yields zero, so the limit lifts at local midnight even
/// without a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCounter {
    count: u32,
    day: NaiveDate,
}

impl DailyCounter {
    pub fn new(count: u32, day: NaiveDate) -> Self {
        Self { count, day }
    }

    /// Count as seen on `today`.
    pub fn count_on(&self, today: NaiveDate) -> u32 {
        if today == self.day {
            self.count
        } else {
            0
        }
    }

    /// Creations still allowed on `today`.
    pub fn remaining_on(&self, today: NaiveDate) -> u32 {
        DAILY_NOTE_LIMIT.saturating_sub(self.count_on(today))
    }

    /// Record one creation on `today`.
    pub fn increment(&mut self, today: NaiveDate) {
        if today != self.day {
            self.day = today;
            self.count = 0;
        }
        self.count = self.count.saturating_add(1);
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }
}
